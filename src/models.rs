//! Request-side value types produced by the query parameter parser and
//! consumed by the predicate compiler, include resolver, and negotiator.
//!
//! Everything here is built fresh per HTTP request and discarded once the
//! query plan is assembled.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// One decoded filter request: field name, optional raw operator token, and
/// the ordered values carried by the parameter.
///
/// The operator token is kept as the raw string the client sent; the
/// compiler resolves it against [`crate::FilterOperator`] so unknown tokens
/// can be echoed back in validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilterRequest {
    pub field: String,
    pub operator: Option<String>,
    pub values: Vec<String>,
}

impl ParsedFilterRequest {
    /// First value, or the empty string when none were supplied.
    #[must_use]
    pub fn first_value(&self) -> &str {
        self.values.first().map_or("", String::as_str)
    }
}

/// A dotted relation path requested by the client, e.g. `customer.invoices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRequest {
    pub path: String,
}

impl IncludeRequest {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Sort direction parsed from the leading `-` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One sort directive: `sort=-created_at` yields a descending directive on
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDirective {
    pub field: String,
    pub direction: SortDirection,
}

/// Everything the parser extracted from one request's query string.
#[derive(Debug, Clone, Default)]
pub struct ParsedQuery {
    pub filters: Vec<ParsedFilterRequest>,
    pub includes: Vec<IncludeRequest>,
    pub sorts: Vec<SortDirective>,
    /// Raw `per_page` parameter; clamping happens during negotiation.
    pub per_page: Option<u64>,
}

/// Typed query parameters for handlers that want Axum to extract the
/// well-known keys. Dynamic `filter[field][op]` keys are not expressible as
/// struct fields; pull those from the raw query string with
/// [`crate::QueryParser::parse_query`].
///
/// # Example
///
/// `GET /invoices?include=customer.invoices&sort=-created_at&per_page=25`
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Comma-separated relation paths to eager-load, with dotted nesting.
    ///
    /// Example: `customer,customer.invoices`
    #[param(example = "customer,customer.invoices")]
    pub include: Option<String>,
    /// Comma-separated sort fields; prefix with `-` for descending.
    ///
    /// Example: `-created_at,reference`
    #[param(example = "-created_at")]
    pub sort: Option<String>,
    /// Requested page size; clamped to at most 100, default 15.
    #[param(example = 25)]
    pub per_page: Option<u64>,
}
