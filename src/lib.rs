//! Declarative query filtering and OpenAPI post-processing for Axum +
//! Sea-ORM services.
//!
//! Two independent halves share this crate:
//!
//! - **Request side** ([`filtering`]): parse a query string like
//!   `?filter[status][in]=active,pending&include=customer&sort=-created_at`
//!   against a per-resource [`FilterRegistry`] and turn it into a Sea-ORM
//!   [`sea_orm::Condition`], an ordered relationship load plan, and a
//!   negotiated pagination window. Every invalid input is collected into one
//!   [`QueryErrors`] value that renders as a 422 response.
//! - **Generation side** ([`openapi`]): post-process a scanned OpenAPI
//!   document with ordered, idempotent passes (enum expansion, operation-id
//!   synthesis, feature-flag and scope notices, validation-response
//!   injection), driven by a TOML config and exposed through the `querydoc`
//!   binary.
//!
//! ```
//! use querydoc::filtering::{Delimiters, FilterRegistry, FilterSpec, QueryParser};
//!
//! let registry = FilterRegistry::new()
//!     .with_spec(FilterSpec::enumeration(
//!         "status",
//!         vec!["active".into(), "pending".into()],
//!     ))
//!     .with_spec(FilterSpec::number("amount"));
//!
//! let parsed = QueryParser::new(Delimiters::DEFAULT)
//!     .parse_query("filter[status][in]=active,pending&filter[amount][greater-than]=100");
//! let condition = registry.compile(&parsed.filters).unwrap();
//! ```

pub mod errors;
pub mod filtering;
pub mod models;
pub mod openapi;

pub use errors::{FilterViolation, GenerateError, QueryErrors, ViolationKind};
pub use filtering::{
    Delimiters, FilterOperator, FilterRegistry, FilterSpec, FilterType, IncludeResolver,
    Pagination, PaginationKind, QueryParser, QueryPlan, build_query,
};
pub use models::{
    IncludeRequest, ListParams, ParsedFilterRequest, ParsedQuery, SortDirection, SortDirective,
};
pub use openapi::{ConfigFile, EnumCases, EnumRegistry, Generator, GeneratorConfig};
