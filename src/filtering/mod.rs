//! Declarative query-string filtering for Sea-ORM entities.
//!
//! A request like
//! `?filter[status][in]=active,pending&include=customer&sort=-created_at&per_page=25`
//! moves through three stages:
//!
//! 1. [`parser::QueryParser`] turns the raw query string into structured
//!    requests without consulting any schema.
//! 2. [`registry::FilterRegistry`] compiles filter requests into a Sea-ORM
//!    [`sea_orm::Condition`], rejecting unknown fields, disallowed operators,
//!    and uncoercible values. [`includes::IncludeResolver`] does the same for
//!    relationship load paths.
//! 3. [`plan::build_query`] assembles the pieces, together with the
//!    negotiated [`pagination::Pagination`], into one [`plan::QueryPlan`].
//!
//! Every stage accumulates violations instead of failing fast, so a single
//! round trip reports everything wrong with a request.

pub mod includes;
pub mod operator;
pub mod pagination;
pub mod parser;
pub mod plan;
pub mod registry;

pub use includes::{IncludeResolver, LoadDirective, LoadKind};
pub use operator::{FilterOperator, FilterType};
pub use pagination::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PAGINATION_HEADER, Pagination, PaginationKind,
    clamp_page_size, negotiate, negotiate_from_headers,
};
pub use parser::{Delimiters, QueryParser};
pub use plan::{QueryPlan, build_query, resolve_sort_columns};
pub use registry::{FieldKind, FilterRegistry, FilterSpec, MatchCase};
