//! One-shot assembly of a request's query plan.
//!
//! Runs parser output through the registry, the include resolver, and the
//! pagination negotiator in a single pass, pooling filter and include
//! violations into one [`QueryErrors`] so the client sees every problem at
//! once. The resulting [`QueryPlan`] is attached to a Sea-ORM select by the
//! caller, which also performs the eventual database call.

use axum::http::header::HeaderMap;
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QuerySelect, Select};

use crate::errors::QueryErrors;
use crate::filtering::includes::{IncludeResolver, LoadDirective};
use crate::filtering::pagination::{Pagination, PaginationKind, negotiate_from_headers};
use crate::filtering::registry::FilterRegistry;
use crate::models::{ParsedQuery, SortDirection, SortDirective};

/// Everything needed to execute one filtered, paginated query.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub condition: Condition,
    pub loads: Vec<LoadDirective>,
    pub sorts: Vec<SortDirective>,
    pub pagination: Pagination,
}

impl QueryPlan {
    /// Offset for a 1-based page number under the resolved page size.
    #[must_use]
    pub const fn offset_for(&self, page: u64) -> u64 {
        page.saturating_sub(1).saturating_mul(self.pagination.per_page)
    }

    /// Attach the compiled condition and the page window to a select.
    /// Ordering is applied separately through [`resolve_sort_columns`]
    /// because columns are entity-typed.
    #[must_use]
    pub fn apply_to<E: EntityTrait>(&self, select: Select<E>, page: u64) -> Select<E> {
        select
            .filter(self.condition.clone())
            .offset(self.offset_for(page))
            .limit(self.pagination.per_page)
    }
}

/// Build a [`QueryPlan`] from one parsed request.
///
/// # Errors
///
/// Returns the pooled filter and include violations; pagination negotiation
/// never contributes errors.
pub fn build_query(
    parsed: &ParsedQuery,
    registry: &FilterRegistry,
    resolver: &IncludeResolver,
    headers: &HeaderMap,
    allowed_pagination: &[PaginationKind],
) -> Result<QueryPlan, QueryErrors> {
    let mut errors = registry.error_collector();
    let condition = registry.compile_into(&parsed.filters, &mut errors);
    let loads = resolver.resolve_into(&parsed.includes, &mut errors);
    let pagination = negotiate_from_headers(headers, parsed.per_page, allowed_pagination);
    errors.finish(QueryPlan {
        condition,
        loads,
        sorts: parsed.sorts.clone(),
        pagination,
    })
}

/// Map sort directives onto entity columns, falling back to the default
/// column when no directive names a sortable column.
pub fn resolve_sort_columns<C>(
    sorts: &[SortDirective],
    sortable_columns: &[(&str, C)],
    default_column: C,
) -> Vec<(C, Order)>
where
    C: ColumnTrait + Copy,
{
    let mut resolved: Vec<(C, Order)> = sorts
        .iter()
        .filter_map(|directive| {
            sortable_columns
                .iter()
                .find(|(name, _)| *name == directive.field)
                .map(|(_, column)| (*column, order_of(directive.direction)))
        })
        .collect();
    if resolved.is_empty() {
        resolved.push((default_column, Order::Asc));
    }
    resolved
}

const fn order_of(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Ascending => Order::Asc,
        SortDirection::Descending => Order::Desc,
    }
}
