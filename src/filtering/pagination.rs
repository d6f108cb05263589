//! Pagination negotiation.
//!
//! A pure, total function per request: it never fails and always yields a
//! usable strategy. The requested strategy arrives in the `x-pagination`
//! header; endpoints declare an ordered allow-list whose first entry is the
//! fallback for anything invalid or unlisted.

use axum::http::header::HeaderMap;

/// Request header carrying the pagination strategy token.
pub const PAGINATION_HEADER: &str = "x-pagination";

pub const DEFAULT_PAGE_SIZE: u64 = 15;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationKind {
    /// Offset pagination without a total count.
    Simple,
    /// Offset pagination with a full total count.
    Table,
    /// Opaque position token.
    Cursor,
}

impl PaginationKind {
    /// Lower-case-normalized token mapping; anything unrecognized is simple.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "table" => Self::Table,
            "cursor" => Self::Cursor,
            _ => Self::Simple,
        }
    }
}

/// Resolved pagination: strategy plus clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub kind: PaginationKind,
    pub per_page: u64,
}

/// Clamp a requested page size to `1..=100`, defaulting to 15.
#[must_use]
pub fn clamp_page_size(requested: Option<u64>) -> u64 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Negotiate a strategy from the raw header token and the endpoint's
/// allow-list. Total: any token (including absent or malformed) and any
/// allow-list (including empty) resolve to exactly one strategy.
#[must_use]
pub fn negotiate(
    token: Option<&str>,
    per_page: Option<u64>,
    allowed: &[PaginationKind],
) -> Pagination {
    let requested = token.map_or(PaginationKind::Simple, PaginationKind::from_token);
    let kind = if allowed.contains(&requested) {
        requested
    } else {
        allowed.first().copied().unwrap_or(PaginationKind::Simple)
    };
    Pagination {
        kind,
        per_page: clamp_page_size(per_page),
    }
}

/// [`negotiate`] reading the strategy token from request headers.
#[must_use]
pub fn negotiate_from_headers(
    headers: &HeaderMap,
    per_page: Option<u64>,
    allowed: &[PaginationKind],
) -> Pagination {
    let token = headers
        .get(PAGINATION_HEADER)
        .and_then(|value| value.to_str().ok());
    negotiate(token, per_page, allowed)
}

/// Strip control characters so resource names cannot inject headers.
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build the `Content-Range` response header for offset strategies.
#[must_use]
pub fn content_range(offset: u64, limit: u64, total_count: u64, resource_name: &str) -> HeaderMap {
    let max_offset_limit = (offset + limit).saturating_sub(1).min(total_count);
    let safe_name = sanitize_resource_name(resource_name);
    let content_range = format!("{safe_name} {offset}-{max_offset_limit}/{total_count}");

    let mut headers = HeaderMap::new();
    if let Ok(value) = content_range.parse() {
        headers.insert("Content-Range", value);
    } else {
        headers.insert(
            "Content-Range",
            format!("items {offset}-{max_offset_limit}/{total_count}")
                .parse()
                .unwrap_or_else(|_| "items 0-0/0".parse().unwrap()),
        );
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PaginationKind; 3] = [
        PaginationKind::Simple,
        PaginationKind::Table,
        PaginationKind::Cursor,
    ];

    #[test]
    fn token_mapping_is_case_insensitive() {
        assert_eq!(PaginationKind::from_token("TABLE"), PaginationKind::Table);
        assert_eq!(PaginationKind::from_token("Cursor"), PaginationKind::Cursor);
        assert_eq!(PaginationKind::from_token("simple"), PaginationKind::Simple);
        assert_eq!(PaginationKind::from_token("???"), PaginationKind::Simple);
    }

    #[test]
    fn absent_header_defaults_to_simple() {
        let resolved = negotiate(None, None, &ALL);
        assert_eq!(resolved.kind, PaginationKind::Simple);
        assert_eq!(resolved.per_page, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn unlisted_strategy_falls_back_to_allow_list_head() {
        let allowed = [PaginationKind::Simple, PaginationKind::Table];
        let resolved = negotiate(Some("cursor"), None, &allowed);
        assert_eq!(resolved.kind, PaginationKind::Simple);
    }

    #[test]
    fn listed_strategy_is_honored() {
        let allowed = [PaginationKind::Simple, PaginationKind::Table];
        let resolved = negotiate(Some("table"), None, &allowed);
        assert_eq!(resolved.kind, PaginationKind::Table);
    }

    #[test]
    fn empty_allow_list_degrades_to_simple() {
        let resolved = negotiate(Some("cursor"), None, &[]);
        assert_eq!(resolved.kind, PaginationKind::Simple);
    }

    #[test]
    fn negotiation_is_total_over_junk() {
        for token in [None, Some(""), Some("CURSOR"), Some("\u{fffd}"), Some("42")] {
            for allowed in [&ALL[..], &ALL[..1], &[]] {
                let resolved = negotiate(token, Some(7), allowed);
                assert!(ALL.contains(&resolved.kind));
                assert_eq!(resolved.per_page, 7);
            }
        }
    }

    #[test]
    fn page_size_clamping() {
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(1)), 1);
        assert_eq!(clamp_page_size(Some(100)), 100);
        assert_eq!(clamp_page_size(Some(101)), 100);
        assert_eq!(clamp_page_size(Some(100_000)), 100);
        assert_eq!(clamp_page_size(None), 15);
    }

    #[test]
    fn header_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(PAGINATION_HEADER, "Table".parse().unwrap());
        let resolved = negotiate_from_headers(&headers, None, &ALL);
        assert_eq!(resolved.kind, PaginationKind::Table);
    }

    #[test]
    fn content_range_normal() {
        let headers = content_range(0, 10, 100, "invoices");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "invoices 0-9/100");
    }

    #[test]
    fn content_range_sanitizes_resource_names() {
        let headers = content_range(0, 10, 100, "invoices\r\nX-Evil: 1");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert!(!value.contains('\r') && !value.contains('\n'));
    }

    #[test]
    fn content_range_zero_total() {
        let headers = content_range(0, 10, 0, "invoices");
        assert!(headers.get("Content-Range").is_some());
    }
}
