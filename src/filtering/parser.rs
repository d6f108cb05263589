//! Query parameter parsing.
//!
//! Decodes raw query-string pairs into [`ParsedQuery`] using a configurable
//! [`Delimiters`] value. Parsing is purely syntactic: unknown fields and
//! operators are kept verbatim and rejected later by the predicate compiler,
//! so a parse never fails.
//!
//! Grammar:
//!
//! ```text
//! filter[<field>]=<value>               implied operator from the field's FilterType
//! filter[<field>][<operator>]=<value>   explicit operator token
//! include=<path>[,<path>...]            dotted nesting inside each path
//! sort=<field>,-<other>                 leading '-' sorts descending
//! per_page=<n>
//! ```

use std::sync::RwLock;

use crate::models::{
    IncludeRequest, ParsedFilterRequest, ParsedQuery, SortDirection, SortDirective,
};

/// Delimiter configuration for the query grammar.
///
/// Threaded explicitly through [`QueryParser::new`]; a process-wide default
/// exists for startup wiring and can be reset between test runs. Mutating the
/// process default is not safe while other threads are parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Separates nesting levels inside include paths and filter field names.
    pub nesting: char,
    /// Separates list entries inside a single parameter value.
    pub list: char,
}

impl Delimiters {
    pub const DEFAULT: Self = Self {
        nesting: '.',
        list: ',',
    };

    /// Current process-wide default.
    #[must_use]
    pub fn process_default() -> Self {
        *PROCESS_DEFAULT
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Replace the process-wide default. Intended for one-time startup
    /// configuration.
    pub fn set_process_default(delimiters: Self) {
        *PROCESS_DEFAULT
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = delimiters;
    }

    /// Restore the built-in default. Test isolation only.
    pub fn reset_process_default() {
        Self::set_process_default(Self::DEFAULT);
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static PROCESS_DEFAULT: RwLock<Delimiters> = RwLock::new(Delimiters::DEFAULT);

/// Decodes filter/include/sort/`per_page` parameters into a [`ParsedQuery`].
#[derive(Debug, Clone, Copy)]
pub struct QueryParser {
    delimiters: Delimiters,
}

impl QueryParser {
    #[must_use]
    pub const fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    #[must_use]
    pub const fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// Parse a raw (still percent-encoded) query string.
    #[must_use]
    pub fn parse_query(&self, query: &str) -> ParsedQuery {
        self.parse_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Parse already-decoded key/value pairs.
    pub fn parse_pairs<I, K, V>(&self, pairs: I) -> ParsedQuery
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = ParsedQuery::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if let Some(inner) = key.strip_prefix("filter[").and_then(|k| k.strip_suffix(']')) {
                self.push_filter(&mut parsed, inner, value);
            } else {
                match key {
                    "include" => {
                        for path in self.split_list(value) {
                            parsed.includes.push(IncludeRequest::new(path));
                        }
                    }
                    "sort" => {
                        for token in self.split_list(value) {
                            parsed.sorts.push(parse_sort_token(&token));
                        }
                    }
                    "per_page" => match value.parse::<u64>() {
                        Ok(size) => parsed.per_page = Some(size),
                        Err(_) => {
                            tracing::debug!(value, "ignoring non-numeric per_page");
                        }
                    },
                    _ => {}
                }
            }
        }
        parsed
    }

    fn push_filter(&self, parsed: &mut ParsedQuery, inner: &str, value: &str) {
        // inner is "<field>" or "<field>][<operator>"
        let mut parts = inner.splitn(2, "][");
        let Some(field) = parts.next().filter(|field| !field.is_empty()) else {
            tracing::debug!(key = inner, "ignoring malformed filter key");
            return;
        };
        let operator = parts.next();
        if field.contains('[')
            || field.contains(']')
            || operator.is_some_and(|op| op.contains('[') || op.contains(']'))
        {
            tracing::debug!(key = inner, "ignoring malformed filter key");
            return;
        }
        parsed.filters.push(ParsedFilterRequest {
            field: field.to_string(),
            operator: operator.map(ToString::to_string),
            values: self.split_list(value).collect(),
        });
    }

    fn split_list<'a>(&self, value: &'a str) -> impl Iterator<Item = String> + 'a {
        let list = self.delimiters.list;
        value
            .split(list)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToString::to_string)
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(Delimiters::process_default())
    }
}

fn parse_sort_token(token: &str) -> SortDirective {
    token.strip_prefix('-').map_or_else(
        || SortDirective {
            field: token.to_string(),
            direction: SortDirection::Ascending,
        },
        |field| SortDirective {
            field: field.to_string(),
            direction: SortDirection::Descending,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> QueryParser {
        QueryParser::new(Delimiters::DEFAULT)
    }

    #[test]
    fn parses_bare_filter() {
        let parsed = parser().parse_pairs([("filter[status]", "active")]);
        assert_eq!(parsed.filters.len(), 1);
        let filter = &parsed.filters[0];
        assert_eq!(filter.field, "status");
        assert_eq!(filter.operator, None);
        assert_eq!(filter.values, vec!["active"]);
    }

    #[test]
    fn parses_operator_filter_with_list_value() {
        let parsed = parser().parse_pairs([("filter[status][in]", "active,pending")]);
        let filter = &parsed.filters[0];
        assert_eq!(filter.operator.as_deref(), Some("in"));
        assert_eq!(filter.values, vec!["active", "pending"]);
    }

    #[test]
    fn keeps_unknown_operator_tokens_verbatim() {
        let parsed = parser().parse_pairs([("filter[total][resembles]", "9")]);
        assert_eq!(parsed.filters[0].operator.as_deref(), Some("resembles"));
    }

    #[test]
    fn parses_includes_and_sorts() {
        let parsed = parser().parse_pairs([
            ("include", "customer,customer.invoices"),
            ("sort", "-created_at,reference"),
        ]);
        assert_eq!(
            parsed.includes,
            vec![
                IncludeRequest::new("customer"),
                IncludeRequest::new("customer.invoices"),
            ]
        );
        assert_eq!(parsed.sorts.len(), 2);
        assert_eq!(parsed.sorts[0].field, "created_at");
        assert_eq!(parsed.sorts[0].direction, SortDirection::Descending);
        assert_eq!(parsed.sorts[1].field, "reference");
        assert_eq!(parsed.sorts[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn parses_per_page_and_ignores_garbage() {
        let parsed = parser().parse_pairs([("per_page", "25")]);
        assert_eq!(parsed.per_page, Some(25));
        let parsed = parser().parse_pairs([("per_page", "lots")]);
        assert_eq!(parsed.per_page, None);
    }

    #[test]
    fn parses_percent_encoded_query_string() {
        let parsed =
            parser().parse_query("filter%5Bstatus%5D%5Bin%5D=active%2Cpending&per_page=5");
        assert_eq!(parsed.filters[0].field, "status");
        assert_eq!(parsed.filters[0].values, vec!["active", "pending"]);
        assert_eq!(parsed.per_page, Some(5));
    }

    #[test]
    fn malformed_filter_keys_are_skipped() {
        let parsed = parser().parse_pairs([("filter[]", "x"), ("filter[a][b][c]", "y")]);
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn custom_list_delimiter() {
        let custom = QueryParser::new(Delimiters {
            nesting: '.',
            list: '|',
        });
        let parsed = custom.parse_pairs([("filter[status][in]", "active|pending")]);
        assert_eq!(parsed.filters[0].values, vec!["active", "pending"]);
    }

    #[test]
    fn process_default_can_be_set_and_reset() {
        Delimiters::set_process_default(Delimiters {
            nesting: '/',
            list: ';',
        });
        assert_eq!(Delimiters::process_default().list, ';');
        Delimiters::reset_process_default();
        assert_eq!(Delimiters::process_default(), Delimiters::DEFAULT);
    }
}
