//! Filter operator and filter type vocabulary.
//!
//! Pure vocabulary shared by the parser, the registry, and the generated
//! documentation: no query logic lives here.

use serde::{Deserialize, Serialize};

/// Comparison operators accepted on the wire as `filter[field][<token>]=...`.
///
/// The wire token for each variant is its kebab-case name (`not-equals`,
/// `greater-or-equal`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub const ALL: [Self; 14] = [
        Self::Equals,
        Self::NotEquals,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::LessThan,
        Self::LessOrEqual,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// Parse a wire token. Matching is exact; the parser keeps unknown
    /// tokens as raw strings so the compiler can report them.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.token() == token)
    }

    /// Wire-format token, also used in validation error payloads.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not-equals",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Contains => "contains",
            Self::NotContains => "not-contains",
            Self::StartsWith => "starts-with",
            Self::EndsWith => "ends-with",
            Self::GreaterThan => "greater-than",
            Self::GreaterOrEqual => "greater-or-equal",
            Self::LessThan => "less-than",
            Self::LessOrEqual => "less-or-equal",
            Self::IsNull => "is-null",
            Self::IsNotNull => "is-not-null",
        }
    }

    /// Operators that consume a list of values rather than a scalar.
    #[must_use]
    pub const fn takes_many(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Nullness checks ignore any supplied value.
    #[must_use]
    pub const fn ignores_value(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// How a bare (operator-less) filter value is compiled to a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    /// Equality; multiple values compile to set membership.
    #[default]
    Exact,
    /// Substring match.
    Partial,
    /// Prefix match.
    BeginsWith,
    /// Suffix match.
    EndsWith,
    /// Full operator mode; bare values fall back to equality.
    Operator,
}

impl FilterType {
    /// Operator implied when the request carries no explicit operator.
    #[must_use]
    pub const fn implied_operator(self) -> FilterOperator {
        match self {
            Self::Exact | Self::Operator => FilterOperator::Equals,
            Self::Partial => FilterOperator::Contains,
            Self::BeginsWith => FilterOperator::StartsWith,
            Self::EndsWith => FilterOperator::EndsWith,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        for op in FilterOperator::ALL {
            assert_eq!(FilterOperator::from_token(op.token()), Some(op));
        }
    }

    #[test]
    fn unknown_token_is_none() {
        assert_eq!(FilterOperator::from_token("resembles"), None);
        assert_eq!(FilterOperator::from_token("EQUALS"), None);
    }

    #[test]
    fn implied_operators() {
        assert_eq!(FilterType::Exact.implied_operator(), FilterOperator::Equals);
        assert_eq!(
            FilterType::Partial.implied_operator(),
            FilterOperator::Contains
        );
        assert_eq!(
            FilterType::BeginsWith.implied_operator(),
            FilterOperator::StartsWith
        );
        assert_eq!(
            FilterType::EndsWith.implied_operator(),
            FilterOperator::EndsWith
        );
        assert_eq!(
            FilterType::Operator.implied_operator(),
            FilterOperator::Equals
        );
    }

    #[test]
    fn list_and_null_classification() {
        assert!(FilterOperator::In.takes_many());
        assert!(FilterOperator::NotIn.takes_many());
        assert!(!FilterOperator::Contains.takes_many());
        assert!(FilterOperator::IsNull.ignores_value());
        assert!(FilterOperator::IsNotNull.ignores_value());
        assert!(!FilterOperator::Equals.ignores_value());
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&FilterOperator::GreaterOrEqual).unwrap();
        assert_eq!(json, "\"greater-or-equal\"");
    }
}
