//! Error types for the request-side query layer and the document generator.
//!
//! Request-side problems (unknown filter field, disallowed operator, bad
//! value, unknown include) are client input errors: they are accumulated into
//! a single [`QueryErrors`] value so one malformed request produces one
//! comprehensive 422 response instead of a trickle of single-field failures.
//!
//! Generation-side problems ([`GenerateError`]) occur at build time and abort
//! the generation run; no partial document is emitted.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Default cap on accumulated violations per request.
pub const DEFAULT_MAX_VIOLATIONS: usize = 20;

/// What went wrong with one filter or include request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Filter references a field not declared in the registry.
    UnknownField,
    /// Operator is not permitted for the field's declared type.
    DisallowedOperator,
    /// Value cannot be coerced to the field's declared type.
    InvalidValue,
    /// Requested relation path is not in the allowed set.
    UnknownInclude,
}

/// One structured validation failure, identifying the field and the
/// offending operator/value.
#[derive(Debug, Clone, Serialize)]
pub struct FilterViolation {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub kind: ViolationKind,
    pub message: String,
}

impl FilterViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: None,
            value: None,
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for FilterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulated request validation errors, bounded by a configurable maximum.
///
/// The compiler keeps checking remaining filters after a failure; callers get
/// every problem at once. Once the cap is reached further violations are
/// counted but not stored.
#[derive(Debug, Clone)]
pub struct QueryErrors {
    violations: Vec<FilterViolation>,
    max: usize,
    dropped: usize,
}

impl QueryErrors {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            violations: Vec::new(),
            max: max.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, violation: FilterViolation) {
        if self.violations.len() < self.max {
            self.violations.push(violation);
        } else {
            self.dropped += 1;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[must_use]
    pub fn violations(&self) -> &[FilterViolation] {
        &self.violations
    }

    /// Number of violations discarded after the cap was reached.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Fold additional violations in, respecting this collection's cap.
    pub fn merge(&mut self, other: QueryErrors) {
        for violation in other.violations {
            self.push(violation);
        }
        self.dropped += other.dropped;
    }

    /// Turn the accumulator into a `Result`, yielding `ok` when clean.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn finish<T>(self, ok: T) -> Result<T, Self> {
        if self.is_empty() { Ok(ok) } else { Err(self) }
    }
}

impl Default for QueryErrors {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VIOLATIONS)
    }
}

impl fmt::Display for QueryErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query validation failed with {} error(s):", self.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        if self.dropped > 0 {
            write!(f, "\n  ... and {} more", self.dropped)?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryErrors {}

/// Response body sent to clients. The violations are the client's own input
/// echoed back; nothing internal leaks.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    details: &'a [FilterViolation],
}

impl IntoResponse for QueryErrors {
    fn into_response(self) -> Response {
        tracing::debug!(
            violations = self.len(),
            dropped = self.dropped,
            "rejecting query parameters"
        );
        let body = ErrorBody {
            error: "Query validation failed",
            details: &self.violations,
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(&body)).into_response()
    }
}

/// Errors raised while post-processing a scanned document.
///
/// These surface to the operator at build time, never to API clients, and
/// abort the generation run with no partial output.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// An enum reference in a schema could not be resolved to a known type.
    #[error("unresolvable enum reference `{0}`")]
    UnresolvableEnum(String),
    /// An enum source is neither a known enumeration type nor a literal.
    #[error("invalid enum source: {0}")]
    InvalidEnumSource(String),
    /// The named schema section is missing from configuration.
    #[error("schema `{0}` not found in configuration")]
    SchemaNotFound(String),
    /// A response content template did not render to valid JSON.
    #[error("invalid response template: {0}")]
    Template(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_accumulate_and_cap() {
        let mut errors = QueryErrors::new(2);
        for i in 0..5 {
            errors.push(FilterViolation::new(
                format!("f{i}"),
                ViolationKind::UnknownField,
                "not declared",
            ));
        }
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.dropped(), 3);
    }

    #[test]
    fn merge_respects_the_receiving_cap() {
        let mut errors = QueryErrors::new(2);
        errors.push(FilterViolation::new(
            "status",
            ViolationKind::UnknownField,
            "not declared",
        ));

        let mut other = QueryErrors::new(10);
        for i in 0..3 {
            other.push(FilterViolation::new(
                format!("f{i}"),
                ViolationKind::UnknownInclude,
                "include is not allowed",
            ));
        }

        errors.merge(other);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.dropped(), 2);
        assert_eq!(errors.violations()[1].field, "f0");
    }

    #[test]
    fn finish_is_ok_when_clean() {
        let errors = QueryErrors::default();
        assert!(errors.finish(42).is_ok());
    }

    #[test]
    fn finish_returns_violations() {
        let mut errors = QueryErrors::default();
        errors.push(
            FilterViolation::new("status", ViolationKind::DisallowedOperator, "not allowed")
                .with_operator("greater-than"),
        );
        let err = errors.finish(()).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.violations()[0].operator.as_deref(), Some("greater-than"));
    }

    #[test]
    fn display_lists_each_violation() {
        let mut errors = QueryErrors::default();
        errors.push(FilterViolation::new(
            "total",
            ViolationKind::InvalidValue,
            "expected a number",
        ));
        let text = errors.to_string();
        assert!(text.contains("1 error(s)"));
        assert!(text.contains("total: expected a number"));
    }

    #[test]
    fn generate_error_display() {
        let err = GenerateError::UnresolvableEnum("crate::Missing".into());
        assert_eq!(
            err.to_string(),
            "unresolvable enum reference `crate::Missing`"
        );
    }
}
