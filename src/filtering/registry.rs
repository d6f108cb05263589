//! Filter registry and predicate compiler.
//!
//! A [`FilterRegistry`] holds the [`FilterSpec`]s declared for one
//! endpoint/resource and compiles each [`ParsedFilterRequest`] into a
//! `sea_query` predicate attached to a [`Condition`]. Compilation checks
//! every filter and accumulates all violations before failing, so a
//! malformed request yields one comprehensive error response.

use sea_orm::{
    Condition, Value,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use uuid::Uuid;

use crate::errors::{DEFAULT_MAX_VIOLATIONS, FilterViolation, QueryErrors, ViolationKind};
use crate::filtering::operator::{FilterOperator, FilterType};
use crate::models::ParsedFilterRequest;
use crate::openapi::enums::EnumCases;

// Guard against absurd inputs before they reach the database driver.
const MAX_VALUE_LENGTH: usize = 10_000;

/// Underlying data type of a filterable field, driving value coercion and
/// the default operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    DateTime,
    Boolean,
    Uuid,
    Enum,
}

/// Case handling for substring/prefix/suffix predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchCase {
    #[default]
    Sensitive,
    /// Wraps both sides in UPPER(), matching regardless of case.
    Insensitive,
}

/// Declares one filterable field: name, underlying type, allowed operator
/// set, and compilation strategy. Constructed once per resource at startup;
/// immutable thereafter.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    name: String,
    kind: FieldKind,
    filter_type: FilterType,
    operators: Vec<FilterOperator>,
    enum_values: Vec<String>,
}

impl FilterSpec {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            filter_type: FilterType::default(),
            operators: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    #[must_use]
    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    #[must_use]
    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    /// Enum-backed filter over an explicit set of accepted values.
    ///
    /// The values given here are the ones advertised and accepted; hand this
    /// the *active* cases only.
    #[must_use]
    pub fn enumeration(name: impl Into<String>, values: Vec<String>) -> Self {
        let mut spec = Self::new(name, FieldKind::Enum);
        spec.enum_values = values;
        spec
    }

    /// Enum-backed filter over the active cases of an [`EnumCases`] type.
    /// Inactive cases are neither advertised nor accepted.
    #[must_use]
    pub fn enum_of<E: EnumCases>(name: impl Into<String>) -> Self {
        Self::enumeration(name, E::active_cases())
    }

    /// Compilation strategy for bare (operator-less) values.
    #[must_use]
    pub fn with_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    /// Narrow or widen the allowed operator set. An empty set (the default)
    /// derives the set from the field kind.
    #[must_use]
    pub fn with_operators(mut self, operators: Vec<FilterOperator>) -> Self {
        self.operators = operators;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub const fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Accepted value set for enum-backed filters (exactly the active cases).
    #[must_use]
    pub fn enum_values(&self) -> &[String] {
        &self.enum_values
    }

    /// Wire type advertised in generated documentation. Enums always
    /// advertise `string` regardless of their underlying representation.
    #[must_use]
    pub const fn wire_type(&self) -> &'static str {
        match self.kind {
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::String | FieldKind::DateTime | FieldKind::Uuid | FieldKind::Enum => "string",
        }
    }

    #[must_use]
    pub fn allowed_operators(&self) -> Vec<FilterOperator> {
        if self.operators.is_empty() {
            default_operators(self.kind)
        } else {
            self.operators.clone()
        }
    }
}

fn default_operators(kind: FieldKind) -> Vec<FilterOperator> {
    use FilterOperator as Op;
    match kind {
        FieldKind::String => vec![
            Op::Equals,
            Op::NotEquals,
            Op::In,
            Op::NotIn,
            Op::Contains,
            Op::NotContains,
            Op::StartsWith,
            Op::EndsWith,
            Op::IsNull,
            Op::IsNotNull,
        ],
        FieldKind::Number | FieldKind::DateTime => vec![
            Op::Equals,
            Op::NotEquals,
            Op::In,
            Op::NotIn,
            Op::GreaterThan,
            Op::GreaterOrEqual,
            Op::LessThan,
            Op::LessOrEqual,
            Op::IsNull,
            Op::IsNotNull,
        ],
        FieldKind::Boolean => vec![Op::Equals, Op::NotEquals, Op::IsNull, Op::IsNotNull],
        FieldKind::Uuid => vec![
            Op::Equals,
            Op::NotEquals,
            Op::In,
            Op::NotIn,
            Op::IsNull,
            Op::IsNotNull,
        ],
        // Minimum guaranteed set for enum-backed filters.
        FieldKind::Enum => vec![Op::Equals, Op::NotEquals, Op::In, Op::NotIn],
    }
}

/// The set of filters declared for one endpoint, plus compilation options.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    specs: Vec<FilterSpec>,
    match_case: MatchCase,
    max_violations: Option<usize>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_spec(mut self, spec: FilterSpec) -> Self {
        self.specs.push(spec);
        self
    }

    #[must_use]
    pub fn with_match_case(mut self, match_case: MatchCase) -> Self {
        self.match_case = match_case;
        self
    }

    /// Cap on accumulated violations per compile pass.
    #[must_use]
    pub fn with_max_violations(mut self, max: usize) -> Self {
        self.max_violations = Some(max);
        self
    }

    #[must_use]
    pub fn specs(&self) -> &[FilterSpec] {
        &self.specs
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FilterSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    #[must_use]
    pub fn error_collector(&self) -> QueryErrors {
        QueryErrors::new(self.max_violations.unwrap_or(DEFAULT_MAX_VIOLATIONS))
    }

    /// Compile every parsed filter into one AND-ed [`Condition`].
    ///
    /// # Errors
    ///
    /// Returns the accumulated [`QueryErrors`] when any filter referenced an
    /// unknown field, used a disallowed operator, or carried an uncoercible
    /// value. All filters are checked before failing.
    pub fn compile(&self, filters: &[ParsedFilterRequest]) -> Result<Condition, QueryErrors> {
        let mut errors = self.error_collector();
        let condition = self.compile_into(filters, &mut errors);
        errors.finish(condition)
    }

    /// Like [`Self::compile`] but feeding an existing collector, so filter
    /// and include violations can surface together.
    pub fn compile_into(
        &self,
        filters: &[ParsedFilterRequest],
        errors: &mut QueryErrors,
    ) -> Condition {
        let mut condition = Condition::all();
        for request in filters {
            if let Some(expr) = self.compile_one(request, errors) {
                condition = condition.add(expr);
            }
        }
        condition
    }

    fn compile_one(
        &self,
        request: &ParsedFilterRequest,
        errors: &mut QueryErrors,
    ) -> Option<SimpleExpr> {
        let Some(spec) = self.find(&request.field) else {
            errors.push(FilterViolation::new(
                &request.field,
                ViolationKind::UnknownField,
                "filter field is not declared",
            ));
            return None;
        };

        let operator = match &request.operator {
            Some(token) => match FilterOperator::from_token(token) {
                Some(op) if spec.allowed_operators().contains(&op) => op,
                Some(op) => {
                    errors.push(
                        FilterViolation::new(
                            &request.field,
                            ViolationKind::DisallowedOperator,
                            "operator is not permitted for this field",
                        )
                        .with_operator(op.token()),
                    );
                    return None;
                }
                None => {
                    errors.push(
                        FilterViolation::new(
                            &request.field,
                            ViolationKind::DisallowedOperator,
                            "unknown operator token",
                        )
                        .with_operator(token.clone()),
                    );
                    return None;
                }
            },
            None => spec.filter_type.implied_operator(),
        };

        if operator.ignores_value() {
            let column = Expr::col(Alias::new(spec.name()));
            return Some(if operator == FilterOperator::IsNull {
                column.is_null()
            } else {
                column.is_not_null()
            });
        }

        if request.values.is_empty() {
            errors.push(
                FilterViolation::new(
                    &request.field,
                    ViolationKind::InvalidValue,
                    "filter requires at least one value",
                )
                .with_operator(operator.token()),
            );
            return None;
        }
        if let Some(oversized) = request
            .values
            .iter()
            .find(|value| value.len() > MAX_VALUE_LENGTH)
        {
            errors.push(
                FilterViolation::new(
                    &request.field,
                    ViolationKind::InvalidValue,
                    "value exceeds maximum length",
                )
                .with_value(oversized.chars().take(64).collect::<String>()),
            );
            return None;
        }

        // Bare multi-value exact filters collapse to set membership.
        let operator = if operator == FilterOperator::Equals && request.values.len() > 1 {
            FilterOperator::In
        } else {
            operator
        };

        // The parser splits every value on the list delimiter; a scalar
        // operator receiving more than one piece is a client error, not a
        // value to silently truncate.
        if !operator.takes_many() && request.values.len() > 1 {
            errors.push(
                FilterViolation::new(
                    &request.field,
                    ViolationKind::InvalidValue,
                    "operator accepts a single value",
                )
                .with_operator(operator.token()),
            );
            return None;
        }

        if operator.takes_many() {
            let mut values = Vec::with_capacity(request.values.len());
            let mut failed = false;
            for raw in &request.values {
                match coerce(spec, raw) {
                    Ok(value) => values.push(value),
                    Err(message) => {
                        failed = true;
                        errors.push(
                            FilterViolation::new(&request.field, ViolationKind::InvalidValue, message)
                                .with_operator(operator.token())
                                .with_value(raw),
                        );
                    }
                }
            }
            if failed {
                return None;
            }
            let column = Expr::col(Alias::new(spec.name()));
            return Some(if operator == FilterOperator::In {
                column.is_in(values)
            } else {
                column.is_not_in(values)
            });
        }

        let raw = request.first_value();
        match operator {
            FilterOperator::Contains
            | FilterOperator::NotContains
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith => Some(self.like_predicate(spec, operator, raw)),
            _ => {
                let value = match coerce(spec, raw) {
                    Ok(value) => value,
                    Err(message) => {
                        errors.push(
                            FilterViolation::new(&request.field, ViolationKind::InvalidValue, message)
                                .with_operator(operator.token())
                                .with_value(raw),
                        );
                        return None;
                    }
                };
                let column = Expr::col(Alias::new(spec.name()));
                Some(match operator {
                    FilterOperator::Equals => column.eq(value),
                    FilterOperator::NotEquals => column.ne(value),
                    FilterOperator::GreaterThan => column.gt(value),
                    FilterOperator::GreaterOrEqual => column.gte(value),
                    FilterOperator::LessThan => column.lt(value),
                    FilterOperator::LessOrEqual => column.lte(value),
                    // Remaining variants are handled above.
                    _ => column.eq(value),
                })
            }
        }
    }

    fn like_predicate(&self, spec: &FilterSpec, operator: FilterOperator, raw: &str) -> SimpleExpr {
        let escaped = escape_like_wildcards(raw);
        let pattern = match operator {
            FilterOperator::StartsWith => format!("{escaped}%"),
            FilterOperator::EndsWith => format!("%{escaped}"),
            _ => format!("%{escaped}%"),
        };
        let negated = operator == FilterOperator::NotContains;
        match self.match_case {
            MatchCase::Sensitive => {
                let column = Expr::col(Alias::new(spec.name()));
                if negated {
                    column.not_like(pattern)
                } else {
                    column.like(pattern)
                }
            }
            MatchCase::Insensitive => {
                let upper =
                    SimpleExpr::FunctionCall(Func::upper(Expr::col(Alias::new(spec.name()))));
                if negated {
                    upper.not_like(pattern.to_uppercase())
                } else {
                    upper.like(pattern.to_uppercase())
                }
            }
        }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn coerce(spec: &FilterSpec, raw: &str) -> Result<Value, String> {
    match spec.kind {
        FieldKind::String => Ok(Value::from(raw.to_string())),
        FieldKind::Enum => {
            if spec.enum_values.iter().any(|case| case == raw) {
                Ok(Value::from(raw.to_string()))
            } else {
                Err(format!(
                    "value is not one of the accepted cases: {}",
                    spec.enum_values.join(", ")
                ))
            }
        }
        FieldKind::Number => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<f64>().map(Value::from))
            .map_err(|_| "expected a number".to_string()),
        FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::from(true)),
            "false" | "0" => Ok(Value::from(false)),
            _ => Err("expected a boolean".to_string()),
        },
        FieldKind::DateTime => parse_date_time(raw)
            .map(Value::from)
            .ok_or_else(|| "expected an RFC 3339 date-time or YYYY-MM-DD date".to_string()),
        FieldKind::Uuid => Uuid::parse_str(raw)
            .map(Value::from)
            .map_err(|_| "expected a UUID".to_string()),
    }
}

fn parse_date_time(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&chrono::Utc));
    }
    let date = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(chrono::DateTime::from_naive_utc_and_offset(
        midnight,
        chrono::Utc,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(field: &str, operator: Option<&str>, values: &[&str]) -> ParsedFilterRequest {
        ParsedFilterRequest {
            field: field.to_string(),
            operator: operator.map(ToString::to_string),
            values: values.iter().map(ToString::to_string).collect(),
        }
    }

    fn registry() -> FilterRegistry {
        FilterRegistry::new()
            .with_spec(FilterSpec::string("reference").with_type(FilterType::Partial))
            .with_spec(FilterSpec::number("total").with_type(FilterType::Operator))
            .with_spec(FilterSpec::enumeration(
                "status",
                vec!["active".into(), "pending".into()],
            ))
            .with_spec(FilterSpec::boolean("archived"))
            .with_spec(FilterSpec::date_time("created_at").with_type(FilterType::Operator))
    }

    #[test]
    fn unknown_field_is_a_violation() {
        let err = registry()
            .compile(&[request("secret", None, &["x"])])
            .unwrap_err();
        assert_eq!(err.violations()[0].kind, ViolationKind::UnknownField);
    }

    #[test]
    fn disallowed_operator_yields_violation_not_predicate() {
        // contains is not in the enum's allowed set
        let err = registry()
            .compile(&[request("status", Some("contains"), &["act"])])
            .unwrap_err();
        let violation = &err.violations()[0];
        assert_eq!(violation.kind, ViolationKind::DisallowedOperator);
        assert_eq!(violation.operator.as_deref(), Some("contains"));
    }

    #[test]
    fn unknown_operator_token_reported_verbatim() {
        let err = registry()
            .compile(&[request("total", Some("resembles"), &["9"])])
            .unwrap_err();
        assert_eq!(
            err.violations()[0].operator.as_deref(),
            Some("resembles")
        );
    }

    #[test]
    fn enum_accepts_only_active_cases() {
        let ok = registry().compile(&[request("status", Some("in"), &["active", "pending"])]);
        assert!(ok.is_ok());

        let err = registry()
            .compile(&[request("status", Some("in"), &["active", "inactive"])])
            .unwrap_err();
        assert_eq!(err.violations()[0].kind, ViolationKind::InvalidValue);
        assert_eq!(err.violations()[0].value.as_deref(), Some("inactive"));
    }

    #[test]
    fn enum_in_filter_compiles_to_set_membership() {
        let condition = registry()
            .compile(&[request("status", Some("in"), &["active", "pending"])])
            .unwrap();
        let rendered = format!("{condition:?}");
        assert!(rendered.contains("active"), "{rendered}");
        assert!(rendered.contains("pending"), "{rendered}");
    }

    #[test]
    fn enum_advertises_string_and_active_values() {
        let registry = registry();
        let spec = registry.find("status").unwrap();
        assert_eq!(spec.wire_type(), "string");
        assert_eq!(spec.enum_values(), ["active", "pending"]);
        // minimum operator set
        let ops = spec.allowed_operators();
        for op in [
            FilterOperator::Equals,
            FilterOperator::NotEquals,
            FilterOperator::In,
            FilterOperator::NotIn,
        ] {
            assert!(ops.contains(&op));
        }
    }

    #[test]
    fn partial_type_compiles_bare_value_to_contains() {
        let condition = registry()
            .compile(&[request("reference", None, &["INV-2024"])])
            .unwrap();
        let rendered = format!("{condition:?}");
        assert!(rendered.contains("%INV-2024%"), "{rendered}");
    }

    #[test]
    fn null_operators_ignore_values() {
        let condition = registry()
            .compile(&[request("reference", Some("is-null"), &["ignored"])])
            .unwrap();
        let rendered = format!("{condition:?}");
        assert!(rendered.to_lowercase().contains("null"), "{rendered}");
    }

    #[test]
    fn all_violations_surface_in_one_pass() {
        let err = registry()
            .compile(&[
                request("secret", None, &["x"]),
                request("total", Some("contains"), &["9"]),
                request("total", None, &["nine"]),
            ])
            .unwrap_err();
        assert_eq!(err.len(), 3);
    }

    #[test]
    fn violation_cap_is_respected() {
        let registry = registry().with_max_violations(2);
        let err = registry
            .compile(&[
                request("a", None, &["x"]),
                request("b", None, &["x"]),
                request("c", None, &["x"]),
            ])
            .unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.dropped(), 1);
    }

    #[test]
    fn bare_multi_value_exact_becomes_set_membership() {
        let registry = FilterRegistry::new().with_spec(FilterSpec::string("reference"));
        let condition = registry
            .compile(&[request("reference", None, &["a", "b"])])
            .unwrap();
        let rendered = format!("{condition:?}");
        assert!(rendered.contains('a') && rendered.contains('b'), "{rendered}");
    }

    #[test]
    fn scalar_operators_reject_surplus_values() {
        for (field, operator) in [("total", "greater-than"), ("reference", "contains")] {
            let err = registry()
                .compile(&[request(field, Some(operator), &["a", "b"])])
                .unwrap_err();
            let violation = &err.violations()[0];
            assert_eq!(violation.kind, ViolationKind::InvalidValue, "{operator}");
            assert_eq!(violation.operator.as_deref(), Some(operator));
        }
    }

    #[test]
    fn number_coercion_accepts_int_and_float() {
        let ok = registry().compile(&[
            request("total", Some("greater-or-equal"), &["10"]),
            request("total", Some("less-than"), &["10.5"]),
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn date_time_coercion_accepts_rfc3339_and_date() {
        let ok = registry().compile(&[
            request("created_at", Some("greater-or-equal"), &["2024-01-01T00:00:00Z"]),
            request("created_at", Some("less-than"), &["2024-12-31"]),
        ]);
        assert!(ok.is_ok());
        let err = registry()
            .compile(&[request("created_at", None, &["yesterday"])])
            .unwrap_err();
        assert_eq!(err.violations()[0].kind, ViolationKind::InvalidValue);
    }

    #[test]
    fn case_insensitive_like_uppercases_both_sides() {
        let registry = FilterRegistry::new()
            .with_spec(FilterSpec::string("reference").with_type(FilterType::Partial))
            .with_match_case(MatchCase::Insensitive);
        let condition = registry
            .compile(&[request("reference", None, &["inv"])])
            .unwrap();
        let rendered = format!("{condition:?}");
        assert!(rendered.contains("%INV%"), "{rendered}");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like_wildcards("50%_done"), "50\\%\\_done");
    }
}
