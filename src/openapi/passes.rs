//! Document rewrite passes.
//!
//! Each pass is an independent transformation run in a fixed order by the
//! generator. Passes are idempotent: the description-prefixing passes check
//! for an already-applied prefix, the operation-id pass only fills absent
//! ids, and the response-injecting passes skip operations that already carry
//! the target response.

use serde_json::{Map, Value, json};

use crate::errors::GenerateError;
use crate::openapi::document::{prepend_description, synthesize_operation_id, visit_operations_mut};
use crate::openapi::enums::EnumRegistry;

/// Marker extension naming the feature flag gating an operation.
pub const FEATURE_FLAG_EXTENSION: &str = "x-feature-flag";
/// Marker extension listing the scopes an operation requires.
pub const REQUIRED_SCOPES_EXTENSION: &str = "x-required-scopes";
/// Transient request-shape metadata driving validation-response injection.
pub const VALIDATION_REQUEST_EXTENSION: &str = "x-validation-request";

/// One ordered transformation over the full document.
pub trait Pass {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// A failing pass aborts the generation run; no partial document is kept.
    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError>;
}

/// Replaces enum type references with their registered active cases.
pub struct EnumExpansionPass {
    registry: EnumRegistry,
}

impl EnumExpansionPass {
    #[must_use]
    pub fn new(registry: EnumRegistry) -> Self {
        Self { registry }
    }
}

impl Pass for EnumExpansionPass {
    fn name(&self) -> &'static str {
        "expand-enums"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        self.registry.expand(doc)
    }
}

/// Fills in `operationId` for operations that lack one, derived from the
/// method and path.
pub struct OperationIdPass;

impl Pass for OperationIdPass {
    fn name(&self) -> &'static str {
        "operation-ids"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        visit_operations_mut(doc, |path, method, operation| {
            if operation.get("operationId").is_none() {
                operation["operationId"] = Value::String(synthesize_operation_id(method, path));
            }
        });
        Ok(())
    }
}

/// Prepends a templated feature-flag notice to flagged operations.
pub struct FeatureFlagPass {
    template: String,
}

impl FeatureFlagPass {
    /// `template` substitutes `{flag}` with the flag name.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Pass for FeatureFlagPass {
    fn name(&self) -> &'static str {
        "feature-flags"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        visit_operations_mut(doc, |_, _, operation| {
            let Some(flag) = operation
                .get(FEATURE_FLAG_EXTENSION)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
            else {
                return;
            };
            let notice = self.template.replace("{flag}", &flag);
            prepend_description(operation, &notice);
        });
        Ok(())
    }
}

/// Prepends a sentence enumerating an operation's required scopes.
pub struct ScopePass;

impl Pass for ScopePass {
    fn name(&self) -> &'static str {
        "required-scopes"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        visit_operations_mut(doc, |_, _, operation| {
            let scopes: Vec<String> = operation
                .get(REQUIRED_SCOPES_EXTENSION)
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|scope| format!("`{scope}`"))
                        .collect()
                })
                .unwrap_or_default();
            if scopes.is_empty() {
                return;
            }
            let notice = format!("Requires the {} scope(s).", scopes.join(", "));
            prepend_description(operation, &notice);
        });
        Ok(())
    }
}

/// Prepends a removal notice to operations marked `deprecated`.
pub struct DeprecationNoticePass {
    months_before_removal: u32,
}

impl DeprecationNoticePass {
    #[must_use]
    pub fn new(months_before_removal: u32) -> Self {
        Self {
            months_before_removal,
        }
    }
}

impl Pass for DeprecationNoticePass {
    fn name(&self) -> &'static str {
        "deprecation-notices"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        let notice = format!(
            "**Deprecated.** Scheduled for removal {} months after deprecation.",
            self.months_before_removal
        );
        visit_operations_mut(doc, |_, _, operation| {
            if operation.get("deprecated").and_then(Value::as_bool) == Some(true) {
                prepend_description(operation, &notice);
            }
        });
        Ok(())
    }
}

/// Adds a 429 response to every operation.
pub struct RateLimitResponsePass {
    message: String,
}

impl RateLimitResponsePass {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Pass for RateLimitResponsePass {
    fn name(&self) -> &'static str {
        "rate-limit-responses"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        visit_operations_mut(doc, |_, _, operation| {
            let responses = operation
                .as_object_mut()
                .and_then(|op| {
                    op.entry("responses")
                        .or_insert_with(|| Value::Object(Map::new()))
                        .as_object_mut()
                });
            if let Some(responses) = responses {
                responses
                    .entry("429")
                    .or_insert_with(|| json!({"description": self.message}));
            }
        });
        Ok(())
    }
}

/// Injects a validation-error response from transient request-shape metadata,
/// then strips the metadata so it never reaches the serialized document.
pub struct ValidationResponsePass {
    status_code: u16,
    content_type: String,
    max_errors: usize,
    /// Response body template; `{{errors}}` is replaced with a JSON array of
    /// example errors derived from the metadata's field names.
    content: String,
}

impl ValidationResponsePass {
    #[must_use]
    pub fn new(
        status_code: u16,
        content_type: impl Into<String>,
        max_errors: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            content_type: content_type.into(),
            max_errors,
            content: content.into(),
        }
    }

    fn example_for(&self, metadata: &Value) -> Result<Value, GenerateError> {
        let fields: Vec<&String> = metadata
            .as_object()
            .map(|meta| meta.keys().take(self.max_errors).collect())
            .unwrap_or_default();
        let errors: Vec<Value> = fields
            .into_iter()
            .map(|field| {
                json!({
                    "field": field,
                    "message": format!("The {field} field is invalid.")
                })
            })
            .collect();
        let rendered = self.content.replace(
            "{{errors}}",
            &serde_json::to_string(&Value::Array(errors))?,
        );
        serde_json::from_str(&rendered).map_err(|err| GenerateError::Template(err.to_string()))
    }
}

impl Pass for ValidationResponsePass {
    fn name(&self) -> &'static str {
        "validation-responses"
    }

    fn apply(&self, doc: &mut Value) -> Result<(), GenerateError> {
        let status = self.status_code.to_string();
        let mut failure = None;
        visit_operations_mut(doc, |_, _, operation| {
            let Some(op) = operation.as_object_mut() else {
                return;
            };
            let Some(metadata) = op.remove(VALIDATION_REQUEST_EXTENSION) else {
                return;
            };
            let example = match self.example_for(&metadata) {
                Ok(example) => example,
                Err(err) => {
                    failure.get_or_insert(err);
                    return;
                }
            };
            let responses = op
                .entry("responses")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(responses) = responses.as_object_mut() {
                responses.entry(status.as_str()).or_insert_with(|| {
                    json!({
                        "description": "Validation failed.",
                        "content": {
                            (&self.content_type): {"example": example}
                        }
                    })
                });
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
