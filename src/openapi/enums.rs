//! Enum case registration and in-document expansion.
//!
//! Schemas in the source document may declare their `enum` values indirectly:
//! a string containing `::` is treated as a type reference (for example
//! `"invoices::Status"`) and replaced at generation time with the cases
//! registered under that name. References may also appear inside a mixed
//! array, where literal entries pass through untouched and each reference is
//! spliced in place.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::GenerateError;
use crate::openapi::document::visit_objects_mut;

/// A type whose cases can be enumerated for documentation.
///
/// `inactive_cases` lists values that are still accepted on input for
/// backwards compatibility but should no longer be offered to clients;
/// only the active cases are published in generated schemas.
pub trait EnumCases {
    /// Name the type registers under, e.g. `"invoices::Status"`.
    fn type_name() -> String;

    /// Every case the type accepts, in declaration order.
    fn cases() -> Vec<String>;

    /// Cases retained only for backwards compatibility.
    fn inactive_cases() -> Vec<String> {
        Vec::new()
    }

    /// Cases advertised to clients.
    fn active_cases() -> Vec<String> {
        let inactive = Self::inactive_cases();
        Self::cases()
            .into_iter()
            .filter(|case| !inactive.contains(case))
            .collect()
    }
}

/// Name-to-cases table consulted while expanding `enum` references.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    cases: BTreeMap<String, Vec<Value>>,
}

impl EnumRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type's active cases under its own name.
    #[must_use]
    pub fn register<E: EnumCases>(self) -> Self {
        let values = E::active_cases().into_iter().map(Value::String).collect();
        self.register_values(E::type_name(), values)
    }

    /// Register raw case values under an explicit name.
    #[must_use]
    pub fn register_values(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.cases.insert(name.into(), values);
        self
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&[Value]> {
        self.cases.get(name).map(Vec::as_slice)
    }

    /// Replace every enum type reference reachable from `node` with the
    /// registered cases.
    ///
    /// # Errors
    ///
    /// Fails with [`GenerateError::UnresolvableEnum`] when a reference names
    /// an unregistered type, and [`GenerateError::InvalidEnumSource`] when an
    /// `enum` value is neither a string reference nor an array.
    pub fn expand(&self, node: &mut Value) -> Result<(), GenerateError> {
        let mut failure = None;
        visit_objects_mut(node, &mut |map| {
            let Some(spec) = map.get_mut("enum") else {
                return;
            };
            match self.expand_spec(spec) {
                Ok(expanded) => *spec = expanded,
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn expand_spec(&self, spec: &Value) -> Result<Value, GenerateError> {
        match spec {
            Value::String(text) if is_type_reference(text) => {
                Ok(Value::Array(self.resolve(text)?.to_vec()))
            }
            Value::Array(entries) => {
                let mut expanded = Vec::with_capacity(entries.len());
                for entry in entries {
                    match entry {
                        Value::String(text) if is_type_reference(text) => {
                            expanded.extend(self.resolve(text)?.iter().cloned());
                        }
                        literal => expanded.push(literal.clone()),
                    }
                }
                Ok(Value::Array(expanded))
            }
            Value::String(_) => Ok(spec.clone()),
            other => Err(GenerateError::InvalidEnumSource(other.to_string())),
        }
    }

    fn resolve(&self, name: &str) -> Result<&[Value], GenerateError> {
        self.lookup(name)
            .ok_or_else(|| GenerateError::UnresolvableEnum(name.to_string()))
    }
}

fn is_type_reference(text: &str) -> bool {
    text.contains("::")
}
