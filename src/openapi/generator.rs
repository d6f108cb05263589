//! Configuration surface and the scan → post-process → serialize flow.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::errors::GenerateError;
use crate::openapi::enums::EnumRegistry;
use crate::openapi::passes::{
    DeprecationNoticePass, EnumExpansionPass, FeatureFlagPass, OperationIdPass, Pass,
    RateLimitResponsePass, ScopePass, ValidationResponsePass,
};

/// Field casing for the injected pagination component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    #[default]
    Snake,
    Camel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationResponseConfig {
    pub casing: Casing,
}

impl Default for PaginationResponseConfig {
    fn default() -> Self {
        Self {
            casing: Casing::Snake,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationResponseConfig {
    pub status_code: u16,
    pub content_type: String,
    pub max_errors: usize,
    /// Body template; `{{errors}}` expands to the example error array.
    pub content: String,
}

impl Default for ValidationResponseConfig {
    fn default() -> Self {
        Self {
            status_code: 422,
            content_type: "application/json".into(),
            max_errors: 3,
            content: r#"{"message": "The given data was invalid.", "errors": {{errors}}}"#.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeprecationFilterConfig {
    pub enabled: bool,
    pub months_before_removal: u32,
}

impl Default for DeprecationFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            months_before_removal: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureFlagConfig {
    /// Prefix template; `{flag}` expands to the flag name.
    pub description_prefix: String,
}

impl Default for FeatureFlagConfig {
    fn default() -> Self {
        Self {
            description_prefix:
                "**Feature flag:** this operation requires the `{flag}` feature to be enabled."
                    .into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitResponseConfig {
    pub enabled: bool,
    pub message: String,
}

impl Default for RateLimitResponseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message: "Too many requests.".into(),
        }
    }
}

/// Knobs recognized by the post-processing pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub pagination_response: PaginationResponseConfig,
    pub validation_response: ValidationResponseConfig,
    pub deprecation_filter: DeprecationFilterConfig,
    pub feature_flags: FeatureFlagConfig,
    pub rate_limit_response: RateLimitResponseConfig,
}

/// One named schema in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Scanned document to read.
    pub input: PathBuf,
    /// Processed document to write.
    pub output: PathBuf,
    /// Optional shell command run against the written output.
    pub validate: Option<String>,
    /// Literal enum cases registered under their type name.
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<Value>>,
    #[serde(flatten)]
    pub generator: GeneratorConfig,
}

impl SchemaConfig {
    #[must_use]
    pub fn enum_registry(&self) -> EnumRegistry {
        self.enums
            .iter()
            .fold(EnumRegistry::new(), |registry, (name, values)| {
                registry.register_values(name, values.clone())
            })
    }
}

/// Multi-schema TOML configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub schemas: BTreeMap<String, SchemaConfig>,
}

impl ConfigFile {
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|err| GenerateError::Config(err.to_string()))
    }

    /// # Errors
    ///
    /// Fails with [`GenerateError::SchemaNotFound`] when `name` is absent.
    pub fn schema(&self, name: &str) -> Result<&SchemaConfig, GenerateError> {
        self.schemas
            .get(name)
            .ok_or_else(|| GenerateError::SchemaNotFound(name.to_string()))
    }
}

/// Runs the ordered pass pipeline over a scanned document.
pub struct Generator {
    config: GeneratorConfig,
    enums: EnumRegistry,
}

impl Generator {
    #[must_use]
    pub fn new(config: GeneratorConfig, enums: EnumRegistry) -> Self {
        Self { config, enums }
    }

    fn passes(&self) -> Vec<Box<dyn Pass>> {
        let validation = &self.config.validation_response;
        let mut passes: Vec<Box<dyn Pass>> = vec![
            Box::new(EnumExpansionPass::new(self.enums.clone())),
            Box::new(OperationIdPass),
            Box::new(FeatureFlagPass::new(
                self.config.feature_flags.description_prefix.clone(),
            )),
            Box::new(ScopePass),
        ];
        if self.config.deprecation_filter.enabled {
            passes.push(Box::new(DeprecationNoticePass::new(
                self.config.deprecation_filter.months_before_removal,
            )));
        }
        if self.config.rate_limit_response.enabled {
            passes.push(Box::new(RateLimitResponsePass::new(
                self.config.rate_limit_response.message.clone(),
            )));
        }
        passes.push(Box::new(ValidationResponsePass::new(
            validation.status_code,
            validation.content_type.clone(),
            validation.max_errors,
            validation.content.clone(),
        )));
        passes
    }

    /// Run every pass in order and inject the pagination component.
    ///
    /// # Errors
    ///
    /// The first failing pass aborts the run; `doc` must then be discarded.
    pub fn process(&self, doc: &mut Value) -> Result<(), GenerateError> {
        for pass in self.passes() {
            tracing::debug!(pass = pass.name(), "applying document pass");
            pass.apply(doc).map_err(|err| {
                tracing::error!(pass = pass.name(), error = %err, "document pass failed");
                err
            })?;
        }
        inject_pagination_component(doc, self.config.pagination_response.casing);
        Ok(())
    }

    /// Serialize a scanned API document and process it.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be serialized or a pass fails.
    pub fn generate<T: serde::Serialize>(&self, api: &T) -> Result<Value, GenerateError> {
        let mut doc = serde_json::to_value(api)?;
        self.process(&mut doc)?;
        Ok(doc)
    }
}

/// Name of the injected pagination metadata component.
pub const PAGINATION_COMPONENT: &str = "Pagination";

fn inject_pagination_component(doc: &mut Value, casing: Casing) {
    let Some(root) = doc.as_object_mut() else {
        return;
    };
    let components = root
        .entry("components")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(components) = components.as_object_mut() else {
        return;
    };
    let schemas = components
        .entry("schemas")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(schemas) = schemas.as_object_mut() {
        schemas
            .entry(PAGINATION_COMPONENT)
            .or_insert_with(|| pagination_component(casing));
    }
}

fn pagination_component(casing: Casing) -> Value {
    let field = |snake: &str, camel: &str| -> String {
        match casing {
            Casing::Snake => snake.to_string(),
            Casing::Camel => camel.to_string(),
        }
    };
    json!({
        "type": "object",
        "properties": {
            (field("current_page", "currentPage")): {"type": "integer", "minimum": 1},
            (field("per_page", "perPage")): {"type": "integer", "minimum": 1, "maximum": 100},
            (field("last_page", "lastPage")): {"type": "integer", "minimum": 1},
            "total": {"type": "integer", "minimum": 0}
        },
        "required": [
            field("current_page", "currentPage"),
            field("per_page", "perPage"),
            field("last_page", "lastPage"),
            "total"
        ]
    })
}
