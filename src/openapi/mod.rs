//! OpenAPI post-processing.
//!
//! A scanned document (any `Serialize`-able OpenAPI value, typically a
//! `utoipa::openapi::OpenApi`) is serialized to JSON and rewritten by an
//! ordered sequence of [`passes::Pass`] implementations: enum expansion,
//! operation-id synthesis, description notices, and response injection. The
//! run is driven by [`generator::Generator`] from a TOML
//! [`generator::ConfigFile`].

pub mod document;
pub mod enums;
pub mod generator;
pub mod passes;

pub use document::{synthesize_operation_id, visit_objects_mut, visit_operations_mut};
pub use enums::{EnumCases, EnumRegistry};
pub use generator::{ConfigFile, Generator, GeneratorConfig, SchemaConfig};
pub use passes::Pass;
