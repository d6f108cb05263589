//! Post-process scanned OpenAPI documents from the command line.
//!
//! Reads the schema's input document, runs the pass pipeline, writes the
//! output document, and optionally runs the schema's validation command.
//! Exits 0 on success, 1 when the named schema is missing or any step fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use querydoc::openapi::{ConfigFile, Generator, SchemaConfig};

#[derive(Debug, Parser)]
#[command(name = "querydoc", about = "Post-process scanned OpenAPI documents")]
struct Cli {
    /// Schema name from the config file; all schemas when omitted.
    schema: Option<String>,

    /// Path to the TOML configuration file.
    #[arg(long, default_value = "querydoc.toml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), querydoc::GenerateError> {
    let config = ConfigFile::load(&cli.config)?;
    match &cli.schema {
        Some(name) => generate_schema(name, config.schema(name)?),
        None => {
            for (name, schema) in &config.schemas {
                generate_schema(name, schema)?;
            }
            Ok(())
        }
    }
}

fn generate_schema(name: &str, schema: &SchemaConfig) -> Result<(), querydoc::GenerateError> {
    tracing::info!(schema = name, input = %schema.input.display(), "processing schema");

    let text = std::fs::read_to_string(&schema.input)?;
    let mut doc: serde_json::Value = serde_json::from_str(&text)?;

    let generator = Generator::new(schema.generator.clone(), schema.enum_registry());
    generator.process(&mut doc)?;

    if let Some(parent) = schema.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&schema.output, serde_json::to_string_pretty(&doc)?)?;
    tracing::info!(schema = name, output = %schema.output.display(), "schema written");

    if let Some(command) = &schema.validate {
        validate_output(name, command)?;
    }
    Ok(())
}

fn validate_output(name: &str, command: &str) -> Result<(), querydoc::GenerateError> {
    tracing::info!(schema = name, command, "running validation command");
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(querydoc::GenerateError::Config(format!(
            "validation command failed for schema `{name}` with {status}"
        )))
    }
}
