//! Batch driver: reads a JSON array of vocabulary records, enriches
//! each through the generation pipeline, and writes the results. A
//! record that fails after all retries is written back with an `error`
//! field; it never aborts the rest of the batch.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use lexigen_backends::{NebiusGenerator, OpenAiGenerator};
use lexigen_core::config::PipelineConfig;
use lexigen_core::prelude::*;
use tracing_subscriber::EnvFilter;

mod batch;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Input JSON file containing an array of records to enrich
    #[arg(long)]
    file: PathBuf,

    /// Output JSON file (defaults to `<input>_enriched.json`)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Which chat-completion backend to use
    #[arg(long, value_enum, default_value_t = Backend::Openai)]
    backend: Backend,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// OpenAI chat completions
    Openai,
    /// Nebius AI Studio (OpenAI-compatible)
    Nebius,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config_text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("failed to read config {}", cli.config.display()))?;
    let config: PipelineConfig = serde_yaml::from_str(&config_text)
        .with_context(|| format!("failed to parse config {}", cli.config.display()))?;

    let pipeline = build_pipeline(&config, cli.backend)?;

    let records = batch::read_records(&cli.file)?;
    tracing::info!(
        records = records.len(),
        template_variables = ?pipeline.prompter().required_variables(),
        "starting enrichment run"
    );

    let results = batch::run(&pipeline, &records, &GenerateOptions::default()).await;

    let output_path = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.file));
    batch::write_results(&output_path, &results)?;
    tracing::info!(output = %output_path.display(), "processing complete");
    Ok(())
}

/// Wires prompter, backend, extractor, and validator from the config.
/// Configuration problems (missing credentials, required-but-unreadable
/// schema) fail here, before any record is touched.
fn build_pipeline(config: &PipelineConfig, backend: Backend) -> anyhow::Result<GenerationPipeline> {
    let generator: Box<dyn Generator> = match backend {
        Backend::Openai => Box::new(OpenAiGenerator::from_config(&config.api)?),
        Backend::Nebius => Box::new(NebiusGenerator::from_config(&config.api)?),
    };

    let prompter = TemplatePrompter::from_path(&config.prompt_path, config.substitution)?;

    let json_config = &config.validators.json;
    let validator = match &json_config.schema_path {
        Some(path) => SchemaValidator::from_path(path, json_config.require_schema)?,
        None => SchemaValidator::new(None, json_config.require_schema)?,
    };

    Ok(GenerationPipeline::builder(generator, prompter)
        .extractor(Box::new(CodeBlockExtractor::new()))
        .validator(Box::new(validator))
        .retry(config.handler.retry_policy())
        .build())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_enriched.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_appends_enriched() {
        assert_eq!(
            default_output_path(Path::new("data/words.json")),
            PathBuf::from("data/words_enriched.json")
        );
    }

    #[test]
    fn cli_parses_minimal_arguments() {
        let cli = Cli::parse_from(["lexigen", "--file", "words.json"]);
        assert_eq!(cli.file, PathBuf::from("words.json"));
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(cli.output.is_none());
        assert!(matches!(cli.backend, Backend::Openai));
    }

    #[test]
    fn cli_accepts_backend_selection() {
        let cli = Cli::parse_from(["lexigen", "--file", "w.json", "--backend", "nebius"]);
        assert!(matches!(cli.backend, Backend::Nebius));
    }
}
