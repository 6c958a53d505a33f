//! The batch loop: one pipeline call per record, in input order, with
//! per-record error recovery.

use std::path::Path;

use anyhow::Context;
use lexigen_core::prelude::*;
use serde_json::Value;

/// Reads a JSON array of records from `path`.
pub fn read_records(path: &Path) -> anyhow::Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("input {} is not a JSON array of records", path.display()))
}

/// Processes records sequentially. Output order matches input order.
///
/// A record whose `handle` call fails is written back with its original
/// fields plus an `error` marker; sibling records are unaffected.
pub async fn run(
    pipeline: &GenerationPipeline,
    records: &[Record],
    options: &GenerateOptions,
) -> Vec<Value> {
    let total = records.len();
    let mut results = Vec::with_capacity(total);

    for (index, record) in records.iter().enumerate() {
        let label = record
            .get("word")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");

        match pipeline.handle(record, options).await {
            Ok(candidate) => {
                tracing::info!(processed = index + 1, total, word = %label, "record enriched");
                results.push(candidate.into_value());
            }
            Err(error) => {
                tracing::error!(word = %label, %error, "record failed, continuing batch");
                let mut marked = record.clone();
                marked.insert("error".to_string(), Value::String(error.to_string()));
                results.push(Value::Object(marked));
            }
        }
    }

    results
}

/// Writes the result array as pretty-printed JSON.
pub fn write_results(path: &Path, results: &[Value]) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(results)?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write output {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexigen_core::prompter::InlineTemplateSource;
    use serde_json::json;
    use std::time::Duration;

    /// Succeeds for words it knows, fails for everything else.
    struct SelectiveGenerator;

    #[async_trait]
    impl Generator for SelectiveGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GeneratorError> {
            if prompt.contains("springa") {
                Ok("```json\n{\"word\": \"springa\", \"definition\": \"to run\"}\n```".into())
            } else {
                Err(GeneratorError::Call("model unreachable".into()))
            }
        }
    }

    fn pipeline() -> GenerationPipeline {
        let prompter = TemplatePrompter::load(
            Box::new(InlineTemplateSource::new("Define {word}.")),
            SubstitutionPolicy::Strict,
        )
        .unwrap();
        GenerationPipeline::builder(Box::new(SelectiveGenerator), prompter)
            .retry(
                RetryPolicy::default()
                    .with_max_attempts(2)
                    .with_backoff(BackoffStrategy::Constant(Duration::ZERO)),
            )
            .build()
    }

    fn record(word: &str) -> Record {
        let mut record = Record::new();
        record.insert("word".into(), json!(word));
        record
    }

    #[tokio::test]
    async fn failing_record_is_marked_and_batch_continues() {
        let records = vec![record("okänd"), record("springa")];
        let results = run(&pipeline(), &records, &GenerateOptions::default()).await;

        assert_eq!(results.len(), 2);
        // First record: original fields preserved, error attached.
        assert_eq!(results[0]["word"], json!("okänd"));
        assert!(results[0]["error"]
            .as_str()
            .unwrap()
            .contains("model unreachable"));
        // Second record: enriched despite the sibling failure.
        assert_eq!(results[1]["definition"], json!("to run"));
    }

    #[tokio::test]
    async fn output_order_matches_input_order() {
        let records = vec![record("springa"), record("okänd"), record("springa")];
        let results = run(&pipeline(), &records, &GenerateOptions::default()).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].get("error").is_none());
        assert!(results[1].get("error").is_some());
        assert!(results[2].get("error").is_none());
    }

    #[tokio::test]
    async fn results_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("words.json");
        std::fs::write(&input_path, r#"[{"word": "springa"}]"#).unwrap();

        let records = read_records(&input_path).unwrap();
        assert_eq!(records.len(), 1);

        let results = run(&pipeline(), &records, &GenerateOptions::default()).await;
        let output_path = dir.path().join("words_enriched.json");
        write_results(&output_path, &results).unwrap();

        let written: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(written[0]["word"], json!("springa"));
    }

    #[test]
    fn non_array_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("bad.json");
        std::fs::write(&input_path, r#"{"word": "x"}"#).unwrap();
        assert!(read_records(&input_path).is_err());
    }
}
