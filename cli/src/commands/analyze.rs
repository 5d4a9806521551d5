//! Batch log analysis

use crate::config;
use crate::history;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use sentinel_common::{AnalysisResult, LogEntry};
use sentinel_engine::{analytics, BatchAnalytics, RiskEngine};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct Report<'a> {
    results: &'a [AnalysisResult],
    analytics: &'a BatchAnalytics,
}

/// Read a JSON array of log entries
pub fn read_logs(path: &Path) -> Result<Vec<LogEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// `history` is `None` when recording is disabled; `Some(None)` uses the default file
pub async fn handle(
    config_path: Option<&Path>,
    history: Option<Option<&Path>>,
    file: &Path,
    agentic: bool,
    concurrency: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let config = config::load(config_path)?;
    let logs = read_logs(file)?;
    let agentic = agentic || config.engine.agentic;
    let concurrency = concurrency.unwrap_or(config.engine.concurrency);

    let engine = Arc::new(RiskEngine::from_config(&config)?);
    tracing::info!(
        entries = logs.len(),
        agentic,
        concurrency,
        backend = engine.backend_name(),
        "Analyzing logs"
    );

    let results = if concurrency > 1 {
        engine.batch_analyze_concurrent(logs, agentic, concurrency).await
    } else {
        engine.batch_analyze(logs, agentic).await
    };
    let summary = analytics(&results);

    if let Some(history_path) = history {
        let path = history::resolve(history_path)?;
        let added = history::append(&path, &results)?;
        tracing::info!(path = %path.display(), added, "Results recorded for search");
    }

    match format {
        OutputFormat::Json => OutputFormat::print_json(&Report {
            results: &results,
            analytics: &summary,
        })?,
        OutputFormat::Table => {
            output::print_results(&results);
            output::print_analytics(&summary);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_logs() {
        let path = std::env::temp_dir().join(format!("ai-sentinel-logs-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"request_url": "https://chat.openai.com", "payload_snippet": "hi", "user_id": "u1"}]"#,
        )
        .unwrap();

        let logs = read_logs(&path).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].user_or_unknown(), "u1");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_read_logs_rejects_non_array() {
        let path = std::env::temp_dir().join(format!("ai-sentinel-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"request_url": "x"}"#).unwrap();
        assert!(read_logs(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
