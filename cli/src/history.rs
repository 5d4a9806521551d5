//! Persisted analysis history backing `ai-sentinel search`

use anyhow::{Context, Result};
use sentinel_common::AnalysisResult;
use sentinel_engine::{InMemoryStore, MemoryStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the history file into a searchable store (empty when absent)
pub fn load(path: &Path) -> Result<InMemoryStore> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No history file");
        return Ok(InMemoryStore::new());
    }
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<String> =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(InMemoryStore::from_records(records))
}

/// Index results into the history file; returns how many were added
pub fn append(path: &Path, results: &[AnalysisResult]) -> Result<usize> {
    let store = load(path)?;
    let added = store.index(results);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(&store.records())?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), added, total = store.len(), "History updated");
    Ok(added)
}

/// Explicit path, or `~/.ai-sentinel/history.json`
pub fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => {
            let home = dirs::home_dir().context("cannot find home directory")?;
            Ok(home.join(".ai-sentinel").join("history.json"))
        }
    }
}
