//! Historical security memory

use parking_lot::RwLock;
use sentinel_common::AnalysisResult;
use std::collections::HashSet;

/// Returned by [`MemoryStore::search`] when nothing matches
pub const NO_MATCHES: &str = "No relevant historical security records found.";

/// Narrow interface to a record index
pub trait MemoryStore: Send + Sync {
    /// Index results; returns how many records were added
    fn index(&self, results: &[AnalysisResult]) -> usize;

    /// Up to `k` most relevant records joined by `\n---\n`
    fn search(&self, query: &str, k: usize) -> String;
}

/// Render a result as a memory record
pub fn record_text(result: &AnalysisResult) -> String {
    let log = &result.log_entry;
    format!(
        "User: {}\nDepartment: {}\nURL: {}\nRisk: {} (Score: {})\nReasoning: {}\nDetected PII: {}",
        log.user_or_unknown(),
        log.department_or_unknown(),
        log.request_url,
        result.risk_category,
        result.risk_score,
        result.reasoning,
        result.detected_sensitive_data.join(", ")
    )
}

struct Record {
    text: String,
    tokens: HashSet<String>,
}

impl Record {
    fn new(text: String) -> Self {
        Self {
            tokens: tokenize(&text),
            text,
        }
    }
}

/// In-process store ranking records by keyword overlap
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with previously rendered records
    pub fn from_records<I>(texts: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            records: RwLock::new(texts.into_iter().map(Record::new).collect()),
        }
    }

    /// Record texts in insertion order
    pub fn records(&self) -> Vec<String> {
        self.records.read().iter().map(|r| r.text.clone()).collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl MemoryStore for InMemoryStore {
    fn index(&self, results: &[AnalysisResult]) -> usize {
        let mut records = self.records.write();
        records.extend(results.iter().map(|r| Record::new(record_text(r))));
        results.len()
    }

    fn search(&self, query: &str, k: usize) -> String {
        let query = tokenize(query);
        let records = self.records.read();

        let mut scored: Vec<(usize, usize)> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.tokens.intersection(&query).count(), i))
            .filter(|(hits, _)| *hits > 0)
            .collect();
        // Most hits first; earlier records win ties
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        if scored.is_empty() || k == 0 {
            return NO_MATCHES.to_string();
        }

        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| records[i].text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .collect()
}
