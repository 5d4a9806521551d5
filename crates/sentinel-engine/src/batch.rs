//! Batch orchestration and analytics

use crate::decision::RiskEngine;
use crate::verdict::{FALLBACK_SCORE, MANUAL_REVIEW};
use sentinel_common::{AnalysisMethod, AnalysisResult, LogEntry, RiskCategory, THREAT_SCORE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

impl RiskEngine {
    /// Analyze entries one after another, results in input order
    pub async fn batch_analyze(&self, entries: Vec<LogEntry>, agentic: bool) -> Vec<AnalysisResult> {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(self.analyze(entry, agentic).await);
        }
        info!(total = results.len(), agentic, "Batch analyzed");
        results
    }

    /// Analyze entries on at most `limit` concurrent tasks.
    ///
    /// Results keep input order. A task that panics yields the
    /// manual-review fallback for its entry.
    pub async fn batch_analyze_concurrent(
        self: &Arc<Self>,
        entries: Vec<LogEntry>,
        agentic: bool,
        limit: usize,
    ) -> Vec<AnalysisResult> {
        let total = entries.len();
        let semaphore = Arc::new(Semaphore::new(limit.max(1)));
        let mut tasks = JoinSet::new();

        for (index, entry) in entries.iter().cloned().enumerate() {
            let engine = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, engine.analyze(entry, agentic).await)
            });
        }

        let mut slots: Vec<Option<AnalysisResult>> = (0..total).map(|_| None).collect();
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) if e.is_panic() => {
                    error!(error = %e, "Analysis task panicked");
                    failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Analysis task failed");
                    failed += 1;
                }
            }
        }

        // Slots left empty belong to tasks that never returned
        let results: Vec<AnalysisResult> = slots
            .into_iter()
            .zip(entries)
            .map(|(slot, entry)| slot.unwrap_or_else(|| task_failure_result(entry)))
            .collect();
        info!(total, failed, agentic, limit, "Batch analyzed");
        results
    }
}

fn task_failure_result(log_entry: LogEntry) -> AnalysisResult {
    AnalysisResult::new(log_entry, RiskCategory::MediumRisk, FALLBACK_SCORE, AnalysisMethod::Fallback)
        .with_reasoning(MANUAL_REVIEW)
        .with_action(MANUAL_REVIEW)
        .with_error("analysis task panicked")
}

/// Aggregate view of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalytics {
    /// Result count per category
    pub risk_distribution: BTreeMap<RiskCategory, usize>,
    /// Mean score per department (`Unknown` when absent)
    pub department_risk: BTreeMap<String, f64>,
    /// Occurrences of each sensitive data label
    pub sensitive_data_breakdown: BTreeMap<String, usize>,
    /// Results scoring above the threat threshold
    pub total_threats: usize,
    /// Mean score (0 for an empty batch)
    pub avg_risk_score: f64,
    /// Batch size
    pub total: usize,
}

impl BatchAnalytics {
    /// Aggregate a batch of results
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let mut analytics = Self {
            total: results.len(),
            ..Default::default()
        };
        let mut department_totals: BTreeMap<String, (u64, usize)> = BTreeMap::new();
        let mut score_sum: u64 = 0;

        for result in results {
            *analytics.risk_distribution.entry(result.risk_category).or_insert(0) += 1;

            let entry = department_totals
                .entry(result.log_entry.department_or_unknown().to_string())
                .or_insert((0, 0));
            entry.0 += u64::from(result.risk_score);
            entry.1 += 1;

            // Pre-screen findings when present, otherwise the verdict's list
            let labels = result
                .log_entry
                .pre_analysis
                .as_ref()
                .map(|pre| &pre.detected_sensitive_data)
                .unwrap_or(&result.detected_sensitive_data);
            for label in labels {
                *analytics.sensitive_data_breakdown.entry(label.clone()).or_insert(0) += 1;
            }

            if result.risk_score > THREAT_SCORE_THRESHOLD {
                analytics.total_threats += 1;
            }
            score_sum += u64::from(result.risk_score);
        }

        analytics.department_risk = department_totals
            .into_iter()
            .map(|(dept, (sum, count))| (dept, sum as f64 / count as f64))
            .collect();
        analytics.avg_risk_score = score_sum as f64 / results.len() as f64;
        analytics
    }

    /// Count for one category
    pub fn count(&self, category: RiskCategory) -> usize {
        self.risk_distribution.get(&category).copied().unwrap_or(0)
    }
}

/// Aggregate a batch of results
pub fn analytics(results: &[AnalysisResult]) -> BatchAnalytics {
    BatchAnalytics::from_results(results)
}
