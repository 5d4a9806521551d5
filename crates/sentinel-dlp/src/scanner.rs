//! Sensitive data scanner

use crate::patterns::PatternSet;
use crate::ScanError;
use sentinel_common::{PatternDef, PolicyStore};
use serde::Serialize;
use tracing::debug;

/// A located sensitive-data match
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    /// Data-type label
    pub label: String,
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Matched text
    #[serde(skip)]
    pub matched_text: String,
}

impl Match {
    /// Mask the matched text for safe logging
    pub fn masked_text(&self) -> String {
        let chars: Vec<char> = self.matched_text.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}****{}", head, tail)
    }
}

/// Detailed scan output
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Labels with at least one match, in pattern order
    pub labels: Vec<String>,
    /// Every match span
    pub matches: Vec<Match>,
    /// Bytes scanned
    pub content_length: usize,
}

impl ScanReport {
    /// Whether anything was found
    pub fn has_matches(&self) -> bool {
        !self.labels.is_empty()
    }
}

/// Pattern-based sensitive data scanner
#[derive(Debug, Clone)]
pub struct SensitiveDataScanner {
    patterns: PatternSet,
}

impl SensitiveDataScanner {
    /// Create scanner from pattern definitions
    pub fn new(defs: &[PatternDef]) -> Result<Self, ScanError> {
        Ok(Self {
            patterns: PatternSet::build(defs)?,
        })
    }

    /// Create scanner from the policy store's pattern table
    pub fn from_policy(policy: &PolicyStore) -> Result<Self, ScanError> {
        Self::new(policy.sensitive_patterns())
    }

    /// Labels of every pattern matching anywhere in `text`.
    ///
    /// Empty input yields an empty list; this never fails.
    pub fn scan(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut labels: Vec<String> = Vec::new();
        for index in self.patterns.matching_indices(text) {
            push_unique(&mut labels, self.patterns.label(index));
        }

        debug!(bytes = text.len(), hits = labels.len(), "Payload scanned");
        labels
    }

    /// Scan and locate every match span
    pub fn scan_detailed(&self, text: &str) -> ScanReport {
        let mut report = ScanReport {
            content_length: text.len(),
            ..Default::default()
        };
        if text.is_empty() {
            return report;
        }

        for index in self.patterns.matching_indices(text) {
            let label = self.patterns.label(index);
            for pm in self.patterns.find_spans(index, text) {
                report.matches.push(Match {
                    label: label.to_string(),
                    start: pm.start,
                    end: pm.end,
                    matched_text: pm.matched_text.to_string(),
                });
            }
            push_unique(&mut report.labels, label);
        }

        report
    }

    /// Number of configured patterns
    pub fn pattern_count(&self) -> usize {
        self.patterns.pattern_count()
    }
}

// Several patterns may share a label; keep the first occurrence
fn push_unique(labels: &mut Vec<String>, label: &str) {
    if !labels.iter().any(|l| l == label) {
        labels.push(label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> SensitiveDataScanner {
        let policy = PolicyStore::builtin().unwrap();
        SensitiveDataScanner::from_policy(&policy).unwrap()
    }

    #[test]
    fn test_scan_iban() {
        let labels = scanner().scan("IBAN: NL91ABNA0417164300");
        assert!(labels.contains(&"iban".to_string()));
    }

    #[test]
    fn test_scan_email_and_account() {
        let labels = scanner().scan("send 123456789 to jane.doe@bank.com");
        assert!(labels.contains(&"account_number".to_string()));
        assert!(labels.contains(&"email".to_string()));
    }

    #[test]
    fn test_scan_monetary() {
        let labels = scanner().scan("Transfer €1,250,000.00 today");
        assert!(labels.contains(&"monetary_large".to_string()));
    }

    #[test]
    fn test_scan_clean_text() {
        assert!(scanner().scan("hello").is_empty());
        assert!(scanner().scan("Normal query").is_empty());
        assert!(scanner().scan("").is_empty());
    }

    #[test]
    fn test_labels_follow_pattern_order() {
        let labels = scanner().scan("jane@bank.com NL91ABNA0417164300");
        let iban = labels.iter().position(|l| l == "iban").unwrap();
        let email = labels.iter().position(|l| l == "email").unwrap();
        assert!(iban < email);
    }

    #[test]
    fn test_detailed_masks_matches() {
        let report = scanner().scan_detailed("account 1234567890");
        assert!(report.has_matches());
        let m = report
            .matches
            .iter()
            .find(|m| m.label == "account_number")
            .unwrap();
        assert_eq!(m.masked_text(), "12****90");
    }

    #[test]
    fn test_mask_multibyte() {
        let m = Match {
            label: "monetary_large".into(),
            start: 0,
            end: 0,
            matched_text: "€ 5M".into(),
        };
        assert_eq!(m.masked_text(), "****");
    }

    #[test]
    fn test_shared_label_reported_once() {
        let scanner = SensitiveDataScanner::new(&[
            PatternDef::new("account_number", r"\b\d{9,12}\b"),
            PatternDef::new("email", r"[\w.+-]+@[\w-]+\.[\w.]+"),
            PatternDef::new("account_number", r"\bACC-\d{4,}\b"),
        ])
        .unwrap();

        let text = "ACC-20931 and 123456789 to ops@bank.com";
        assert_eq!(scanner.scan(text), vec!["account_number", "email"]);

        let report = scanner.scan_detailed(text);
        assert_eq!(report.labels, vec!["account_number", "email"]);
        assert_eq!(report.matches.iter().filter(|m| m.label == "account_number").count(), 2);
    }

    proptest::proptest! {
        #[test]
        fn prop_scan_never_panics(text in ".{0,256}") {
            let labels = scanner().scan(&text);
            proptest::prop_assert!(labels.len() <= scanner().pattern_count());
        }
    }
}
