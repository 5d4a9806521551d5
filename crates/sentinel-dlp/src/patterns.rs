//! Compiled pattern set

use crate::ScanError;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use sentinel_common::PatternDef;

/// Pre-compiled patterns: one `RegexSet` for the single-pass label test,
/// plus the individual regexes for locating match spans.
#[derive(Debug, Clone)]
pub struct PatternSet {
    labels: Vec<String>,
    set: RegexSet,
    regexes: Vec<Regex>,
}

impl PatternSet {
    /// Build from pattern definitions, preserving their order
    pub fn build(defs: &[PatternDef]) -> Result<Self, ScanError> {
        if defs.is_empty() {
            return Err(ScanError::NoPatterns);
        }

        let mut regexes = Vec::with_capacity(defs.len());
        for def in defs {
            let re = RegexBuilder::new(&def.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ScanError::Compile {
                    label: def.label.clone(),
                    reason: e.to_string(),
                })?;
            regexes.push(re);
        }

        let set = RegexSetBuilder::new(defs.iter().map(|d| d.pattern.as_str()))
            .case_insensitive(true)
            .build()
            .map_err(|e| ScanError::Compile {
                label: "<set>".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            labels: defs.iter().map(|d| d.label.clone()).collect(),
            set,
            regexes,
        })
    }

    /// Indices of patterns matching anywhere in the text, ascending
    #[inline]
    pub fn matching_indices(&self, text: &str) -> Vec<usize> {
        self.set.matches(text).into_iter().collect()
    }

    /// Find all match spans of one pattern
    pub fn find_spans<'a>(&'a self, index: usize, text: &'a str) -> impl Iterator<Item = PatternMatch<'a>> + 'a {
        self.regexes[index].find_iter(text).map(move |m| PatternMatch {
            pattern_index: index,
            start: m.start(),
            end: m.end(),
            matched_text: m.as_str(),
        })
    }

    /// Label of a pattern
    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    /// Total number of patterns
    pub fn pattern_count(&self) -> usize {
        self.labels.len()
    }
}

/// A pattern match span
#[derive(Debug, Clone)]
pub struct PatternMatch<'a> {
    /// Index of the pattern that matched
    pub pattern_index: usize,
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Matched text slice
    pub matched_text: &'a str,
}

impl<'a> PatternMatch<'a> {
    /// Match length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
