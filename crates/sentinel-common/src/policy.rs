//! Policy store: domain lists, sensitive-data patterns, department tiers
//!
//! Built once at startup and shared read-only (`Arc<PolicyStore>`).
//! Domain checks are substring containment over the request host, so
//! subdomains and port variants match; over-matching (`ai.com` inside
//! `notai.com`) is an accepted approximation of this policy.

use crate::error::{SentinelError, SentinelResult};
use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Environment variable overriding the approved-domain list
pub const ENV_APPROVED_DOMAINS: &str = "APPROVED_DOMAINS";
/// Environment variable overriding the external AI service list
pub const ENV_EXTERNAL_AI_SERVICES: &str = "EXTERNAL_AI_SERVICES";
/// Environment variable overriding the known-malicious list
pub const ENV_MALICIOUS_DOMAINS: &str = "MALICIOUS_DOMAINS";

/// Department sensitivity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityTier {
    /// Routinely handles customer or market-sensitive data
    #[serde(alias = "high_sensitivity")]
    High,
    /// Default tier
    #[serde(alias = "medium_sensitivity")]
    Medium,
    /// Rarely handles sensitive data
    #[serde(alias = "low_sensitivity")]
    Low,
}

impl Default for SensitivityTier {
    fn default() -> Self {
        Self::Medium
    }
}

impl SensitivityTier {
    /// Label used in prompts and reports
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high_sensitivity",
            Self::Medium => "medium_sensitivity",
            Self::Low => "low_sensitivity",
        }
    }
}

/// Sensitive data pattern definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDef {
    /// Data-type label reported on match
    pub label: String,
    /// Regular expression (matched case-insensitively)
    pub pattern: String,
}

impl PatternDef {
    /// Create a pattern definition
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.into(),
        }
    }
}

/// Serializable policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Sanctioned AI endpoints
    pub approved_domains: Vec<String>,
    /// External AI services requiring scrutiny
    pub external_ai_services: Vec<String>,
    /// Known-malicious domains
    pub malicious_domains: Vec<String>,
    /// Sensitive data patterns, in reporting order
    pub sensitive_patterns: Vec<PatternDef>,
    /// Department sensitivity tiers
    pub departments: BTreeMap<String, SensitivityTier>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            approved_domains: strings(&[
                "internal-ai.company.local",
                "ai.company.internal",
                "approved-partner.com",
            ]),
            external_ai_services: strings(&[
                "chat.openai.com",
                "chatgpt.com",
                "api.openai.com",
                "api.anthropic.com",
                "claude.ai",
                "gemini.google.com",
                "api.cohere.ai",
                "bard.google.com",
            ]),
            malicious_domains: strings(&[
                "evil-phishing-site.com",
                "malware-distributor.net",
                "suspicious-internal-proxy.info",
                "data-exfiltration-test.org",
            ]),
            sensitive_patterns: default_patterns(),
            departments: default_departments(),
        }
    }
}

impl PolicyConfig {
    /// Apply comma-separated list overrides from a variable lookup.
    ///
    /// Blank values leave the list untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut Vec<String>); 3] = [
            (ENV_APPROVED_DOMAINS, &mut self.approved_domains),
            (ENV_EXTERNAL_AI_SERVICES, &mut self.external_ai_services),
            (ENV_MALICIOUS_DOMAINS, &mut self.malicious_domains),
        ];

        for (key, list) in targets {
            if let Some(raw) = lookup(key) {
                let parsed = split_list(&raw);
                if !parsed.is_empty() {
                    *list = parsed;
                }
            }
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }
}

/// Compiled domain list with substring containment
#[derive(Debug, Clone)]
pub struct DomainList {
    entries: Vec<String>,
    automaton: AhoCorasick,
}

impl DomainList {
    /// Build from entries; blank entries are dropped
    pub fn new<I, S>(entries: I) -> SentinelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&entries)
            .map_err(|e| SentinelError::InvalidPolicy(e.to_string()))?;

        Ok(Self { entries, automaton })
    }

    /// Whether the domain contains any entry
    #[inline]
    pub fn matches(&self, domain: &str) -> bool {
        !self.entries.is_empty() && self.automaton.is_match(domain)
    }

    /// Configured entries
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable policy store
#[derive(Debug, Clone)]
pub struct PolicyStore {
    approved: DomainList,
    external_ai: DomainList,
    malicious: DomainList,
    patterns: Vec<PatternDef>,
    departments: BTreeMap<String, SensitivityTier>,
}

impl PolicyStore {
    /// Build and validate the store.
    ///
    /// An empty pattern table or a pattern that does not compile is fatal:
    /// every downstream decision depends on the scanner.
    pub fn from_config(config: PolicyConfig) -> SentinelResult<Self> {
        if config.sensitive_patterns.is_empty() {
            return Err(SentinelError::EmptyPatternTable);
        }

        for def in &config.sensitive_patterns {
            if def.label.trim().is_empty() {
                return Err(SentinelError::InvalidPolicy(
                    "sensitive pattern with empty label".to_string(),
                ));
            }
            regex::RegexBuilder::new(&def.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| SentinelError::InvalidPattern {
                    label: def.label.clone(),
                    reason: e.to_string(),
                })?;
        }

        let store = Self {
            approved: DomainList::new(&config.approved_domains)?,
            external_ai: DomainList::new(&config.external_ai_services)?,
            malicious: DomainList::new(&config.malicious_domains)?,
            patterns: config.sensitive_patterns,
            departments: config.departments,
        };

        info!(
            approved = store.approved.len(),
            external_ai = store.external_ai.len(),
            malicious = store.malicious.len(),
            patterns = store.patterns.len(),
            "Policy store loaded"
        );

        Ok(store)
    }

    /// Store with built-in defaults
    pub fn builtin() -> SentinelResult<Self> {
        Self::from_config(PolicyConfig::default())
    }

    /// Domain contains an approved entry
    #[inline]
    pub fn is_approved(&self, domain: &str) -> bool {
        self.approved.matches(domain)
    }

    /// Domain contains an external AI service entry
    #[inline]
    pub fn is_external_ai(&self, domain: &str) -> bool {
        self.external_ai.matches(domain)
    }

    /// Domain contains a known-malicious entry
    #[inline]
    pub fn is_known_malicious(&self, domain: &str) -> bool {
        self.malicious.matches(domain)
    }

    /// Approved domain list
    pub fn approved_domains(&self) -> &[String] {
        self.approved.entries()
    }

    /// External AI service list
    pub fn external_ai_services(&self) -> &[String] {
        self.external_ai.entries()
    }

    /// Known-malicious list
    pub fn malicious_domains(&self) -> &[String] {
        self.malicious.entries()
    }

    /// Sensitive data patterns
    pub fn sensitive_patterns(&self) -> &[PatternDef] {
        &self.patterns
    }

    /// Department tiers
    pub fn departments(&self) -> &BTreeMap<String, SensitivityTier> {
        &self.departments
    }

    /// Sensitivity tier of a department (medium when unknown)
    pub fn department_sensitivity(&self, department: Option<&str>) -> SensitivityTier {
        department
            .and_then(|d| self.departments.get(d))
            .copied()
            .unwrap_or_default()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::new("iban", r"[A-Z]{2}[0-9]{2}[A-Z0-9]{1,30}"),
        PatternDef::new("account_number", r"\b\d{8,12}\b"),
        PatternDef::new(
            "email",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
        ),
        PatternDef::new(
            "phone",
            r"\b\+?\d{1,3}[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{1,4}[-.\s]?\d{1,9}\b",
        ),
        PatternDef::new("monetary_large", r"€\s*\d{1,3}(,\d{3})*(\.\d{2})?[KMB]?"),
    ]
}

fn default_departments() -> BTreeMap<String, SensitivityTier> {
    use SensitivityTier::*;
    [
        ("Fraud Detection", High),
        ("Investment Banking", High),
        ("Risk Analytics", High),
        ("Data Engineering", High),
        ("Compliance", Medium),
        ("Customer Service", Medium),
        ("IT Security", Medium),
        ("HR", Low),
        ("Marketing", Low),
        ("Product Management", Low),
    ]
    .into_iter()
    .map(|(name, tier)| (name.to_string(), tier))
    .collect()
}
