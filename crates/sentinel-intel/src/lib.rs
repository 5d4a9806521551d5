//! Threat Intelligence
//!
//! Optional reputation lookups for request domains that are neither
//! sanctioned nor known AI services. A lookup never fails from the
//! caller's point of view: any transport or decoding problem degrades to
//! a negative verdict with `lookup unavailable` evidence.

#![warn(missing_docs)]

pub mod virustotal;

pub use virustotal::{VirusTotalClient, VtAnalysisStats};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Evidence text used whenever a lookup could not complete
pub const LOOKUP_UNAVAILABLE: &str = "lookup unavailable";

/// Reputation verdict for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatVerdict {
    /// Positive (malicious) verdict
    pub is_malicious: bool,
    /// Evidence text
    pub evidence: String,
}

impl ThreatVerdict {
    /// Negative verdict for a failed lookup
    pub fn unavailable() -> Self {
        Self {
            is_malicious: false,
            evidence: LOOKUP_UNAVAILABLE.to_string(),
        }
    }

    /// Verdict from vendor detection counts.
    ///
    /// Positive when any vendor says malicious or more than three say
    /// suspicious.
    pub fn from_counts(malicious: u32, suspicious: u32) -> Self {
        Self {
            is_malicious: malicious > 0 || suspicious > 3,
            evidence: format!("Vendors: {} malicious, {} suspicious", malicious, suspicious),
        }
    }
}

/// Intel lookup errors (internal to clients, never surfaced by `lookup`)
#[derive(Error, Debug)]
pub enum IntelError {
    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Malformed body
    #[error("parse error: {0}")]
    Parse(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,
}

impl From<reqwest::Error> for IntelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Domain reputation source
#[async_trait]
pub trait ThreatIntelClient: Send + Sync {
    /// Look up a domain; never fails
    async fn lookup(&self, domain: &str) -> ThreatVerdict;
}

/// Threat intelligence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatIntelConfig {
    /// VirusTotal API key; lookups are disabled without one
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum cached verdicts
    pub cache_capacity: u64,
    /// Seconds a cached verdict stays valid
    pub cache_ttl_secs: u64,
}

impl Default for ThreatIntelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: virustotal::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            cache_capacity: virustotal::DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: virustotal::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl ThreatIntelConfig {
    /// Whether a client should be built
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    }
}

/// Fixed verdict table used as a test double
#[derive(Debug, Clone, Default)]
pub struct StaticIntelClient {
    verdicts: HashMap<String, ThreatVerdict>,
}

impl StaticIntelClient {
    /// Empty table: every domain is clean
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verdict for a domain
    pub fn with_verdict(mut self, domain: impl Into<String>, verdict: ThreatVerdict) -> Self {
        self.verdicts.insert(domain.into().to_ascii_lowercase(), verdict);
        self
    }
}

#[async_trait]
impl ThreatIntelClient for StaticIntelClient {
    async fn lookup(&self, domain: &str) -> ThreatVerdict {
        self.verdicts
            .get(&domain.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| ThreatVerdict::from_counts(0, 0))
    }
}
