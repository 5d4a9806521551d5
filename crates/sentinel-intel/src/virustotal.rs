//! VirusTotal v3 domain reputation client

use crate::{IntelError, ThreatIntelClient, ThreatIntelConfig, ThreatVerdict};
use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Public API endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.virustotal.com/api/v3";
/// Default number of cached verdicts
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
/// Default verdict lifetime (1 hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// VirusTotal API client with a bounded, expiring verdict cache
pub struct VirusTotalClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, ThreatVerdict>,
}

impl VirusTotalClient {
    /// Create a client with the given key and request timeout
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, IntelError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    /// Create a client against a custom endpoint
    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, IntelError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IntelError::Network(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: verdict_cache(
                DEFAULT_CACHE_CAPACITY,
                Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            ),
        })
    }

    /// Replace the verdict cache with one of the given size and lifetime
    pub fn with_cache(mut self, capacity: u64, ttl: Duration) -> Self {
        self.cache = verdict_cache(capacity, ttl);
        self
    }

    /// Build from configuration; `None` when no key is set
    pub fn from_config(config: &ThreatIntelConfig) -> Result<Option<Self>, IntelError> {
        match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let client = Self::with_base_url(
                    key,
                    &config.base_url,
                    Duration::from_secs(config.timeout_secs),
                )?
                .with_cache(
                    config.cache_capacity,
                    Duration::from_secs(config.cache_ttl_secs),
                );
                Ok(Some(client))
            }
            _ => Ok(None),
        }
    }

    /// Fetch the analysis stats of a domain
    pub async fn lookup_domain(&self, domain: &str) -> Result<VtAnalysisStats, IntelError> {
        let url = format!("{}/domains/{}", self.base_url, domain);

        let resp = self
            .client
            .get(&url)
            .header("x-apikey", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IntelError::HttpError(status.as_u16()));
        }

        let body = resp.text().await?;
        parse_domain_report(&body)
    }
}

fn verdict_cache(capacity: u64, ttl: Duration) -> Cache<String, ThreatVerdict> {
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(ttl)
        .build()
}

#[async_trait]
impl ThreatIntelClient for VirusTotalClient {
    async fn lookup(&self, domain: &str) -> ThreatVerdict {
        let key = domain.to_ascii_lowercase();
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        // Failures are not cached so the next request retries
        match self.lookup_domain(&key).await {
            Ok(stats) => {
                let verdict = ThreatVerdict::from_counts(stats.malicious, stats.suspicious);
                debug!(domain = %key, malicious = verdict.is_malicious, "Reputation lookup complete");
                self.cache.insert(key, verdict.clone()).await;
                verdict
            }
            Err(e) => {
                warn!(domain = %key, error = %e, "Reputation lookup failed");
                ThreatVerdict::unavailable()
            }
        }
    }
}

/// Parse a `/domains/{domain}` response body
pub fn parse_domain_report(body: &str) -> Result<VtAnalysisStats, IntelError> {
    let report: VtDomainReport =
        serde_json::from_str(body).map_err(|e| IntelError::Parse(e.to_string()))?;
    Ok(report.data.attributes.last_analysis_stats)
}

#[derive(Debug, Clone, Deserialize)]
struct VtDomainReport {
    data: VtDomainData,
}

#[derive(Debug, Clone, Deserialize)]
struct VtDomainData {
    attributes: VtDomainAttributes,
}

#[derive(Debug, Clone, Deserialize)]
struct VtDomainAttributes {
    last_analysis_stats: VtAnalysisStats,
}

/// Vendor detection counts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VtAnalysisStats {
    /// Vendors flagging malicious
    #[serde(default)]
    pub malicious: u32,
    /// Vendors flagging suspicious
    #[serde(default)]
    pub suspicious: u32,
    /// Vendors reporting harmless
    #[serde(default)]
    pub harmless: u32,
    /// Vendors with no detection
    #[serde(default)]
    pub undetected: u32,
}
