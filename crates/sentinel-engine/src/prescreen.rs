//! Pre-screen classifier
//!
//! Cheap checks run before any reasoning call: domain policy lookups, an
//! optional reputation lookup and the sensitive-data scan.

use sentinel_common::{LogEntry, PolicyStore, PreAnalysis};
use sentinel_dlp::SensitiveDataScanner;
use sentinel_intel::ThreatIntelClient;
use std::sync::Arc;
use tracing::debug;

/// Builds the [`PreAnalysis`] fact sheet for one request
#[derive(Clone)]
pub struct PreScreener {
    policy: Arc<PolicyStore>,
    scanner: Arc<SensitiveDataScanner>,
    intel: Option<Arc<dyn ThreatIntelClient>>,
}

impl PreScreener {
    /// Create without threat intelligence
    pub fn new(policy: Arc<PolicyStore>, scanner: Arc<SensitiveDataScanner>) -> Self {
        Self {
            policy,
            scanner,
            intel: None,
        }
    }

    /// Attach a threat intelligence client
    pub fn with_intel(mut self, intel: Arc<dyn ThreatIntelClient>) -> Self {
        self.intel = Some(intel);
        self
    }

    /// Policy store in use
    pub fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    /// Scanner in use
    pub fn scanner(&self) -> &SensitiveDataScanner {
        &self.scanner
    }

    /// Full pre-screen, including the reputation lookup when eligible
    pub async fn prescreen(&self, log: &LogEntry) -> PreAnalysis {
        let mut pre = self.screen_local(log);

        if let Some(intel) = self.intel_for(&pre) {
            let verdict = intel.lookup(&pre.domain).await;
            pre.threat_intel_flagged = verdict.is_malicious;
            pre.threat_intel_evidence = verdict.evidence;
            pre.policy_violation |= verdict.is_malicious;
        }

        debug!(
            domain = %pre.domain,
            approved = pre.is_approved,
            external_ai = pre.is_external_ai,
            malicious = pre.is_known_malicious,
            intel_flagged = pre.threat_intel_flagged,
            sensitive = ?pre.detected_sensitive_data,
            "Pre-screen complete"
        );
        pre
    }

    /// Policy lookups and payload scan only; no I/O
    pub fn screen_local(&self, log: &LogEntry) -> PreAnalysis {
        let domain = log.domain();
        let is_approved = self.policy.is_approved(&domain);
        let is_external_ai = self.policy.is_external_ai(&domain);
        let is_known_malicious = self.policy.is_known_malicious(&domain);

        PreAnalysis {
            is_approved,
            is_external_ai,
            is_known_malicious,
            threat_intel_flagged: false,
            threat_intel_evidence: String::new(),
            detected_sensitive_data: self.scanner.scan(&log.payload_snippet),
            department_sensitivity: self.policy.department_sensitivity(log.department.as_deref()),
            policy_violation: !is_approved && (is_external_ai || is_known_malicious),
            domain,
        }
    }

    /// Intel client, when configured and the domain is neither approved nor a known AI service
    fn intel_for(&self, pre: &PreAnalysis) -> Option<&Arc<dyn ThreatIntelClient>> {
        if pre.is_approved || pre.is_external_ai || pre.domain.is_empty() {
            return None;
        }
        self.intel.as_ref()
    }
}
