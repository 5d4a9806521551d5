//! Network request log records and pre-screen fact sheets

use crate::policy::SensitivityTier;
use crate::{UNKNOWN_DEPARTMENT, UNKNOWN_USER};
use serde::{Deserialize, Serialize};

/// Payload size (KB) above which a request counts as a potential data dump
pub const LARGE_PAYLOAD_KB: f64 = 100.0;

/// One observed network request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Observation time as reported by the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// User identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Department of the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Requested URL
    pub request_url: String,
    /// Payload text snippet
    #[serde(default)]
    pub payload_snippet: String,
    /// Payload size in KB
    #[serde(default)]
    pub payload_size_kb: f64,
    /// Source IP address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Pre-screen enrichment, attached before deep analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_analysis: Option<PreAnalysis>,
    /// Approval flag, attached before deep analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
}

impl LogEntry {
    /// Create an entry for a URL
    pub fn new(request_url: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            user_id: None,
            department: None,
            request_url: request_url.into(),
            payload_snippet: String::new(),
            payload_size_kb: 0.0,
            ip_address: None,
            pre_analysis: None,
            is_approved: None,
        }
    }

    /// Set the payload snippet
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload_snippet = payload.into();
        self
    }

    /// Set the payload size in KB
    pub fn with_size_kb(mut self, size_kb: f64) -> Self {
        self.payload_size_kb = size_kb;
        self
    }

    /// Set the user identifier
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the department
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Set the source IP
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// User identifier or `Unknown`
    pub fn user_or_unknown(&self) -> &str {
        self.user_id.as_deref().unwrap_or(UNKNOWN_USER)
    }

    /// Department or `Unknown`
    pub fn department_or_unknown(&self) -> &str {
        self.department.as_deref().unwrap_or(UNKNOWN_DEPARTMENT)
    }

    /// Request domain, lowercased
    pub fn domain(&self) -> String {
        extract_domain(&self.request_url)
    }

    /// Whether the payload exceeds [`LARGE_PAYLOAD_KB`]
    #[inline]
    pub fn is_large_payload(&self) -> bool {
        self.payload_size_kb > LARGE_PAYLOAD_KB
    }

    /// Attach the pre-screen fact sheet and approval flag.
    ///
    /// This is the only mutation a log entry goes through.
    pub fn annotate(&mut self, pre: PreAnalysis) {
        self.is_approved = Some(pre.is_approved);
        self.pre_analysis = Some(pre);
    }
}

/// Derived facts for one log entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreAnalysis {
    /// Request domain the checks ran against
    pub domain: String,
    /// Domain contains an approved-domain entry
    pub is_approved: bool,
    /// Domain contains an external AI service entry
    pub is_external_ai: bool,
    /// Domain contains a known-malicious entry
    pub is_known_malicious: bool,
    /// Threat intelligence returned a positive verdict
    pub threat_intel_flagged: bool,
    /// Threat intelligence evidence text (empty when not consulted)
    #[serde(default)]
    pub threat_intel_evidence: String,
    /// Sensitive data labels found in the payload
    #[serde(default)]
    pub detected_sensitive_data: Vec<String>,
    /// Sensitivity tier of the requesting department
    #[serde(default)]
    pub department_sensitivity: SensitivityTier,
    /// Unsanctioned destination (informational only)
    #[serde(default)]
    pub policy_violation: bool,
}

impl PreAnalysis {
    /// Malicious-list hit or threat intel hit
    #[inline]
    pub fn is_confirmed_threat(&self) -> bool {
        self.is_known_malicious || self.threat_intel_flagged
    }

    /// Any sensitive data label detected
    #[inline]
    pub fn has_sensitive_data(&self) -> bool {
        !self.detected_sensitive_data.is_empty()
    }
}

/// Extract the lowercased host of a URL.
///
/// Scheme-less inputs are retried with an `https://` prefix; anything that
/// still does not parse falls back to the lowercased raw string.
pub fn extract_domain(raw: &str) -> String {
    let raw = raw.trim();
    let parsed = url::Url::parse(raw).ok().filter(|u| u.host_str().is_some()).or_else(|| {
        if raw.contains("://") {
            None
        } else {
            url::Url::parse(&format!("https://{}", raw)).ok()
        }
    });

    parsed
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_else(|| raw.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://chat.openai.com/c/123"), "chat.openai.com");
        assert_eq!(extract_domain("https://Claude.AI:443/chat"), "claude.ai");
        assert_eq!(extract_domain("api.anthropic.com/v1/messages"), "api.anthropic.com");
        assert_eq!(extract_domain(""), "");
        assert_eq!(extract_domain("Not A Host"), "not a host");
    }

    #[test]
    fn test_deserialize_minimal_entry() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"request_url": "https://claude.ai", "payload_snippet": "hi"}"#,
        )
        .unwrap();
        assert_eq!(entry.user_or_unknown(), "Unknown");
        assert_eq!(entry.department_or_unknown(), "Unknown");
        assert_eq!(entry.payload_size_kb, 0.0);
        assert!(entry.pre_analysis.is_none());
    }

    #[test]
    fn test_large_payload_threshold() {
        assert!(!LogEntry::new("https://x").with_size_kb(100.0).is_large_payload());
        assert!(LogEntry::new("https://x").with_size_kb(100.5).is_large_payload());
    }

    #[test]
    fn test_annotate_sets_flag() {
        let mut entry = LogEntry::new("https://approved-partner.com");
        entry.annotate(PreAnalysis {
            is_approved: true,
            ..Default::default()
        });
        assert_eq!(entry.is_approved, Some(true));
        assert!(entry.pre_analysis.is_some());
    }

    #[test]
    fn test_confirmed_threat() {
        let pre = PreAnalysis {
            threat_intel_flagged: true,
            ..Default::default()
        };
        assert!(pre.is_confirmed_threat());
        assert!(!PreAnalysis::default().is_confirmed_threat());
    }
}
