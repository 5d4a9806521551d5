//! Analysis result record

use crate::log::LogEntry;
use crate::risk::RiskCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores strictly above this count as threats in analytics
pub const THREAT_SCORE_THRESHOLD: u8 = 40;

/// How a verdict was reached
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AnalysisMethod {
    /// Deterministic rule (fast-track or default)
    RuleBased,
    /// Known-malicious domain list hit
    PolicyViolation,
    /// Threat intelligence hit
    ThreatIntel,
    /// Single reasoning-backend call
    ModelAnalysis,
    /// Agentic workflow, tagged with the backend name
    Agentic(String),
    /// Conservative verdict after a backend failure
    Fallback,
}

impl AnalysisMethod {
    /// Wire tag
    pub fn as_tag(&self) -> String {
        match self {
            Self::RuleBased => "rule_based".to_string(),
            Self::PolicyViolation => "policy_violation".to_string(),
            Self::ThreatIntel => "threat_intel".to_string(),
            Self::ModelAnalysis => "model_analysis".to_string(),
            Self::Agentic(backend) => format!("agentic_{}", backend),
            Self::Fallback => "fallback".to_string(),
        }
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_tag())
    }
}

impl From<AnalysisMethod> for String {
    fn from(method: AnalysisMethod) -> Self {
        method.as_tag()
    }
}

impl From<String> for AnalysisMethod {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "rule_based" => Self::RuleBased,
            "policy_violation" => Self::PolicyViolation,
            "threat_intel" => Self::ThreatIntel,
            "model_analysis" => Self::ModelAnalysis,
            "fallback" => Self::Fallback,
            other => match other.strip_prefix("agentic_") {
                Some(backend) => Self::Agentic(backend.to_string()),
                None => Self::Fallback,
            },
        }
    }
}

/// Output record, one per log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Source request (annotated with its pre-analysis)
    pub log_entry: LogEntry,
    /// Risk category
    pub risk_category: RiskCategory,
    /// Score 0-100
    pub risk_score: u8,
    /// Free-text reasoning
    pub reasoning: String,
    /// Sensitive data labels
    #[serde(default)]
    pub detected_sensitive_data: Vec<String>,
    /// Recommended action
    pub recommended_action: String,
    /// Message shown to the user
    #[serde(default)]
    pub user_message: Option<String>,
    /// Method tag
    pub analysis_method: AnalysisMethod,
    /// Workflow steps executed, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_steps: Option<Vec<String>>,
    /// Mitigation actions taken, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_actions: Option<Vec<String>>,
    /// Error text for fallback verdicts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Create a result with the category's default action
    pub fn new(
        log_entry: LogEntry,
        risk_category: RiskCategory,
        risk_score: u8,
        analysis_method: AnalysisMethod,
    ) -> Self {
        Self {
            log_entry,
            risk_category,
            risk_score: risk_score.min(100),
            reasoning: String::new(),
            detected_sensitive_data: Vec::new(),
            recommended_action: risk_category.default_action().to_string(),
            user_message: None,
            analysis_method,
            agent_steps: None,
            mitigation_actions: None,
            error: None,
        }
    }

    /// Set reasoning
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Set recommended action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    /// Set user-facing message
    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    /// Set sensitive data labels
    pub fn with_sensitive_data(mut self, labels: Vec<String>) -> Self {
        self.detected_sensitive_data = labels;
        self
    }

    /// Set error text
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Score above [`THREAT_SCORE_THRESHOLD`]
    #[inline]
    pub fn is_threat(&self) -> bool {
        self.risk_score > THREAT_SCORE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tags_roundtrip() {
        for method in [
            AnalysisMethod::RuleBased,
            AnalysisMethod::PolicyViolation,
            AnalysisMethod::ThreatIntel,
            AnalysisMethod::ModelAnalysis,
            AnalysisMethod::Agentic("ollama".into()),
            AnalysisMethod::Fallback,
        ] {
            let tag = method.as_tag();
            assert_eq!(AnalysisMethod::from(tag), method);
        }
        assert_eq!(AnalysisMethod::Agentic("openai".into()).as_tag(), "agentic_openai");
    }

    #[test]
    fn test_new_uses_default_action() {
        let result = AnalysisResult::new(
            LogEntry::new("https://example.com"),
            RiskCategory::LowRisk,
            25,
            AnalysisMethod::RuleBased,
        );
        assert_eq!(result.recommended_action, "Monitor");
        assert!(result.risk_category.band().contains(result.risk_score));
        assert!(!result.is_threat());
    }

    #[test]
    fn test_score_clamped() {
        let result = AnalysisResult::new(
            LogEntry::new("https://example.com"),
            RiskCategory::Critical,
            250,
            AnalysisMethod::ThreatIntel,
        );
        assert_eq!(result.risk_score, 100);
    }

    #[test]
    fn test_serialized_shape() {
        let result = AnalysisResult::new(
            LogEntry::new("https://example.com"),
            RiskCategory::MediumRisk,
            50,
            AnalysisMethod::Fallback,
        )
        .with_error("timeout");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["risk_category"], "MEDIUM_RISK");
        assert_eq!(value["analysis_method"], "fallback");
        assert_eq!(value["error"], "timeout");
        assert!(value.get("agent_steps").is_none());
    }
}
