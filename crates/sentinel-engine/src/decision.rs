//! Risk decision engine
//!
//! Priority order, first match wins:
//!
//! 1. approved domain, nothing sensitive: fast-track APPROVED
//! 2. agentic mode and anything notable: agentic workflow
//! 3. known-malicious domain: CRITICAL (policy violation)
//! 4. threat intel hit: CRITICAL (threat intel)
//! 5. external AI, sensitive data or large payload: model analysis
//! 6. otherwise: LOW_RISK

use crate::backend::{build_backend, ReasoningBackend, UnavailableBackend};
use crate::config::SentinelConfig;
use crate::prescreen::PreScreener;
use crate::prompt::{request_context, system_prompt};
use crate::verdict::{parse_verdict, FALLBACK_SCORE, MANUAL_REVIEW};
use crate::workflow::{run_workflow, WorkflowContext};
use crate::EngineError;
use sentinel_common::{AnalysisMethod, AnalysisResult, LogEntry, PolicyStore, PreAnalysis, RiskCategory};
use sentinel_dlp::SensitiveDataScanner;
use sentinel_intel::{ThreatIntelClient, VirusTotalClient};
use sentinel_soc::{AlertBroadcaster, MitigationDispatcher, NotificationConfig, WebhookDispatcher};
use std::sync::Arc;
use tracing::{info, warn};

/// Score assigned on the fast-track path
pub const FAST_TRACK_SCORE: u8 = 5;
/// Score assigned to known-malicious domains
pub const POLICY_VIOLATION_SCORE: u8 = 95;
/// Score assigned to threat intel hits
pub const THREAT_INTEL_SCORE: u8 = 100;
/// Score assigned by the default rule
pub const DEFAULT_SCORE: u8 = 25;

/// Per-request risk decision engine
pub struct RiskEngine {
    screener: PreScreener,
    backend: Arc<dyn ReasoningBackend>,
    dispatcher: Arc<dyn MitigationDispatcher>,
    broadcaster: AlertBroadcaster,
}

impl RiskEngine {
    /// Engine with no backend, no intel, log-only mitigation and alerts
    pub fn new(policy: Arc<PolicyStore>) -> Result<Self, EngineError> {
        let scanner = Arc::new(SensitiveDataScanner::from_policy(&policy)?);
        Ok(Self {
            screener: PreScreener::new(policy, scanner),
            backend: Arc::new(UnavailableBackend::new("none")),
            dispatcher: Arc::new(WebhookDispatcher::new(Default::default())?),
            broadcaster: AlertBroadcaster::from_config(&NotificationConfig::default())?,
        })
    }

    /// Build every collaborator from configuration
    pub fn from_config(config: &SentinelConfig) -> Result<Self, EngineError> {
        let policy = Arc::new(PolicyStore::from_config(config.policy.clone())?);
        let mut engine = Self::new(policy)?
            .with_backend(build_backend(&config.backend)?)
            .with_dispatcher(Arc::new(WebhookDispatcher::new(config.mitigation.clone())?))
            .with_broadcaster(AlertBroadcaster::from_config(&config.notifications)?);

        if let Some(client) = VirusTotalClient::from_config(&config.threat_intel)? {
            info!("Threat intelligence lookups enabled");
            engine = engine.with_intel(Arc::new(client));
        }

        Ok(engine)
    }

    /// Replace the reasoning backend
    pub fn with_backend(mut self, backend: Arc<dyn ReasoningBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Attach a threat intelligence client
    pub fn with_intel(mut self, intel: Arc<dyn ThreatIntelClient>) -> Self {
        self.screener = self.screener.with_intel(intel);
        self
    }

    /// Replace the mitigation dispatcher
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn MitigationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replace the alert broadcaster
    pub fn with_broadcaster(mut self, broadcaster: AlertBroadcaster) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    /// Policy store in use
    pub fn policy(&self) -> &PolicyStore {
        self.screener.policy()
    }

    /// Pre-screen classifier in use
    pub fn screener(&self) -> &PreScreener {
        &self.screener
    }

    /// Name of the reasoning backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Analyze one request
    pub async fn analyze(&self, log: LogEntry, agentic: bool) -> AnalysisResult {
        let mut log = log;
        let pre = self.screener.prescreen(&log).await;
        log.annotate(pre.clone());

        let suspicious = pre.is_external_ai || pre.has_sensitive_data() || log.is_large_payload();

        if pre.is_approved && !pre.has_sensitive_data() {
            return decided(
                AnalysisResult::new(log, RiskCategory::Approved, FAST_TRACK_SCORE, AnalysisMethod::RuleBased)
                    .with_reasoning("Request to approved internal AI platform with no sensitive data detected")
                    .with_sensitive_data(pre.detected_sensitive_data),
            );
        }

        if agentic && (pre.is_confirmed_threat() || suspicious) {
            let ctx = WorkflowContext {
                policy: self.policy(),
                backend: self.backend.as_ref(),
                dispatcher: self.dispatcher.as_ref(),
                broadcaster: &self.broadcaster,
            };
            return run_workflow(&ctx, log).await;
        }

        if pre.is_known_malicious {
            return decided(
                AnalysisResult::new(log, RiskCategory::Critical, POLICY_VIOLATION_SCORE, AnalysisMethod::PolicyViolation)
                    .with_reasoning(format!("Requested domain '{}' is in the known malicious list.", pre.domain))
                    .with_sensitive_data(pre.detected_sensitive_data)
                    .with_action("Block access")
                    .with_user_message("ACCESS BLOCKED: Known malicious site."),
            );
        }

        if pre.threat_intel_flagged {
            return decided(
                AnalysisResult::new(log, RiskCategory::Critical, THREAT_INTEL_SCORE, AnalysisMethod::ThreatIntel)
                    .with_reasoning(format!(
                        "Threat intelligence flagged '{}' as malicious ({}).",
                        pre.domain, pre.threat_intel_evidence
                    ))
                    .with_sensitive_data(pre.detected_sensitive_data)
                    .with_action("Immediate disconnect")
                    .with_user_message("CRITICAL ALERT: Malicious activity detected."),
            );
        }

        if suspicious {
            return self.model_analysis(log, &pre).await;
        }

        decided(
            AnalysisResult::new(log, RiskCategory::LowRisk, DEFAULT_SCORE, AnalysisMethod::RuleBased)
                .with_reasoning("Non-AI endpoint with minimal data")
                .with_sensitive_data(pre.detected_sensitive_data),
        )
    }

    /// Single backend call; any failure yields the conservative fallback
    async fn model_analysis(&self, log: LogEntry, pre: &PreAnalysis) -> AnalysisResult {
        let system = system_prompt(self.screener.policy());
        let user = request_context(&log, pre);

        let outcome = match self.backend.invoke(&system, &user).await {
            Ok(raw) => parse_verdict(&raw).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(verdict) => {
                let sensitive = verdict
                    .detected_sensitive_data
                    .unwrap_or_else(|| pre.detected_sensitive_data.clone());
                let mut result = AnalysisResult::new(
                    log,
                    verdict.risk_category,
                    verdict.risk_score,
                    AnalysisMethod::ModelAnalysis,
                )
                .with_reasoning(verdict.reasoning)
                .with_action(verdict.recommended_action)
                .with_sensitive_data(sensitive);
                result.user_message = verdict.user_message;
                decided(result)
            }
            Err(error) => {
                warn!(backend = self.backend.name(), error = %error, "Model analysis failed");
                decided(
                    AnalysisResult::new(log, RiskCategory::MediumRisk, FALLBACK_SCORE, AnalysisMethod::Fallback)
                        .with_reasoning(format!(
                            "{} analysis failed: {}. Applying conservative risk assessment.",
                            self.backend.name().to_uppercase(),
                            error
                        ))
                        .with_sensitive_data(pre.detected_sensitive_data.clone())
                        .with_action(MANUAL_REVIEW)
                        .with_error(error),
                )
            }
        }
    }
}

fn decided(result: AnalysisResult) -> AnalysisResult {
    info!(
        url = %result.log_entry.request_url,
        risk = %result.risk_category,
        score = result.risk_score,
        method = %result.analysis_method,
        "Request analyzed"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, ScriptedBackend};
    use sentinel_intel::{StaticIntelClient, ThreatVerdict};
    use sentinel_soc::RecordingDispatcher;

    fn engine() -> RiskEngine {
        RiskEngine::new(Arc::new(PolicyStore::builtin().unwrap())).unwrap()
    }

    fn malicious_log() -> LogEntry {
        LogEntry::new("https://evil-phishing-site.com/login")
            .with_payload("ok")
            .with_user("mallory")
            .with_ip("192.168.1.50")
    }

    #[tokio::test]
    async fn test_fast_track_approved() {
        for agentic in [false, true] {
            let log = LogEntry::new("https://internal-ai.company.local/x").with_payload("hello");
            let result = engine().analyze(log, agentic).await;
            assert_eq!(result.risk_category, RiskCategory::Approved);
            assert_eq!(result.risk_score, 5);
            assert_eq!(result.analysis_method, AnalysisMethod::RuleBased);
            assert_eq!(result.recommended_action, "Allow");
            assert_eq!(result.log_entry.is_approved, Some(true));
        }
    }

    #[tokio::test]
    async fn test_external_ai_iban_backend_down() {
        let log = LogEntry::new("https://chat.openai.com").with_payload("IBAN: NL91ABNA0417164300");
        let result = engine().analyze(log, false).await;

        assert!(result.detected_sensitive_data.contains(&"iban".to_string()));
        assert_eq!(result.risk_category, RiskCategory::MediumRisk);
        assert_eq!(result.risk_score, 50);
        assert_eq!(result.analysis_method, AnalysisMethod::Fallback);
        assert_eq!(result.recommended_action, "Manual review required");
        assert_eq!(result.error.as_deref(), Some("backend unavailable"));
        assert!(result.reasoning.starts_with("NONE analysis failed: backend unavailable"));
    }

    #[tokio::test]
    async fn test_known_malicious_rule() {
        let result = engine().analyze(malicious_log(), false).await;
        assert_eq!(result.risk_category, RiskCategory::Critical);
        assert_eq!(result.risk_score, 95);
        assert_eq!(result.analysis_method, AnalysisMethod::PolicyViolation);
        assert_eq!(result.recommended_action, "Block access");
        assert_eq!(result.user_message.as_deref(), Some("ACCESS BLOCKED: Known malicious site."));
        assert!(result.mitigation_actions.is_none());
    }

    #[tokio::test]
    async fn test_known_malicious_agentic() {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let engine = engine().with_dispatcher(dispatcher.clone());
        let result = engine.analyze(malicious_log(), true).await;

        assert_eq!(result.risk_category, RiskCategory::Critical);
        assert!(result.risk_score >= 95);
        assert_eq!(result.analysis_method.as_tag(), "agentic_none");
        let actions = result.mitigation_actions.unwrap();
        assert!(actions.contains(&"Firewall: Blocked IP 192.168.1.50".to_string()));
        assert!(actions.contains(&"SOC: Created security incident for mallory".to_string()));
        assert_eq!(dispatcher.events().len(), 2);
    }

    #[tokio::test]
    async fn test_threat_intel_rule() {
        let intel = StaticIntelClient::new().with_verdict("shady.example", ThreatVerdict::from_counts(3, 1));
        let engine = engine().with_intel(Arc::new(intel));
        let result = engine
            .analyze(LogEntry::new("https://shady.example/drop").with_payload("acct 123456789"), false)
            .await;

        assert_eq!(result.risk_category, RiskCategory::Critical);
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.analysis_method, AnalysisMethod::ThreatIntel);
        assert_eq!(result.recommended_action, "Immediate disconnect");
        assert!(result.reasoning.contains("Vendors: 3 malicious, 1 suspicious"));
    }

    #[tokio::test]
    async fn test_rule_paths_carry_scanner_output() {
        let engine = engine();
        let payloads = ["ok", "call 555-1234-567", "NL91ABNA0417164300 and 12345678"];
        for payload in payloads {
            let expected = engine.screener().scanner().scan(payload);
            let result = engine
                .analyze(LogEntry::new("https://evil-phishing-site.com").with_payload(payload), false)
                .await;
            assert_eq!(result.detected_sensitive_data, expected);
        }
    }

    #[tokio::test]
    async fn test_model_analysis_verbatim() {
        let backend = Arc::new(ScriptedBackend::always(
            "openai",
            r#"{"risk_category": "HIGH_RISK", "risk_score": 78, "reasoning": "client data", "recommended_action": "Block", "user_message": "Use the internal assistant"}"#,
        ));
        let engine = engine().with_backend(backend.clone());
        let log = LogEntry::new("https://claude.ai/chat")
            .with_payload("customer jane@corp.com")
            .with_department("HR");
        let result = engine.analyze(log, false).await;

        assert_eq!(result.risk_category, RiskCategory::HighRisk);
        assert_eq!(result.risk_score, 78);
        assert_eq!(result.analysis_method, AnalysisMethod::ModelAnalysis);
        assert_eq!(result.recommended_action, "Block");
        assert_eq!(result.user_message.as_deref(), Some("Use the internal assistant"));
        assert_eq!(result.detected_sensitive_data, vec!["email".to_string()]);

        let (_, user) = &backend.calls()[0];
        assert!(user.contains("(Risk Level: low_sensitivity)"));
    }

    #[tokio::test]
    async fn test_model_timeout_falls_back() {
        let backend = ScriptedBackend::new("ollama");
        backend.push(Err(BackendError::Timeout));
        let engine = engine().with_backend(Arc::new(backend));
        let result = engine
            .analyze(LogEntry::new("https://example.org").with_size_kb(512.0), false)
            .await;
        assert_eq!(result.analysis_method, AnalysisMethod::Fallback);
        assert!(result.reasoning.starts_with("OLLAMA analysis failed: request timed out"));
    }

    #[tokio::test]
    async fn test_default_low_risk() {
        let result = engine()
            .analyze(LogEntry::new("https://docs.rs/tokio").with_payload("how to spawn"), false)
            .await;
        assert_eq!(result.risk_category, RiskCategory::LowRisk);
        assert_eq!(result.risk_score, 25);
        assert_eq!(result.recommended_action, "Monitor");
        assert!(result.detected_sensitive_data.is_empty());
    }

    #[tokio::test]
    async fn test_agentic_plain_request_uses_default() {
        let backend = Arc::new(ScriptedBackend::new("mock"));
        let engine = engine().with_backend(backend.clone());
        let result = engine.analyze(LogEntry::new("https://docs.rs"), true).await;
        assert_eq!(result.risk_category, RiskCategory::LowRisk);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_override_regardless_of_backend_output() {
        let outputs = [
            r#"{"risk_category": "APPROVED", "risk_score": 0}"#,
            "```json\n{\"risk_category\": \"LOW_RISK\", \"risk_score\": 30}\n```",
            "garbage",
            "{\"risk_category\": \"CRITICAL\", \"risk_score\": 100}",
        ];
        for output in outputs {
            let engine = engine()
                .with_backend(Arc::new(ScriptedBackend::always("mock", output)))
                .with_dispatcher(Arc::new(RecordingDispatcher::new()));
            let result = engine.analyze(malicious_log(), true).await;
            assert_eq!(result.risk_category, RiskCategory::Critical);
            assert!(result.risk_score >= 95);
            assert!(result.reasoning.starts_with("[DETERMINISTIC]"));
        }
    }
}
