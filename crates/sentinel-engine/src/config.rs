//! Pipeline configuration

use crate::backend::{BackendConfig, Provider};
use sentinel_common::{PolicyConfig, SentinelError, SentinelResult};
use sentinel_intel::ThreatIntelConfig;
use sentinel_soc::{MitigationConfig, NotificationConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Engine behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run the agentic workflow by default
    pub agentic: bool,
    /// Concurrent requests per batch
    pub concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            agentic: false,
            concurrency: 4,
        }
    }
}

/// Complete configuration, one TOML section per collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Domain lists, patterns and departments
    pub policy: PolicyConfig,
    /// Reasoning backend
    pub backend: BackendConfig,
    /// Threat intelligence
    pub threat_intel: ThreatIntelConfig,
    /// Mitigation webhook
    pub mitigation: MitigationConfig,
    /// Alert channels
    pub notifications: NotificationConfig,
    /// Engine behaviour
    pub engine: EngineConfig,
}

impl SentinelConfig {
    /// Parse TOML
    pub fn from_toml_str(raw: &str) -> SentinelResult<Self> {
        toml::from_str(raw).map_err(|e| SentinelError::ConfigError(e.to_string()))
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> SentinelResult<String> {
        toml::to_string_pretty(self).map_err(|e| SentinelError::ConfigError(e.to_string()))
    }

    /// Apply overrides from a variable lookup; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        self.policy.apply_overrides(&lookup);

        if let Some(raw) = get("LLM_PROVIDER") {
            match raw.parse::<Provider>() {
                Ok(provider) => self.backend.provider = provider,
                Err(e) => warn!(error = %e, "Ignoring LLM_PROVIDER"),
            }
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.backend.openai_model = model;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.backend.ollama_model = model;
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.backend.ollama_base_url = url;
        }
        if let Some(key) = get("VIRUSTOTAL_API_KEY") {
            self.threat_intel.api_key = Some(key);
        }
        if let Some(url) = get("MITIGATION_WEBHOOK_URL") {
            self.mitigation.webhook_url = Some(url);
        }
        if let Some(url) = get("SLACK_WEBHOOK_URL") {
            self.notifications.slack_webhook_url = Some(url);
        }
        if let Some(url) = get("TEAMS_WEBHOOK_URL") {
            self.notifications.teams_webhook_url = Some(url);
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_is_default() {
        let config = SentinelConfig::from_toml_str("").unwrap();
        assert_eq!(config, SentinelConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = SentinelConfig::from_toml_str(
            r#"
            [backend]
            provider = "ollama"
            ollama_model = "llama3.1"

            [engine]
            agentic = true

            [policy]
            approved_domains = ["copilot.corp.example"]
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.provider, Provider::Ollama);
        assert_eq!(config.backend.ollama_model, "llama3.1");
        assert_eq!(config.backend.openai_model, "gpt-4o-mini");
        assert!(config.engine.agentic);
        assert_eq!(config.engine.concurrency, 4);
        assert_eq!(config.policy.approved_domains, vec!["copilot.corp.example"]);
        assert!(!config.policy.external_ai_services.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            SentinelConfig::from_toml_str("[engine]\nconcurrency = \"many\""),
            Err(SentinelError::ConfigError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("APPROVED_DOMAINS", "a.corp, b.corp"),
            ("LLM_PROVIDER", "ollama"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("VIRUSTOTAL_API_KEY", "vt"),
            ("SLACK_WEBHOOK_URL", "https://hooks.slack.test/1"),
            ("OPENAI_API_KEY", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = SentinelConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.policy.approved_domains, vec!["a.corp", "b.corp"]);
        assert_eq!(config.backend.provider, Provider::Ollama);
        assert_eq!(config.backend.ollama_base_url, "http://gpu-box:11434");
        assert!(config.threat_intel.is_enabled());
        assert_eq!(
            config.notifications.slack_webhook_url.as_deref(),
            Some("https://hooks.slack.test/1")
        );
        assert!(config.backend.api_key.is_none());
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = SentinelConfig::default();
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(SentinelConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
