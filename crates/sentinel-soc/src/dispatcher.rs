//! Mitigation webhook dispatch

use crate::{http_client, DispatchError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sentinel_common::RiskCategory;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Event type carried by every mitigation event
pub const EVENT_TYPE: &str = "MITIGATION_TRIGGERED";

/// Mitigation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MitigationAction {
    /// Block a source IP at the firewall
    BlockIp,
    /// Open a security incident for a user
    CreateIncident,
}

impl MitigationAction {
    /// Wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BlockIp => "BLOCK_IP",
            Self::CreateIncident => "CREATE_INCIDENT",
        }
    }
}

/// Outbound mitigation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationEvent {
    /// Always `MITIGATION_TRIGGERED`
    pub event_type: String,
    /// Requested action
    pub action: MitigationAction,
    /// IP or user the action applies to
    pub target: String,
    /// Free-text details
    pub details: String,
    /// Emission time
    pub timestamp: DateTime<Utc>,
}

impl MitigationEvent {
    /// Create an event stamped now
    pub fn new(action: MitigationAction, target: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            event_type: EVENT_TYPE.to_string(),
            action,
            target: target.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Acknowledgement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    /// Receiver accepted (or event logged with no receiver configured)
    Success,
    /// Delivery failed
    Failed,
}

/// Dispatch acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAck {
    /// Outcome
    pub status: AckStatus,
    /// Emitting system
    pub source: String,
    /// Action requested
    pub action_taken: MitigationAction,
    /// Receiving system
    pub system_notified: String,
    /// Event reference
    pub reference: Uuid,
    /// Failure text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchAck {
    /// Whether the action went through
    pub fn is_success(&self) -> bool {
        self.status == AckStatus::Success
    }
}

/// Mitigation webhook configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MitigationConfig {
    /// Receiver URL; events are only logged when unset
    pub webhook_url: Option<String>,
    /// Name reported as the emitting system
    pub source: String,
    /// Name of the receiving system
    pub system_notified: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            source: "AI_Sentinel_SOAR".to_string(),
            system_notified: "EnterpriseFW-01".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Mitigation action trigger
#[async_trait]
pub trait MitigationDispatcher: Send + Sync {
    /// Dispatch one action; never fails
    async fn dispatch(&self, action: MitigationAction, target: &str, details: &str) -> DispatchAck;

    /// Block a source IP
    async fn block_ip(&self, ip: &str, reasoning: &str) -> DispatchAck {
        let details = format!("Agent detected Critical Risk: {}", reasoning);
        self.dispatch(MitigationAction::BlockIp, ip, &details).await
    }

    /// Open a security incident for a user
    async fn create_incident(&self, user: &str, category: RiskCategory) -> DispatchAck {
        let details = format!(
            "High-priority security incident created for analysis of {} risk.",
            category
        );
        self.dispatch(MitigationAction::CreateIncident, user, &details).await
    }
}

/// Webhook-backed dispatcher
pub struct WebhookDispatcher {
    config: MitigationConfig,
    client: reqwest::Client,
}

impl WebhookDispatcher {
    /// Create from configuration
    pub fn new(config: MitigationConfig) -> Result<Self, DispatchError> {
        let client = http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    async fn post(&self, url: &str, event: &MitigationEvent) -> Result<(), DispatchError> {
        self.client
            .post(url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn ack(&self, action: MitigationAction, status: AckStatus, error: Option<String>) -> DispatchAck {
        DispatchAck {
            status,
            source: self.config.source.clone(),
            action_taken: action,
            system_notified: self.config.system_notified.clone(),
            reference: Uuid::new_v4(),
            error,
        }
    }
}

#[async_trait]
impl MitigationDispatcher for WebhookDispatcher {
    async fn dispatch(&self, action: MitigationAction, target: &str, details: &str) -> DispatchAck {
        let event = MitigationEvent::new(action, target, details);
        info!(
            event_type = %event.event_type,
            action = action.as_str(),
            target = %event.target,
            details = %event.details,
            "Triggering mitigation"
        );

        let Some(url) = self.config.webhook_url.as_deref() else {
            return self.ack(action, AckStatus::Success, None);
        };

        match self.post(url, &event).await {
            Ok(()) => self.ack(action, AckStatus::Success, None),
            Err(e) => {
                warn!(action = action.as_str(), target = %target, error = %e, "Mitigation webhook failed");
                self.ack(action, AckStatus::Failed, Some(e.to_string()))
            }
        }
    }
}

/// Dispatcher that records events instead of sending them
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<MitigationEvent>>,
}

impl RecordingDispatcher {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<MitigationEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl MitigationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, action: MitigationAction, target: &str, details: &str) -> DispatchAck {
        self.events.lock().push(MitigationEvent::new(action, target, details));
        DispatchAck {
            status: AckStatus::Success,
            source: "recorder".to_string(),
            action_taken: action,
            system_notified: "recorder".to_string(),
            reference: Uuid::new_v4(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_event_shape() {
        let event = MitigationEvent::new(MitigationAction::BlockIp, "10.0.0.7", "test");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "MITIGATION_TRIGGERED");
        assert_eq!(value["action"], "BLOCK_IP");
        assert_eq!(value["target"], "10.0.0.7");
        assert!(value["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_log_only_ack() {
        let dispatcher = WebhookDispatcher::new(MitigationConfig::default()).unwrap();
        let ack = dispatcher.block_ip("10.0.0.7", "malicious site").await;
        assert!(ack.is_success());
        assert_eq!(ack.source, "AI_Sentinel_SOAR");
        assert_eq!(ack.system_notified, "EnterpriseFW-01");
        assert_eq!(ack.action_taken, MitigationAction::BlockIp);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_fails_softly() {
        let dispatcher = WebhookDispatcher::new(MitigationConfig {
            webhook_url: Some("http://127.0.0.1:1/hook".into()),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();
        let ack = dispatcher.create_incident("alice", RiskCategory::HighRisk).await;
        assert_eq!(ack.status, AckStatus::Failed);
        assert!(ack.error.is_some());
    }

    #[tokio::test]
    async fn test_recording_helpers() {
        let recorder = RecordingDispatcher::new();
        recorder.block_ip("10.1.1.1", "exfiltration").await;
        recorder.create_incident("bob", RiskCategory::Critical).await;

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, MitigationAction::BlockIp);
        assert_eq!(events[0].details, "Agent detected Critical Risk: exfiltration");
        assert_eq!(events[1].target, "bob");
        assert!(events[1].details.contains("CRITICAL risk"));
    }

    #[tokio::test]
    async fn test_webhook_delivers_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/soar/events"))
            .and(body_partial_json(json!({
                "event_type": "MITIGATION_TRIGGERED",
                "action": "BLOCK_IP",
                "target": "192.168.1.50",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new(MitigationConfig {
            webhook_url: Some(format!("{}/soar/events", server.uri())),
            ..Default::default()
        })
        .unwrap();
        let ack = dispatcher.block_ip("192.168.1.50", "exfiltration to paste site").await;

        assert!(ack.is_success());
        assert_eq!(ack.source, "AI_Sentinel_SOAR");
        assert_eq!(ack.system_notified, "EnterpriseFW-01");
        assert!(ack.error.is_none());

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        assert_eq!(body["details"], "Agent detected Critical Risk: exfiltration to paste site");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_webhook_server_error_fails_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new(MitigationConfig {
            webhook_url: Some(server.uri()),
            ..Default::default()
        })
        .unwrap();
        let ack = dispatcher.create_incident("alice", RiskCategory::Critical).await;

        assert_eq!(ack.status, AckStatus::Failed);
        assert_eq!(ack.action_taken, MitigationAction::CreateIncident);
        assert_eq!(ack.error.as_deref(), Some("HTTP error: 500"));
    }
}
