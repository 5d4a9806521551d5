//! Security notification channels

use crate::{http_client, DispatchError};
use async_trait::async_trait;
use sentinel_common::RiskCategory;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

/// Alert raised for a high-risk verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// User behind the request
    pub user_id: String,
    /// Department of the user
    pub department: String,
    /// Requested URL
    pub request_url: String,
    /// Verdict category
    pub risk_category: RiskCategory,
    /// Verdict score
    pub risk_score: u8,
    /// Verdict reasoning
    pub reasoning: String,
}

impl Alert {
    /// Severity marker: red for CRITICAL, orange otherwise
    pub fn marker(&self) -> &'static str {
        if self.risk_category == RiskCategory::Critical {
            "🔴"
        } else {
            "🟠"
        }
    }

    /// Slack message text
    pub fn slack_text(&self) -> String {
        format!(
            "{} *AI SECURITY ALERT*\n*User:* {}\n*Risk:* {}\n*Reasoning:* {}\n*Action Taken:* Automated analysis triggered",
            self.marker(),
            self.user_id,
            self.risk_category,
            self.reasoning
        )
    }

    /// One-line summary used by Teams and logs
    pub fn summary(&self) -> String {
        format!(
            "AI security alert for {} (Risk: {}, score {})",
            self.user_id, self.risk_category, self.risk_score
        )
    }
}

/// Alert delivery channel
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name
    fn name(&self) -> &str;

    /// Deliver one alert
    async fn send(&self, alert: &Alert) -> Result<(), DispatchError>;
}

/// Slack incoming-webhook channel
pub struct SlackChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create for a webhook URL
    pub fn new(webhook_url: &str, timeout_secs: u64) -> Result<Self, DispatchError> {
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            client: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, alert: &Alert) -> Result<(), DispatchError> {
        self.client
            .post(&self.webhook_url)
            .json(&json!({ "text": alert.slack_text() }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Microsoft Teams incoming-webhook channel
pub struct TeamsChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl TeamsChannel {
    /// Create for a webhook URL
    pub fn new(webhook_url: &str, timeout_secs: u64) -> Result<Self, DispatchError> {
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            client: http_client(timeout_secs)?,
        })
    }

    /// MessageCard payload
    pub fn card(alert: &Alert) -> serde_json::Value {
        let color = if alert.risk_category == RiskCategory::Critical {
            "D70000"
        } else {
            "FF8C00"
        };
        json!({
            "@type": "MessageCard",
            "@context": "https://schema.org/extensions",
            "themeColor": color,
            "summary": alert.summary(),
            "sections": [{
                "activityTitle": "AI SECURITY ALERT",
                "facts": [
                    { "name": "User", "value": alert.user_id },
                    { "name": "Department", "value": alert.department },
                    { "name": "Risk", "value": alert.risk_category.as_str() },
                    { "name": "URL", "value": alert.request_url },
                ],
                "text": alert.reasoning,
            }]
        })
    }
}

#[async_trait]
impl NotificationChannel for TeamsChannel {
    fn name(&self) -> &str {
        "teams"
    }

    async fn send(&self, alert: &Alert) -> Result<(), DispatchError> {
        self.client
            .post(&self.webhook_url)
            .json(&Self::card(alert))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Channel that writes alerts to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, alert: &Alert) -> Result<(), DispatchError> {
        warn!(
            user = %alert.user_id,
            risk = %alert.risk_category,
            score = alert.risk_score,
            url = %alert.request_url,
            "{}",
            alert.summary()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn alert(category: RiskCategory) -> Alert {
        Alert {
            user_id: "jdoe".into(),
            department: "Fraud Detection".into(),
            request_url: "https://claude.ai".into(),
            risk_category: category,
            risk_score: 80,
            reasoning: "IBAN pasted into external chat".into(),
        }
    }

    #[test]
    fn test_slack_text() {
        let text = alert(RiskCategory::HighRisk).slack_text();
        assert!(text.starts_with("🟠 *AI SECURITY ALERT*"));
        assert!(text.contains("*User:* jdoe"));
        assert!(text.contains("*Risk:* HIGH_RISK"));
        assert!(text.contains("*Reasoning:* IBAN pasted into external chat"));
    }

    #[test]
    fn test_critical_marker() {
        assert_eq!(alert(RiskCategory::Critical).marker(), "🔴");
    }

    #[test]
    fn test_teams_card() {
        let card = TeamsChannel::card(&alert(RiskCategory::Critical));
        assert_eq!(card["@type"], "MessageCard");
        assert_eq!(card["themeColor"], "D70000");
        assert_eq!(card["sections"][0]["facts"][2]["value"], "CRITICAL");
    }

    #[tokio::test]
    async fn test_log_channel() {
        assert!(LogChannel.send(&alert(RiskCategory::HighRisk)).await.is_ok());
    }

    #[tokio::test]
    async fn test_slack_posts_text() {
        let alert = alert(RiskCategory::HighRisk);
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/T000/B000"))
            .and(body_json(json!({ "text": alert.slack_text() })))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = SlackChannel::new(&format!("{}/services/T000/B000", server.uri()), 5).unwrap();
        assert!(channel.send(&alert).await.is_ok());
    }

    #[tokio::test]
    async fn test_slack_rejection_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid_token"))
            .mount(&server)
            .await;

        let channel = SlackChannel::new(&server.uri(), 5).unwrap();
        assert!(matches!(
            channel.send(&alert(RiskCategory::HighRisk)).await,
            Err(DispatchError::HttpError(403))
        ));
    }

    #[tokio::test]
    async fn test_teams_posts_card() {
        let alert = alert(RiskCategory::Critical);
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhookb2/incoming"))
            .and(body_json(TeamsChannel::card(&alert)))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TeamsChannel::new(&format!("{}/webhookb2/incoming", server.uri()), 5).unwrap();
        assert!(channel.send(&alert).await.is_ok());

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["@type"], "MessageCard");
        assert_eq!(body["sections"][0]["facts"][0]["value"], "jdoe");
    }
}
