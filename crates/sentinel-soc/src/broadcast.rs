//! Alert fan-out across notification channels

use crate::notify::{Alert, LogChannel, NotificationChannel, SlackChannel, TeamsChannel};
use crate::DispatchError;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Notification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Slack incoming-webhook URL
    pub slack_webhook_url: Option<String>,
    /// Teams incoming-webhook URL
    pub teams_webhook_url: Option<String>,
    /// Also write alerts to the log
    pub log_alerts: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            teams_webhook_url: None,
            log_alerts: true,
            timeout_secs: 10,
        }
    }
}

/// Per-channel delivery outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Channels that delivered
    pub delivered: Vec<String>,
    /// Channels that failed, with the error text
    pub failed: Vec<(String, String)>,
}

impl BroadcastReport {
    /// Number of channels attempted
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Fans one alert out to every configured channel
#[derive(Clone, Default)]
pub struct AlertBroadcaster {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl AlertBroadcaster {
    /// Broadcaster with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the channel set from configuration
    pub fn from_config(config: &NotificationConfig) -> Result<Self, DispatchError> {
        let mut broadcaster = Self::new();

        if let Some(url) = non_blank(&config.slack_webhook_url) {
            broadcaster = broadcaster.with_channel(Arc::new(SlackChannel::new(url, config.timeout_secs)?));
        }
        if let Some(url) = non_blank(&config.teams_webhook_url) {
            broadcaster = broadcaster.with_channel(Arc::new(TeamsChannel::new(url, config.timeout_secs)?));
        }
        if config.log_alerts {
            broadcaster = broadcaster.with_channel(Arc::new(LogChannel));
        }

        Ok(broadcaster)
    }

    /// Add a channel
    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Send the alert to every channel at once; a failing channel does not
    /// stop the rest. The report lists channels in registration order.
    pub async fn broadcast(&self, alert: &Alert) -> BroadcastReport {
        let outcomes = join_all(self.channels.iter().map(|channel| channel.send(alert))).await;
        let mut report = BroadcastReport::default();

        for (channel, outcome) in self.channels.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered.push(channel.name().to_string()),
                Err(e) => {
                    warn!(channel = channel.name(), error = %e, "Alert delivery failed");
                    report.failed.push((channel.name().to_string(), e.to_string()));
                }
            }
        }

        info!(
            user = %alert.user_id,
            risk = %alert.risk_category,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Alert broadcast"
        );
        report
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
