//! Security Operations: mitigation dispatch and alert broadcast
//!
//! Side-effecting response actions for high-risk verdicts:
//! - Mitigation webhooks (firewall block, SOC incident)
//! - Alert broadcast to security channels (Slack, Teams, log)
//!
//! Neither surface propagates failures into the triage pipeline. A
//! dispatcher always returns an acknowledgement; a broadcast always
//! returns a report of which channels delivered.
//!
//! # Response Flow
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────────┐     ┌──────────────┐
//! │   Verdict    │────▶│ MitigationDispatcher│────▶│ Firewall/SOC │
//! │ HIGH/CRITICAL│     └─────────────────────┘     └──────────────┘
//! │              │     ┌─────────────────────┐     ┌──────────────┐
//! │              │────▶│  AlertBroadcaster   │────▶│ Slack/Teams  │
//! └──────────────┘     └─────────────────────┘     └──────────────┘
//! ```

#![warn(missing_docs)]

pub mod broadcast;
pub mod dispatcher;
pub mod notify;

pub use broadcast::{AlertBroadcaster, BroadcastReport, NotificationConfig};
pub use dispatcher::{
    AckStatus, DispatchAck, MitigationAction, MitigationConfig, MitigationDispatcher,
    MitigationEvent, RecordingDispatcher, WebhookDispatcher,
};
pub use notify::{Alert, LogChannel, NotificationChannel, SlackChannel, TeamsChannel};

use thiserror::Error;

/// Dispatch and delivery errors
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Receiver rejected the request
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Client construction failed
    #[error("client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::HttpError(status.as_u16()),
            None => Self::Network(e.to_string()),
        }
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, DispatchError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DispatchError::Client(e.to_string()))
}
