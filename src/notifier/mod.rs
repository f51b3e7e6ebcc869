pub mod feishu;
pub mod sms;

use crate::config::NotifierConfig;
use crate::entities::alert;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub use feishu::FeishuNotifier;
pub use sms::{LogSmsSender, SmsNotifier, SmsSender};

/// Errors a delivery channel can produce. Logged at the call site and
/// never escalated; a failed notification must not fail a cycle.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel rejected payload: {0}")]
    Rejected(String),
}

/// An alert delivery channel. Receives the batch of alerts a detection
/// cycle created; implementations decide formatting and transport.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, alerts: &[alert::Model]) -> Result<(), NotifierError>;
}

/// Discards every batch. The default channel.
pub struct NoopNotifier;

#[async_trait]
impl AlertNotifier for NoopNotifier {
    async fn notify(&self, alerts: &[alert::Model]) -> Result<(), NotifierError> {
        debug!(count = alerts.len(), "Notification channel disabled, dropping batch");
        Ok(())
    }
}

/// Builds the delivery channel selected by configuration.
pub fn from_config(cfg: &NotifierConfig) -> Arc<dyn AlertNotifier> {
    match cfg.channel.to_ascii_lowercase().as_str() {
        "feishu" => match cfg.feishu_webhook_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                Arc::new(FeishuNotifier::new(url.trim().to_string()))
            }
            _ => {
                warn!("Feishu channel selected without a webhook url, using noop");
                Arc::new(NoopNotifier)
            }
        },
        "sms" => {
            let recipients: Vec<String> = cfg
                .sms_recipients
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
            if recipients.is_empty() {
                warn!("SMS channel selected without recipients, using noop");
                Arc::new(NoopNotifier)
            } else {
                Arc::new(SmsNotifier::new(recipients, Arc::new(LogSmsSender)))
            }
        }
        _ => Arc::new(NoopNotifier),
    }
}
