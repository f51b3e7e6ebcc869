use super::{AlertNotifier, NotifierError};
use crate::entities::alert;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Transport seam for the SMS gateway. The real gateway needs account
/// credentials we do not ship, so the default implementation logs.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, recipient: &str, body: &str) -> Result<(), NotifierError>;
}

/// Writes the message to the log instead of a gateway.
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, recipient: &str, body: &str) -> Result<(), NotifierError> {
        info!(recipient = %recipient, body = %body, "SMS delivery (log only)");
        Ok(())
    }
}

/// Condenses an alert batch into one short message and fans it out to
/// every configured recipient.
pub struct SmsNotifier {
    recipients: Vec<String>,
    sender: Arc<dyn SmsSender>,
}

impl SmsNotifier {
    pub fn new(recipients: Vec<String>, sender: Arc<dyn SmsSender>) -> Self {
        Self { recipients, sender }
    }

    /// SMS bodies are length-constrained, so only the first few alerts
    /// are spelled out and the rest are counted.
    fn summary(alerts: &[alert::Model]) -> String {
        const DETAILED: usize = 3;
        let mut parts: Vec<String> = alerts
            .iter()
            .take(DETAILED)
            .map(|a| format!("[{}] {}", a.severity, a.message))
            .collect();
        if alerts.len() > DETAILED {
            parts.push(format!("and {} more", alerts.len() - DETAILED));
        }
        format!("Grid alerts ({}): {}", alerts.len(), parts.join("; "))
    }
}

#[async_trait]
impl AlertNotifier for SmsNotifier {
    #[instrument(skip(self, alerts), fields(count = alerts.len()))]
    async fn notify(&self, alerts: &[alert::Model]) -> Result<(), NotifierError> {
        if alerts.is_empty() || self.recipients.is_empty() {
            return Ok(());
        }

        let body = Self::summary(alerts);
        for recipient in &self.recipients {
            self.sender.send(recipient, &body).await?;
        }
        info!(
            count = alerts.len(),
            recipients = self.recipients.len(),
            "Alert summary sent by SMS"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AlertKind, Severity};
    use chrono::Utc;
    use std::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsSender for RecordingSender {
        async fn send(&self, recipient: &str, body: &str) -> Result<(), NotifierError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn alert_fixture(severity: Severity, message: &str) -> alert::Model {
        alert::Model {
            id: 0,
            point_id: Some("P001".to_string()),
            device_id: None,
            alert_type: AlertKind::TrendSpike,
            severity,
            message: message.to_string(),
            value: None,
            threshold: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[tokio::test]
    async fn fans_out_to_every_recipient() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        });
        let notifier = SmsNotifier::new(
            vec!["13800000001".to_string(), "13800000002".to_string()],
            sender.clone(),
        );

        notifier
            .notify(&[alert_fixture(Severity::Warning, "usage spike")])
            .await
            .unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "13800000001");
        assert_eq!(sent[1].0, "13800000002");
        assert_eq!(sent[0].1, sent[1].1);
        assert!(sent[0].1.contains("[WARNING] usage spike"));
    }

    #[test]
    fn summary_caps_spelled_out_alerts() {
        let alerts: Vec<_> = (0..5)
            .map(|i| alert_fixture(Severity::Info, &format!("alert {i}")))
            .collect();
        let summary = SmsNotifier::summary(&alerts);
        assert!(summary.starts_with("Grid alerts (5):"));
        assert!(summary.contains("alert 0"));
        assert!(summary.contains("alert 2"));
        assert!(!summary.contains("alert 3"));
        assert!(summary.ends_with("and 2 more"));
    }

    #[tokio::test]
    async fn empty_batch_sends_nothing() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
        });
        let notifier = SmsNotifier::new(vec!["13800000001".to_string()], sender.clone());

        notifier.notify(&[]).await.unwrap();
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
