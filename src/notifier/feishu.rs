use super::{AlertNotifier, NotifierError};
use crate::entities::alert;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, instrument};

/// Response envelope of the Feishu bot webhook. HTTP success with a
/// non-zero `code` still means the payload was rejected.
#[derive(Debug, Deserialize)]
struct FeishuResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

/// Delivers alert batches to a Feishu group bot webhook as a rich-text
/// ("post") message, one paragraph per alert.
#[derive(Clone)]
pub struct FeishuNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl FeishuNotifier {
    pub fn new(webhook_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url,
        }
    }

    fn build_payload(alerts: &[alert::Model]) -> Value {
        let mut paragraphs: Vec<Value> = Vec::with_capacity(alerts.len());
        for alert in alerts {
            paragraphs.push(json!([{
                "tag": "text",
                "text": format!("[{}] {}", alert.severity, alert.message),
            }]));
            if let Some(point_id) = alert.point_id.as_deref() {
                paragraphs.push(json!([{
                    "tag": "text",
                    "text": format!("  point: {}", point_id),
                }]));
            }
        }
        json!({
            "msg_type": "post",
            "content": {
                "post": {
                    "en_us": {
                        "title": format!("Grid alerts ({})", alerts.len()),
                        "content": paragraphs,
                    }
                }
            }
        })
    }
}

#[async_trait]
impl AlertNotifier for FeishuNotifier {
    #[instrument(skip(self, alerts), fields(count = alerts.len()))]
    async fn notify(&self, alerts: &[alert::Model]) -> Result<(), NotifierError> {
        if alerts.is_empty() {
            return Ok(());
        }

        let payload = Self::build_payload(alerts);
        let response = self
            .client
            .post(&self.webhook_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Rejected(format!(
                "webhook returned HTTP {status}"
            )));
        }

        let body: FeishuResponse = response.json().await?;
        if body.code != 0 {
            return Err(NotifierError::Rejected(format!(
                "feishu code {}: {}",
                body.code, body.msg
            )));
        }

        info!(count = alerts.len(), "Alert batch delivered to Feishu");
        Ok(())
    }
}
