use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

/// Outbound notification channel. Delivery is fire-and-forget; failures are
/// logged and swallowed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: &str, title: &str, message: &str);
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, kind: &str, title: &str, message: &str) {
        let payload = json!({
            "type": kind,
            "title": title,
            "message": message,
        });
        if let Err(e) = self.client.post(&self.url).json(&payload).send().await {
            warn!(error = %e, "webhook notification failed");
        }
    }
}

/// Used when no webhook is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _kind: &str, _title: &str, _message: &str) {}
}
