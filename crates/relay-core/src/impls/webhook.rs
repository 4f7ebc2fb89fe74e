//! WebhookNotifier - `{"content": ...}` を JSON で POST する
//!
//! 結果は成功したかどうかだけを見ます。

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::ServiceError;
use crate::ports::Notifier;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, content: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::USER_AGENT, "relay-core (webhook)")
            .json(&WebhookPayload { content })
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("webhook post: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Rejected(format!(
                "webhook responded with status {status}"
            )));
        }
        Ok(())
    }
}

/// webhook が未設定のときの代替: ログに出すだけ
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, content: &str) -> Result<(), ServiceError> {
        tracing::info!(content, "notification (no webhook configured)");
        Ok(())
    }
}
