//! Notifier port - 送りっぱなしの外部通知（webhook）
//!
//! 完了通知はイベント駆動で、元のチャンネル情報を持たないため
//! ChatClient ではなくこちらを使います。

use async_trait::async_trait;

use crate::domain::ServiceError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, content: &str) -> Result<(), ServiceError>;
}
