//! Chat ports - チャンネルへの送信と添付のダウンロード
//!
//! チャットプラットフォームのクライアント本体は外部コラボレータです。

use async_trait::async_trait;

use crate::domain::{ChannelId, ServiceError};

/// チャンネルにテキストを送る
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), ServiceError>;
}

/// 添付ファイルの URL からバイト列を取得する
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError>;
}
