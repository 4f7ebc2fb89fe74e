//! 記録するだけの ChatClient / Notifier と、固定データを返す AttachmentFetcher
//!
//! テストと CLI のデモ配線で使います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChannelId, ServiceError};
use crate::ports::{AttachmentFetcher, ChatClient, Notifier};

#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<(ChannelId, String)>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), ServiceError> {
        self.sent.lock().await.push((channel, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<String> {
        self.notifications.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, content: &str) -> Result<(), ServiceError> {
        self.notifications.lock().await.push(content.to_string());
        Ok(())
    }
}

/// URL → バイト列の固定表。未登録の URL は NotFound
#[derive(Default)]
pub struct StaticFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.into(), bytes.into());
        self
    }
}

#[async_trait]
impl AttachmentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(url.to_string()))
    }
}
