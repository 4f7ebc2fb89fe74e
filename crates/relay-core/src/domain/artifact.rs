//! Received audio, owned by the ingestor until it is stored.

use chrono::{DateTime, Utc};

use super::chat::{ChannelId, MessageId};
use super::errors::RelayError;
use super::storage::{StorageKey, ingestion_filename};

/// 添付のファイル名をそのままパス・キーの一部に使えるか確かめる
///
/// 区切り文字（`/`, `\`）、`..`、NUL を含む名前は拒否する。
pub fn checked_filename(filename: &str) -> Result<&str, RelayError> {
    let unsafe_name = filename.is_empty()
        || filename == "."
        || filename.contains("..")
        || filename.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(RelayError::MalformedInput(format!(
            "unsafe attachment filename: {filename:?}"
        )));
    }
    Ok(filename)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub filename: String,
    pub received_at: DateTime<Utc>,
    pub payload: Vec<u8>,
}

impl AudioArtifact {
    /// ローカル一時保存用のファイル名（ストレージキーの basename と同じ）
    pub fn scratch_filename(&self) -> String {
        ingestion_filename(self.received_at, self.message_id.0, &self.filename)
    }

    /// 保存後はこのキーだけで表現される
    pub fn into_storage(self, prefix: &str) -> (StorageKey, Vec<u8>) {
        let key =
            StorageKey::for_ingestion(prefix, self.received_at, self.message_id.0, &self.filename);
        (key, self.payload)
    }
}
