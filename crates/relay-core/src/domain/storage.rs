//! Storage - オブジェクトストレージ上の位置
//!
//! 永続状態はすべて外部のオブジェクトストレージにあります。
//! ここではキーの生成規則と位置の表現だけを扱います。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ストレージキーに埋め込むタイムスタンプの書式
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 文字起こし結果の出力先プレフィックス
pub const TRANSCRIBE_OUTPUT_PREFIX: &str = "transcribe-output";

/// StorageKey はオブジェクトストレージ内のパス風識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 受信した音声の保存先: `{prefix}/{timestamp}_{message_id}_{filename}`
    ///
    /// timestamp と message_id により、同名ファイルでも衝突しません。
    pub fn for_ingestion(
        prefix: &str,
        received_at: DateTime<Utc>,
        message_id: u64,
        filename: &str,
    ) -> Self {
        Self(format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            ingestion_filename(received_at, message_id, filename)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 最後の `/` 以降
    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// 拡張子（小文字化）。`.` が無ければ basename 全体を返す
    pub fn extension(&self) -> String {
        self.basename()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ローカルの一時保存とストレージキーで共有するファイル名
pub fn ingestion_filename(received_at: DateTime<Utc>, message_id: u64, filename: &str) -> String {
    format!(
        "{}_{}_{}",
        received_at.format(KEY_TIMESTAMP_FORMAT),
        message_id,
        filename
    )
}

/// list の結果 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: StorageKey,
    pub last_modified: DateTime<Utc>,
}

/// 最終更新が最も新しいオブジェクトを選ぶ
pub fn latest_object(objects: &[ObjectSummary]) -> Option<&ObjectSummary> {
    objects.iter().max_by_key(|o| o.last_modified)
}

/// bucket + key の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub bucket: String,
    pub key: StorageKey,
}

impl StorageLocation {
    pub fn new(bucket: impl Into<String>, key: StorageKey) -> Self {
        Self {
            bucket: bucket.into(),
            key,
        }
    }

    /// `s3://bucket/key` 形式
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}
