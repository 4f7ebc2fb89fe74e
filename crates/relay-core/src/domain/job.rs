//! Transcription job naming and status.
//!
//! ジョブ名は外部ジョブサービスの識別子として有効でなければならず、
//! 時刻ベースで高い確率で一意になります。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::storage::{StorageKey, StorageLocation, TRANSCRIBE_OUTPUT_PREFIX};

/// ジョブ名の最大長
pub const MAX_JOB_NAME_LEN: usize = 200;

/// ジョブ名のプレフィックス
pub const JOB_NAME_PREFIX: &str = "discord";

/// JobName は外部の文字起こしジョブの識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// 既存のジョブ名（完了イベントなど外部から受け取ったもの）
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `discord-{unix_time}-{sanitized_basename}` を生成し、最大長で切り詰める
    pub fn derive(unix_time: i64, source: &StorageKey) -> Self {
        let name = format!(
            "{JOB_NAME_PREFIX}-{unix_time}-{}",
            sanitize(source.basename())
        );
        // sanitize 後は ASCII のみなので char 境界を気にせず切れる
        Self(name.chars().take(MAX_JOB_NAME_LEN).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 結果 JSON の出力先キー: `transcribe-output/{job_name}.json`
    pub fn output_key(&self) -> StorageKey {
        StorageKey::new(format!("{TRANSCRIBE_OUTPUT_PREFIX}/{}.json", self.0))
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `[A-Za-z0-9_.-]` 以外の文字を `_` に置き換える
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 外部ジョブの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// 文字起こしジョブの起動パラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionJob {
    pub name: JobName,
    pub language_code: String,
    pub media_format: String,
    pub source: StorageLocation,
    pub output: StorageLocation,
}

impl TranscriptionJob {
    /// 同じ bucket の `transcribe-output/` に結果を書き出すジョブを組み立てる
    pub fn new(
        unix_time: i64,
        bucket: &str,
        source_key: StorageKey,
        language_code: impl Into<String>,
    ) -> Self {
        let name = JobName::derive(unix_time, &source_key);
        let media_format = source_key.extension();
        let output = StorageLocation::new(bucket, name.output_key());
        Self {
            name,
            language_code: language_code.into(),
            media_format,
            source: StorageLocation::new(bucket, source_key),
            output,
        }
    }
}

/// describe の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub name: JobName,
    pub status: JobStatus,
    /// COMPLETED のときだけ存在する
    pub transcript_uri: Option<String>,
}
