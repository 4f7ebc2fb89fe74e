//! Completion events delivered by the event bus.
//!
//! 配送は at-least-once なので同じイベントが重複して届くことがあります。

use serde::{Deserialize, Serialize};

use super::job::{JobName, JobStatus};

/// イベントバスの封筒: `{"detail": {"TranscriptionJobName": .., "TranscriptionJobStatus": ..}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEnvelope {
    pub detail: CompletionEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    #[serde(rename = "TranscriptionJobName")]
    pub job_name: JobName,
    #[serde(rename = "TranscriptionJobStatus")]
    pub status: JobStatus,
}

impl CompletionEvent {
    pub fn new(job_name: JobName, status: JobStatus) -> Self {
        Self { job_name, status }
    }

    pub fn summary(&self) -> CompletionSummary {
        CompletionSummary {
            job_name: self.job_name.clone(),
            status: self.status,
        }
    }
}

/// ステータス観測用のエコー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub job_name: JobName,
    pub status: JobStatus,
}

/// relay が何をしたか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// COMPLETED / FAILED 以外
    Skipped(JobStatus),
    /// 完了メッセージを送った
    Delivered { job_name: JobName, message: String },
    /// 失敗をチャンネルに知らせた
    FailureReported { job_name: JobName },
}
