//! TranscriptionService port - 非同期の音声認識ジョブ
//!
//! start はジョブを起動するだけで、完了は別経路（完了イベント）で届きます。

use async_trait::async_trait;

use crate::domain::{JobDescription, JobName, ServiceError, TranscriptionJob};

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn start(&self, job: &TranscriptionJob) -> Result<(), ServiceError>;

    async fn describe(&self, name: &JobName) -> Result<JobDescription, ServiceError>;
}
