//! CompletionRelay - 完了イベントから結果を取り出してチャンネルへ届ける
//!
//! COMPLETED / FAILED 以外は何もしません。重複配送は同じメッセージをもう一度送るだけで、
//! 外部の状態は変えません（冪等）。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::bounded;
use crate::domain::transcript::{completion_message, extract_transcript, parse_transcript_uri};
use crate::domain::{CompletionEvent, JobName, JobStatus, RelayError, RelayOutcome};
use crate::ports::{Notifier, ObjectStore, TranscriptionService};

pub struct CompletionRelay {
    transcription: Arc<dyn TranscriptionService>,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl CompletionRelay {
    pub fn new(
        transcription: Arc<dyn TranscriptionService>,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            transcription,
            store,
            notifier,
            timeout,
        }
    }

    /// 1 件の完了イベントを処理する
    ///
    /// 結果の取得に失敗した場合はチャンネルへ報告した上でエラーを返す。
    pub async fn handle(&self, event: &CompletionEvent) -> Result<RelayOutcome, RelayError> {
        match event.status {
            JobStatus::Completed => {}
            JobStatus::Failed => return self.report_failed_job(&event.job_name).await,
            other => {
                debug!(job_name = %event.job_name, status = %other, "non-terminal status, skipped");
                return Ok(RelayOutcome::Skipped(other));
            }
        }

        match self.fetch_transcript(&event.job_name).await {
            Ok(transcript) => {
                let message = completion_message(&transcript);
                bounded("notifier.notify", self.timeout, self.notifier.notify(&message)).await?;
                info!(
                    job_name = %event.job_name,
                    chars = transcript.chars().count(),
                    "transcript delivered"
                );
                Ok(RelayOutcome::Delivered {
                    job_name: event.job_name.clone(),
                    message,
                })
            }
            Err(e) => {
                warn!(job_name = %event.job_name, error = %e, "failed to fetch transcript");
                self.best_effort(&format!("❌ 文字起こし結果の取得に失敗: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    async fn fetch_transcript(&self, job_name: &JobName) -> Result<String, RelayError> {
        let description = bounded(
            "transcription.describe",
            self.timeout,
            self.transcription.describe(job_name),
        )
        .await?;

        let uri = description.transcript_uri.ok_or_else(|| {
            RelayError::MalformedInput(format!("job {job_name} has no transcript uri"))
        })?;
        let location = parse_transcript_uri(&uri)?;

        let bytes = bounded(
            "object_store.get",
            self.timeout,
            self.store.get(&location.bucket, &location.key),
        )
        .await?;
        extract_transcript(&bytes)
    }

    async fn report_failed_job(&self, job_name: &JobName) -> Result<RelayOutcome, RelayError> {
        warn!(job_name = %job_name, "transcription job failed");
        bounded(
            "notifier.notify",
            self.timeout,
            self.notifier
                .notify(&format!("❌ 文字起こしに失敗しました (job: {job_name})")),
        )
        .await?;
        Ok(RelayOutcome::FailureReported {
            job_name: job_name.clone(),
        })
    }

    async fn best_effort(&self, content: &str) {
        if let Err(e) = bounded("notifier.notify", self.timeout, self.notifier.notify(content)).await
        {
            warn!(error = %e, "failed to report relay failure");
        }
    }
}
