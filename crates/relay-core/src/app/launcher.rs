//! JobLauncher - ストレージキーから文字起こしジョブを起動する

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::bounded;
use crate::domain::{JobName, RelayError, StorageKey, TranscriptionJob};
use crate::ports::{Clock, TranscriptionService};

pub struct JobLauncher {
    transcription: Arc<dyn TranscriptionService>,
    clock: Arc<dyn Clock>,
    language_code: String,
    timeout: Duration,
}

impl JobLauncher {
    pub fn new(
        transcription: Arc<dyn TranscriptionService>,
        clock: Arc<dyn Clock>,
        language_code: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transcription,
            clock,
            language_code: language_code.into(),
            timeout,
        }
    }

    /// ジョブを起動してジョブ名を返す
    ///
    /// 外部呼び出しの失敗はそのまま呼び出し元に返す（ユーザーへの報告は呼び出し元の責務）。
    pub async fn launch(&self, bucket: &str, source_key: &StorageKey) -> Result<JobName, RelayError> {
        let job = TranscriptionJob::new(
            self.clock.now().timestamp(),
            bucket,
            source_key.clone(),
            self.language_code.as_str(),
        );

        bounded(
            "transcription.start",
            self.timeout,
            self.transcription.start(&job),
        )
        .await?;

        info!(
            job_name = %job.name,
            source = %job.source,
            output = %job.output,
            media_format = %job.media_format,
            "transcription job started"
        );
        Ok(job.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryTranscriptionService;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    fn launcher(service: Arc<InMemoryTranscriptionService>) -> JobLauncher {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap());
        JobLauncher::new(service, Arc::new(clock), "ja-JP", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn launch_starts_job_with_derived_name_and_output() {
        let service = Arc::new(InMemoryTranscriptionService::new());
        let launcher = launcher(service.clone());

        let name = launcher
            .launch("bucket", &StorageKey::new("voice/20231114_221320_9_a b.ogg"))
            .await
            .unwrap();

        assert_eq!(name.as_str(), "discord-1700000000-20231114_221320_9_a_b.ogg");
        let jobs = service.started_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, name);
        assert_eq!(jobs[0].language_code, "ja-JP");
        assert_eq!(jobs[0].media_format, "ogg");
        assert_eq!(
            jobs[0].source.uri(),
            "s3://bucket/voice/20231114_221320_9_a b.ogg"
        );
        assert_eq!(
            jobs[0].output.uri(),
            format!("s3://bucket/transcribe-output/{name}.json")
        );
    }

    #[tokio::test]
    async fn launch_failure_propagates() {
        let service = Arc::new(InMemoryTranscriptionService::rejecting("quota"));
        let err = launcher(service)
            .launch("bucket", &StorageKey::new("voice/a.wav"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::External {
                service: "transcription.start",
                ..
            }
        ));
    }
}
