//! AudioIngestor - チャットイベントから音声を取り込む
//!
//! # フロー
//! 1. `classify` でイベントを分類（純粋関数）
//! 2. TriggerPhrase: 最新の音声を探してジョブを起動し、ジョブ名を返信
//! 3. AttachmentBatch: 添付を 1 件ずつ取得 → 一時保存 → ストレージへ保存 → 返信
//!
//! どの失敗もチャンネルへのメッセージに変換し、呼び出し元（イベントループ）には返しません。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::bounded;
use super::launcher::JobLauncher;
use crate::domain::artifact::checked_filename;
use crate::domain::chat::classify;
use crate::domain::storage::latest_object;
use crate::domain::{
    Attachment, AudioArtifact, ChannelId, ChatMessage, IgnoreReason, InboundEvent, JobName,
    RelayError, ServiceError, StorageKey, StorageLocation,
};
use crate::ports::{AttachmentFetcher, ChatClient, Clock, ObjectStore};

/// 取り込みに必要な設定
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub trigger_keyword: String,
    pub scratch_dir: PathBuf,
    pub timeout: Duration,
}

/// 1 イベントを処理した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestReport {
    Ignored(IgnoreReason),
    JobStarted {
        job_name: JobName,
        source: StorageLocation,
    },
    TriggerFailed(String),
    /// 添付ごとの結果（元の順序）
    Attachments(Vec<Result<StorageKey, String>>),
}

pub struct AudioIngestor {
    store: Arc<dyn ObjectStore>,
    fetcher: Arc<dyn AttachmentFetcher>,
    chat: Arc<dyn ChatClient>,
    launcher: Arc<JobLauncher>,
    clock: Arc<dyn Clock>,
    settings: IngestSettings,
}

impl AudioIngestor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        fetcher: Arc<dyn AttachmentFetcher>,
        chat: Arc<dyn ChatClient>,
        launcher: Arc<JobLauncher>,
        clock: Arc<dyn Clock>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            chat,
            launcher,
            clock,
            settings,
        }
    }

    /// 1 件のメッセージを処理する。失敗はすべてチャンネルへ報告済み
    pub async fn handle(&self, message: &ChatMessage) -> IngestReport {
        match classify(message, &self.settings.trigger_keyword) {
            InboundEvent::Ignored(reason) => {
                debug!(message_id = message.id.0, ?reason, "message ignored");
                IngestReport::Ignored(reason)
            }
            InboundEvent::TriggerPhrase => self.handle_trigger(message.channel_id).await,
            InboundEvent::AttachmentBatch(batch) => {
                self.handle_attachments(message, &batch).await
            }
        }
    }

    async fn handle_trigger(&self, channel: ChannelId) -> IngestReport {
        match self.start_latest().await {
            Ok((source, job_name)) => {
                self.reply(
                    channel,
                    &format!(
                        "🎤 文字起こしを開始しました。\n対象: {source}\nジョブ名: {job_name}"
                    ),
                )
                .await;
                IngestReport::JobStarted { job_name, source }
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "trigger phrase handling failed");
                self.reply(channel, &format!("❌ 変換開始に失敗: {e}")).await;
                IngestReport::TriggerFailed(e.to_string())
            }
        }
    }

    /// prefix 配下で最終更新が最も新しい音声に対してジョブを起動
    async fn start_latest(&self) -> Result<(StorageLocation, JobName), RelayError> {
        let (bucket, prefix) = self.storage_target()?;

        let objects = bounded(
            "object_store.list",
            self.settings.timeout,
            self.store.list(bucket, &format!("{prefix}/")),
        )
        .await?;

        let latest = latest_object(&objects)
            .ok_or_else(|| RelayError::NotFound("S3に音声が見つかりません".into()))?;

        let job_name = self.launcher.launch(bucket, &latest.key).await?;
        Ok((StorageLocation::new(bucket, latest.key.clone()), job_name))
    }

    async fn handle_attachments(&self, message: &ChatMessage, batch: &[Attachment]) -> IngestReport {
        let (bucket, prefix) = match self.storage_target() {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, "cannot store attachments");
                self.reply(message.channel_id, &format!("❌ 音声の保存に失敗: {e}"))
                    .await;
                return IngestReport::Attachments(
                    batch.iter().map(|_| Err(e.to_string())).collect(),
                );
            }
        };

        let mut results = Vec::with_capacity(batch.len());
        for attachment in batch {
            // 1 件の失敗で残りを止めない
            match self.store_attachment(message, attachment, bucket, prefix).await {
                Ok(key) => {
                    info!(
                        message_id = message.id.0,
                        filename = %attachment.filename,
                        storage_key = %key,
                        "audio stored"
                    );
                    let location = StorageLocation::new(bucket, key.clone());
                    self.reply(
                        message.channel_id,
                        &format!("音声を受信しました。\n{location}"),
                    )
                    .await;
                    results.push(Ok(key));
                }
                Err(e) => {
                    warn!(
                        message_id = message.id.0,
                        filename = %attachment.filename,
                        error = %e,
                        "audio store failed"
                    );
                    self.reply(
                        message.channel_id,
                        &format!("❌ 音声の保存に失敗: {}: {e}", attachment.filename),
                    )
                    .await;
                    results.push(Err(e.to_string()));
                }
            }
        }
        IngestReport::Attachments(results)
    }

    async fn store_attachment(
        &self,
        message: &ChatMessage,
        attachment: &Attachment,
        bucket: &str,
        prefix: &str,
    ) -> Result<StorageKey, RelayError> {
        // ファイル名は scratch のパスとストレージキーの両方に入る
        let filename = checked_filename(&attachment.filename)?;

        let payload = bounded(
            "attachment.fetch",
            self.settings.timeout,
            self.fetcher.fetch(&attachment.url),
        )
        .await?;

        let artifact = AudioArtifact {
            channel_id: message.channel_id,
            message_id: message.id,
            filename: filename.to_string(),
            received_at: self.clock.now(),
            payload,
        };
        self.write_scratch(&artifact).await?;

        let (key, payload) = artifact.into_storage(prefix);
        bounded(
            "object_store.put",
            self.settings.timeout,
            self.store.put(bucket, &key, payload),
        )
        .await?;
        Ok(key)
    }

    async fn write_scratch(&self, artifact: &AudioArtifact) -> Result<(), RelayError> {
        let scratch_error =
            |e: std::io::Error| RelayError::external("scratch", ServiceError::Unavailable(e.to_string()));

        tokio::fs::create_dir_all(&self.settings.scratch_dir)
            .await
            .map_err(scratch_error)?;
        let path = self.settings.scratch_dir.join(artifact.scratch_filename());
        tokio::fs::write(&path, &artifact.payload)
            .await
            .map_err(scratch_error)
    }

    fn storage_target(&self) -> Result<(&str, &str), RelayError> {
        match (&self.settings.bucket, &self.settings.prefix) {
            (Some(bucket), Some(prefix)) => Ok((bucket.as_str(), prefix.as_str())),
            _ => Err(RelayError::Configuration(
                "環境変数 S3_BUCKET / S3_PREFIX が未設定です".into(),
            )),
        }
    }

    async fn reply(&self, channel: ChannelId, text: &str) {
        if let Err(e) = bounded("chat.send", self.settings.timeout, self.chat.send(channel, text)).await
        {
            warn!(channel = channel.0, error = %e, "failed to send chat reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Author, MessageId};
    use crate::impls::{InMemoryObjectStore, InMemoryTranscriptionService, RecordingChat, StaticFetcher};
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    struct Fixture {
        store: Arc<InMemoryObjectStore>,
        transcription: Arc<InMemoryTranscriptionService>,
        chat: Arc<RecordingChat>,
        ingestor: AudioIngestor,
        scratch: PathBuf,
    }

    fn fixture(fetcher: StaticFetcher, bucket: Option<&str>) -> Fixture {
        fixture_with(fetcher, bucket, InMemoryTranscriptionService::new())
    }

    fn fixture_with(
        fetcher: StaticFetcher,
        bucket: Option<&str>,
        transcription: InMemoryTranscriptionService,
    ) -> Fixture {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryObjectStore::with_clock(clock.clone()));
        let transcription = Arc::new(transcription);
        let chat = Arc::new(RecordingChat::new());
        let timeout = Duration::from_secs(5);
        let launcher = Arc::new(JobLauncher::new(
            transcription.clone(),
            clock.clone(),
            "ja-JP",
            timeout,
        ));
        let scratch = std::env::temp_dir().join(format!("relay-ingest-{}", ulid::Ulid::new()));
        let ingestor = AudioIngestor::new(
            store.clone(),
            Arc::new(fetcher),
            chat.clone(),
            launcher,
            clock,
            IngestSettings {
                bucket: bucket.map(str::to_string),
                prefix: Some("voice".into()),
                trigger_keyword: "変換".into(),
                scratch_dir: scratch.clone(),
                timeout,
            },
        );
        Fixture {
            store,
            transcription,
            chat,
            ingestor,
            scratch,
        }
    }

    fn message(id: u64, content: &str, files: &[&str]) -> ChatMessage {
        ChatMessage {
            id: MessageId(id),
            channel_id: ChannelId(10),
            author: Author {
                id: 1,
                name: "alice".into(),
                bot: false,
            },
            content: content.into(),
            attachments: files
                .iter()
                .map(|f| Attachment::new(*f, format!("https://cdn.example/{f}")))
                .collect(),
        }
    }

    #[tokio::test]
    async fn trigger_without_audio_reports_not_found_and_starts_nothing() {
        let f = fixture(StaticFetcher::new(), Some("bucket"));

        let report = f.ingestor.handle(&message(1, "変換", &[])).await;

        assert!(matches!(report, IngestReport::TriggerFailed(_)));
        let texts = f.chat.texts().await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("❌ 変換開始に失敗"));
        assert!(texts[0].contains("見つかりません"));
        assert!(f.transcription.started_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn trigger_starts_job_for_latest_object() {
        let f = fixture(StaticFetcher::new(), Some("bucket"));
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        f.store
            .insert_at("bucket", StorageKey::new("voice/new.wav"), vec![1], late)
            .await;
        f.store
            .insert_at("bucket", StorageKey::new("voice/old.wav"), vec![2], early)
            .await;
        f.store
            .insert_at("bucket", StorageKey::new("elsewhere/newest.wav"), vec![3], late + chrono::Duration::days(1))
            .await;

        let report = f.ingestor.handle(&message(2, " 変換 ", &["ignored.wav"])).await;

        let IngestReport::JobStarted { job_name, source } = report else {
            panic!("expected job start, got {report:?}");
        };
        assert_eq!(source.key.as_str(), "voice/new.wav");
        let jobs = f.transcription.started_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, job_name);

        let texts = f.chat.texts().await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("s3://bucket/voice/new.wav"));
        assert!(texts[0].contains(job_name.as_str()));
    }

    #[tokio::test]
    async fn trigger_with_missing_configuration_is_reported() {
        let f = fixture(StaticFetcher::new(), None);
        let report = f.ingestor.handle(&message(3, "変換", &[])).await;
        assert!(matches!(report, IngestReport::TriggerFailed(_)));
        assert!(f.chat.texts().await[0].contains("S3_BUCKET"));
    }

    #[tokio::test]
    async fn trigger_launch_failure_is_reported() {
        let f = fixture_with(
            StaticFetcher::new(),
            Some("bucket"),
            InMemoryTranscriptionService::rejecting("limit exceeded"),
        );
        f.store
            .insert_at("bucket", StorageKey::new("voice/a.wav"), vec![1], Utc::now())
            .await;

        let report = f.ingestor.handle(&message(4, "変換", &[])).await;

        assert!(matches!(report, IngestReport::TriggerFailed(_)));
        assert!(f.chat.texts().await[0].contains("limit exceeded"));
    }

    #[tokio::test]
    async fn wav_attachment_is_stored_under_deterministic_key() {
        let fetcher = StaticFetcher::new().with("https://cdn.example/clip.wav", b"RIFF".to_vec());
        let f = fixture(fetcher, Some("bucket"));

        let report = f.ingestor.handle(&message(42, "", &["clip.wav"])).await;

        let expected = StorageKey::new("voice/20250601_083000_42_clip.wav");
        assert_eq!(report, IngestReport::Attachments(vec![Ok(expected.clone())]));
        assert_eq!(f.store.keys("bucket").await, vec![expected.clone()]);
        assert_eq!(
            f.store.get("bucket", &expected).await.unwrap(),
            b"RIFF".to_vec()
        );
        let scratch = tokio::fs::read(f.scratch.join("20250601_083000_42_clip.wav"))
            .await
            .unwrap();
        assert_eq!(scratch, b"RIFF".to_vec());
        assert_eq!(
            f.chat.texts().await,
            vec![format!("音声を受信しました。\ns3://bucket/{expected}")]
        );
        tokio::fs::remove_dir_all(&f.scratch).await.ok();
    }

    #[tokio::test]
    async fn image_attachment_writes_nothing() {
        let fetcher = StaticFetcher::new().with("https://cdn.example/image.png", vec![0u8; 4]);
        let f = fixture(fetcher, Some("bucket"));

        let report = f.ingestor.handle(&message(5, "", &["image.png"])).await;

        assert_eq!(
            report,
            IngestReport::Ignored(IgnoreReason::NoAudioAttachments)
        );
        assert!(f.store.keys("bucket").await.is_empty());
        assert!(f.chat.texts().await.is_empty());
    }

    #[tokio::test]
    async fn one_failed_attachment_does_not_block_the_rest() {
        // missing.mp3 は fetcher に無いので取得に失敗する
        let fetcher = StaticFetcher::new()
            .with("https://cdn.example/a.ogg", vec![1])
            .with("https://cdn.example/c.m4a", vec![3]);
        let f = fixture(fetcher, Some("bucket"));

        let report = f
            .ingestor
            .handle(&message(6, "", &["a.ogg", "missing.mp3", "c.m4a"]))
            .await;

        let IngestReport::Attachments(results) = report else {
            panic!("expected attachments");
        };
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(f.store.keys("bucket").await.len(), 2);

        let texts = f.chat.texts().await;
        assert_eq!(texts.len(), 3);
        assert!(texts[1].starts_with("❌ 音声の保存に失敗: missing.mp3"));
        tokio::fs::remove_dir_all(&f.scratch).await.ok();
    }

    #[tokio::test]
    async fn filename_with_traversal_is_rejected_per_attachment() {
        let escaped_name = format!("escaped-{}.wav", ulid::Ulid::new());
        let hostile = format!("x/../../{escaped_name}");
        let fetcher = StaticFetcher::new()
            .with(format!("https://cdn.example/{hostile}"), vec![9])
            .with("https://cdn.example/fine.wav", vec![1]);
        let f = fixture(fetcher, Some("bucket"));

        let report = f
            .ingestor
            .handle(&message(8, "", &[hostile.as_str(), "fine.wav"]))
            .await;

        let IngestReport::Attachments(results) = report else {
            panic!("expected attachments");
        };
        assert!(results[0].is_err());
        assert_eq!(
            results[1],
            Ok(StorageKey::new("voice/20250601_083000_8_fine.wav"))
        );
        assert_eq!(f.store.keys("bucket").await.len(), 1);
        // {scratch}/{ts}_x/../../ は scratch の親ディレクトリ
        let escaped = f.scratch.parent().unwrap().join(&escaped_name);
        assert!(!escaped.exists());

        let texts = f.chat.texts().await;
        assert!(texts[0].starts_with(&format!("❌ 音声の保存に失敗: {hostile}")));
        tokio::fs::remove_dir_all(&f.scratch).await.ok();
    }

    #[tokio::test]
    async fn bot_messages_produce_no_side_effects() {
        let fetcher = StaticFetcher::new().with("https://cdn.example/clip.wav", vec![1]);
        let f = fixture(fetcher, Some("bucket"));
        let mut msg = message(7, "", &["clip.wav"]);
        msg.author.bot = true;

        let report = f.ingestor.handle(&msg).await;

        assert_eq!(report, IngestReport::Ignored(IgnoreReason::AuthoredByBot));
        assert!(f.store.keys("bucket").await.is_empty());
        assert!(f.chat.texts().await.is_empty());
    }
}
