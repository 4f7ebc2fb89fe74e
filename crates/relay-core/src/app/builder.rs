//! RelayBuilder - ports のワイヤリングと起動時検証
//!
//! # Fail-fast 設計
//! - 必須の port（ストレージ、音声認識、コンピュート、チャット、取得、通知）が
//!   すべて渡されているかを build() 時にチェック
//! - 不足があれば BuildError を返す
//! - Clock / IdGenerator は省略時にシステム時刻・ULID を使う

use std::sync::Arc;

use super::dispatcher::CommandDispatcher;
use super::ingestor::{AudioIngestor, IngestSettings};
use super::launcher::JobLauncher;
use super::relay::CompletionRelay;
use crate::config::RelayConfig;
use crate::ports::{
    AttachmentFetcher, ChatClient, Clock, ComputeControl, IdGenerator, Notifier, ObjectStore,
    SystemClock, TranscriptionService, UlidGenerator,
};

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These collaborators must be provided before build().")]
    MissingPorts(Vec<&'static str>),
}

/// RelayBuilder はコンポーネントを組み立てる
///
/// # 使用例
/// ```ignore
/// let relay = RelayBuilder::new(config)
///     .object_store(Arc::new(InMemoryObjectStore::new()))
///     .transcription(Arc::new(InMemoryTranscriptionService::new()))
///     .compute(Arc::new(InMemoryCompute::new()))
///     .chat(chat)
///     .fetcher(fetcher)
///     .notifier(notifier)
///     .build()?;
/// ```
pub struct RelayBuilder {
    config: RelayConfig,
    store: Option<Arc<dyn ObjectStore>>,
    transcription: Option<Arc<dyn TranscriptionService>>,
    compute: Option<Arc<dyn ComputeControl>>,
    chat: Option<Arc<dyn ChatClient>>,
    fetcher: Option<Arc<dyn AttachmentFetcher>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl RelayBuilder {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            store: None,
            transcription: None,
            compute: None,
            chat: None,
            fetcher: None,
            notifier: None,
            clock: None,
            ids: None,
        }
    }

    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transcription(mut self, service: Arc<dyn TranscriptionService>) -> Self {
        self.transcription = Some(service);
        self
    }

    pub fn compute(mut self, compute: Arc<dyn ComputeControl>) -> Self {
        self.compute = Some(compute);
        self
    }

    pub fn chat(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// 全 port が揃っていれば Relay を組み立てる
    pub fn build(self) -> Result<Relay, BuildError> {
        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("object_store");
        }
        if self.transcription.is_none() {
            missing.push("transcription");
        }
        if self.compute.is_none() {
            missing.push("compute");
        }
        if self.chat.is_none() {
            missing.push("chat");
        }
        if self.fetcher.is_none() {
            missing.push("fetcher");
        }
        if self.notifier.is_none() {
            missing.push("notifier");
        }

        let (
            Some(store),
            Some(transcription),
            Some(compute),
            Some(chat),
            Some(fetcher),
            Some(notifier),
        ) = (
            self.store,
            self.transcription,
            self.compute,
            self.chat,
            self.fetcher,
            self.notifier,
        )
        else {
            return Err(BuildError::MissingPorts(missing));
        };

        let config = self.config;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let timeout = config.external_timeout;

        let launcher = Arc::new(JobLauncher::new(
            transcription.clone(),
            clock.clone(),
            config.language_code.clone(),
            timeout,
        ));
        let ingestor = Arc::new(AudioIngestor::new(
            store.clone(),
            fetcher,
            chat,
            launcher.clone(),
            clock,
            IngestSettings {
                bucket: config.s3_bucket.clone(),
                prefix: config.s3_prefix.clone(),
                trigger_keyword: config.trigger_keyword.clone(),
                scratch_dir: config.scratch_dir.clone(),
                timeout,
            },
        ));
        let completion_relay = Arc::new(CompletionRelay::new(
            transcription,
            store,
            notifier,
            timeout,
        ));
        let dispatcher = Arc::new(CommandDispatcher::new(
            compute,
            config.compute_instance_id.clone(),
            timeout,
        ));

        Ok(Relay {
            config,
            ingestor,
            launcher,
            completion_relay,
            dispatcher,
            ids,
        })
    }
}

/// 組み立て済みのコンポーネント一式
pub struct Relay {
    pub config: RelayConfig,
    pub ingestor: Arc<AudioIngestor>,
    pub launcher: Arc<JobLauncher>,
    pub completion_relay: Arc<CompletionRelay>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub ids: Arc<dyn IdGenerator>,
}
