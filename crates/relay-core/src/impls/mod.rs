//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryObjectStore / InMemoryTranscriptionService / InMemoryCompute**: 開発・テスト用
//! - **RecordingChat / RecordingNotifier / StaticFetcher**: 記録・固定応答
//! - **LocalObjectStore**: ファイルシステム上のストレージ
//! - **WebhookNotifier / HttpAttachmentFetcher**: reqwest による HTTP 実装
//!
//! # クラウド実装
//! クラウドのストレージ・音声認識・コンピュート API への実装は
//! 同じ ports を実装する別クレートに置きます。

pub mod http_fetcher;
pub mod inmem_compute;
pub mod inmem_store;
pub mod inmem_transcription;
pub mod local_store;
pub mod recording;
pub mod webhook;

pub use self::http_fetcher::HttpAttachmentFetcher;
pub use self::inmem_compute::{ComputeCall, InMemoryCompute};
pub use self::inmem_store::InMemoryObjectStore;
pub use self::inmem_transcription::InMemoryTranscriptionService;
pub use self::local_store::LocalObjectStore;
pub use self::recording::{RecordingChat, RecordingNotifier, StaticFetcher};
pub use self::webhook::{LogNotifier, WebhookNotifier};
