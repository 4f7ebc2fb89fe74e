//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（オブジェクトストレージ、音声認識ジョブ、
//! コンピュート操作、チャット、webhook）へのインターフェースを提供し、
//! 実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - 呼び出しをまたぐ状態はすべて外部（ストレージ・ジョブ登録簿）にある
//! - プロセス内にグローバルな可変状態を置かない
//! - テストでは impls の InMemory 実装に差し替える

pub mod chat;
pub mod clock;
pub mod compute;
pub mod id_generator;
pub mod notifier;
pub mod object_store;
pub mod transcription;

pub use self::chat::{AttachmentFetcher, ChatClient};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::compute::ComputeControl;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::Notifier;
pub use self::object_store::ObjectStore;
pub use self::transcription::TranscriptionService;
