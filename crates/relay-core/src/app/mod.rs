//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **JobLauncher**: ストレージキーから文字起こしジョブを起動
//! - **AudioIngestor**: チャットイベントを分類し、音声を保存 / ジョブを起動
//! - **CompletionRelay**: 完了イベントから結果を取り出してチャンネルへ届ける
//! - **CommandDispatcher**: 検証済みの Interaction をコンピュート操作に振り分ける
//! - **ChatEventLoop**: チャットイベントを 1 件ずつ処理するループ
//! - **RelayBuilder**: ports のワイヤリングと起動時検証

pub mod builder;
pub mod dispatcher;
pub mod event_loop;
pub mod ingestor;
pub mod launcher;
pub mod relay;

pub use self::builder::{BuildError, Relay, RelayBuilder};
pub use self::dispatcher::{CommandDispatcher, UNKNOWN_ACTION_MESSAGE};
pub use self::event_loop::ChatEventLoop;
pub use self::ingestor::{AudioIngestor, IngestReport, IngestSettings};
pub use self::launcher::JobLauncher;
pub use self::relay::CompletionRelay;

use std::future::Future;
use std::time::Duration;

use crate::domain::{RelayError, ServiceError};

/// 外部呼び出しを上限時間付きで待つ
///
/// 期限切れは `RelayError::Timeout`、port のエラーは `RelayError::External` になる。
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(|source| RelayError::external(operation, source)),
        Err(_) => Err(RelayError::Timeout {
            operation,
            after: limit,
        }),
    }
}
