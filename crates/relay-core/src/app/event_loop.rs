//! ChatEventLoop - チャットイベントを 1 件ずつ処理するループ
//!
//! - 受信チャネルから 1 件取り出して AudioIngestor に渡す
//! - 1 件の失敗でループは止まらない（ingestor が失敗をメッセージに変換済み）
//! - `shutdown_tx` で停止。処理中のイベントは最後まで処理する

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span};

use super::ingestor::AudioIngestor;
use crate::domain::ChatMessage;
use crate::ports::IdGenerator;

/// ループのハンドル
/// - `request_shutdown()` で新しいイベントの受け取りをやめる
/// - `shutdown_and_join()` で終了まで待つ
pub struct ChatEventLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<usize>,
}

impl ChatEventLoop {
    pub fn spawn(
        events: mpsc::Receiver<ChatMessage>,
        ingestor: Arc<AudioIngestor>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(run(events, ingestor, ids, shutdown_rx));
        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // receiver が先に落ちていても気にしない
        let _ = self.shutdown_tx.send(true);
    }

    /// 停止して、処理したイベント数を返す
    pub async fn shutdown_and_join(self) -> usize {
        self.request_shutdown();
        self.join.await.unwrap_or_default()
    }

    /// 送信側がすべて drop されるまで待つ
    pub async fn join(self) -> usize {
        self.join.await.unwrap_or_default()
    }
}

async fn run(
    mut events: mpsc::Receiver<ChatMessage>,
    ingestor: Arc<AudioIngestor>,
    ids: Arc<dyn IdGenerator>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> usize {
    let mut handled = 0;
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let message = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            message = events.recv() => message,
        };

        let Some(message) = message else {
            debug!("event source closed");
            break;
        };

        let event_id = ids.generate_event_id();
        let span = info_span!(
            "chat_event",
            event_id = %event_id,
            message_id = message.id.0,
            channel_id = message.channel_id.0
        );
        let report = ingestor.handle(&message).instrument(span).await;
        debug!(event_id = %event_id, ?report, "event handled");
        handled += 1;
    }
    info!(handled, "chat event loop stopped");
    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ingestor::IngestSettings;
    use crate::app::launcher::JobLauncher;
    use crate::domain::{Attachment, Author, ChannelId, MessageId};
    use crate::impls::{InMemoryObjectStore, InMemoryTranscriptionService, RecordingChat, StaticFetcher};
    use crate::ports::{Clock, FixedClock, UlidGenerator};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn message(id: u64, content: &str, files: &[&str]) -> ChatMessage {
        ChatMessage {
            id: MessageId(id),
            channel_id: ChannelId(77),
            author: Author {
                id: 9,
                name: "bob".into(),
                bot: false,
            },
            content: content.into(),
            attachments: files
                .iter()
                .map(|f| Attachment::new(*f, format!("https://cdn.example/{f}")))
                .collect(),
        }
    }

    fn ingestor(chat: Arc<RecordingChat>, store: Arc<InMemoryObjectStore>) -> Arc<AudioIngestor> {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        ));
        let timeout = Duration::from_secs(5);
        let launcher = Arc::new(JobLauncher::new(
            Arc::new(InMemoryTranscriptionService::new()),
            clock.clone(),
            "ja-JP",
            timeout,
        ));
        Arc::new(AudioIngestor::new(
            store,
            Arc::new(StaticFetcher::new().with("https://cdn.example/ok.ogg", vec![1, 2])),
            chat,
            launcher,
            clock,
            IngestSettings {
                bucket: Some("bucket".into()),
                prefix: Some("voice".into()),
                trigger_keyword: "変換".into(),
                scratch_dir: std::env::temp_dir()
                    .join(format!("relay-loop-{}", ulid::Ulid::new())),
                timeout,
            },
        ))
    }

    fn ids() -> Arc<dyn IdGenerator> {
        Arc::new(UlidGenerator::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )))
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_loop() {
        let chat = Arc::new(RecordingChat::new());
        let store = Arc::new(InMemoryObjectStore::new());
        let (tx, rx) = mpsc::channel(8);
        let handle = ChatEventLoop::spawn(rx, ingestor(chat.clone(), store.clone()), ids());

        // 1 件目: 音声が無いので失敗メッセージ
        tx.send(message(1, "変換", &[])).await.unwrap();
        // 2 件目: 取得できない添付
        tx.send(message(2, "", &["gone.wav"])).await.unwrap();
        // 3 件目: 正常に保存される
        tx.send(message(3, "", &["ok.ogg"])).await.unwrap();
        drop(tx);

        assert_eq!(handle.join().await, 3);

        let texts = chat.texts().await;
        assert_eq!(texts.len(), 3);
        assert!(texts[0].starts_with("❌ 変換開始に失敗"));
        assert!(texts[1].starts_with("❌ 音声の保存に失敗"));
        assert!(texts[2].starts_with("音声を受信しました。"));
        assert_eq!(store.keys("bucket").await.len(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_loop() {
        let chat = Arc::new(RecordingChat::new());
        let (tx, rx) = mpsc::channel::<ChatMessage>(1);
        let handle = ChatEventLoop::spawn(
            rx,
            ingestor(chat.clone(), Arc::new(InMemoryObjectStore::new())),
            ids(),
        );

        let handled = tokio::time::timeout(Duration::from_secs(1), handle.shutdown_and_join())
            .await
            .unwrap();

        assert_eq!(handled, 0);
        assert!(chat.texts().await.is_empty());
        drop(tx);
    }
}
