//! チャット → ストレージ → ジョブ起動 → 完了イベント → 通知 までを InMemory でつなぐ

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use ed25519_dalek::{Signer, SigningKey};
use tokio::sync::mpsc;

use relay_core::app::{ChatEventLoop, RelayBuilder};
use relay_core::config::RelayConfig;
use relay_core::domain::{
    Attachment, Author, ChannelId, ChatMessage, CompletionEvent, JobStatus, MessageId,
    RelayOutcome, StorageKey,
};
use relay_core::gateway::GatewayState;
use relay_core::gateway::http::interactions_handler;
use relay_core::gateway::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use relay_core::impls::{
    InMemoryCompute, InMemoryObjectStore, InMemoryTranscriptionService, RecordingChat,
    RecordingNotifier, StaticFetcher,
};
use relay_core::ports::{Clock, FixedClock, ObjectStore};

fn message(id: u64, content: &str, files: &[&str]) -> ChatMessage {
    ChatMessage {
        id: MessageId(id),
        channel_id: ChannelId(500),
        author: Author {
            id: 3,
            name: "carol".into(),
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
async fn voice_message_round_trip() {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(InMemoryObjectStore::with_clock(clock.clone()));
    let transcription = Arc::new(InMemoryTranscriptionService::new());
    let chat = Arc::new(RecordingChat::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let scratch = std::env::temp_dir().join(format!("relay-pipeline-{}", ulid::Ulid::new()));

    let config = RelayConfig {
        s3_bucket: Some("bucket".into()),
        s3_prefix: Some("voice".into()),
        scratch_dir: scratch.clone(),
        ..RelayConfig::default()
    };
    let relay = RelayBuilder::new(config)
        .object_store(store.clone())
        .transcription(transcription.clone())
        .compute(Arc::new(InMemoryCompute::new()))
        .chat(chat.clone())
        .fetcher(Arc::new(
            StaticFetcher::new().with("https://cdn.example/memo.m4a", b"m4a-bytes".to_vec()),
        ))
        .notifier(notifier.clone())
        .clock(clock)
        .build()
        .unwrap();

    // 1. 音声を投稿 → 2. 「変換」
    let (tx, rx) = mpsc::channel(4);
    let event_loop = ChatEventLoop::spawn(rx, relay.ingestor.clone(), relay.ids.clone());
    tx.send(message(1, "", &["memo.m4a"])).await.unwrap();
    tx.send(message(2, "変換", &[])).await.unwrap();
    drop(tx);
    assert_eq!(event_loop.join().await, 2);

    let stored = StorageKey::new("voice/20250701_120000_1_memo.m4a");
    assert_eq!(store.keys("bucket").await, vec![stored.clone()]);

    let jobs = transcription.started_jobs().await;
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.source.key, stored);
    assert_eq!(job.media_format, "m4a");
    assert!(job.name.as_str().starts_with("discord-"));
    assert!(job.name.as_str().ends_with("-20250701_120000_1_memo.m4a"));

    let replies = chat.texts().await;
    assert_eq!(replies.len(), 2);
    assert!(replies[1].contains(job.name.as_str()));

    // 3. 外部サービスが結果を書き出して完了
    store
        .put(
            "bucket",
            &job.output.key,
            r#"{"results":{"transcripts":[{"transcript":"会議は三時からです"}]}}"#.as_bytes().to_vec(),
        )
        .await
        .unwrap();
    transcription
        .complete(
            &job.name,
            format!("https://s3.ap-northeast-1.amazonaws.com/bucket/{}", job.output.key),
        )
        .await;

    // 4. 完了イベント（重複配送を含む）
    let event = CompletionEvent::new(job.name.clone(), JobStatus::Completed);
    for _ in 0..2 {
        let outcome = relay.completion_relay.handle(&event).await.unwrap();
        assert!(matches!(outcome, RelayOutcome::Delivered { .. }));
    }
    assert_eq!(
        notifier.notifications().await,
        vec!["🎤 文字起こし完了したよ！\n\n会議は三時からです".to_string(); 2]
    );

    tokio::fs::remove_dir_all(&scratch).await.ok();
}

#[tokio::test]
async fn signed_status_command_through_the_gateway() {
    let key = SigningKey::from_bytes(&[42u8; 32]);
    let config = RelayConfig {
        discord_public_key: Some(hex::encode(key.verifying_key().to_bytes())),
        compute_instance_id: Some("i-0abc".into()),
        ..RelayConfig::default()
    };
    let relay = RelayBuilder::new(config.clone())
        .object_store(Arc::new(InMemoryObjectStore::new()))
        .transcription(Arc::new(InMemoryTranscriptionService::new()))
        .compute(Arc::new(InMemoryCompute::with_instance("i-0abc", "running")))
        .chat(Arc::new(RecordingChat::new()))
        .fetcher(Arc::new(StaticFetcher::new()))
        .notifier(Arc::new(RecordingNotifier::new()))
        .build()
        .unwrap();
    let state = GatewayState {
        dispatcher: relay.dispatcher.clone(),
        completion_relay: relay.completion_relay.clone(),
        public_key: config.discord_public_key.clone(),
        ids: relay.ids.clone(),
    };

    let body = r#"{"type":2,"data":{"options":[{"value":"status"}]}}"#;
    let timestamp = "1751371200";
    let mut signed = timestamp.as_bytes().to_vec();
    signed.extend_from_slice(body.as_bytes());
    let mut headers = HeaderMap::new();
    headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static("1751371200"));
    headers.insert(
        SIGNATURE_HEADER,
        HeaderValue::from_str(&hex::encode(key.sign(&signed).to_bytes())).unwrap(),
    );

    let response = interactions_handler(State(state), headers, Bytes::from(body))
        .await
        .map_err(|e| e.into_response().status())
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["type"], 4);
    assert_eq!(value["data"]["content"], "現在の状態: running");
}
