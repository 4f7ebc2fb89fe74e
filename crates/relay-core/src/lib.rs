//! relay-core
//!
//! Core building blocks for the transcription relay.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, storage, job, chat, interaction, transcript, completion, errors）
//! - **ports**: 抽象化レイヤー（ObjectStore, TranscriptionService, ComputeControl, ChatClient, Notifier, など）
//! - **impls**: 実装（InMemory / ローカルファイル / reqwest）
//! - **app**: アプリケーションロジック（ingestor, launcher, relay, dispatcher, event_loop, builder）
//! - **gateway**: 署名検証と HTTP 入口（axum）
//! - **config**: 環境変数からの設定
//! - **observability**: tracing の初期化
//! - **registration**: スラッシュコマンドの登録

pub mod app;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod registration;
