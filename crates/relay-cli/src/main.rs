//! relay CLI
//!
//! - `serve`: HTTP 入口（署名付きコマンド・完了イベント）と、stdin を入力とするチャットループを起動
//! - `register-command`: `ec2` スラッシュコマンドを登録
//!
//! クラウドのストレージ・音声認識・コンピュートの代わりに、ローカルファイルと
//! InMemory 実装をつなぎます。

mod console;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use relay_core::app::{ChatEventLoop, RelayBuilder};
use relay_core::config::{self, RelayConfig};
use relay_core::domain::ChatMessage;
use relay_core::gateway::{self, GatewayState};
use relay_core::impls::{
    HttpAttachmentFetcher, InMemoryCompute, InMemoryTranscriptionService, LocalObjectStore,
    LogNotifier, WebhookNotifier,
};
use relay_core::observability;
use relay_core::ports::{Clock, Notifier, SystemClock};
use relay_core::registration::{self, DEFAULT_API_BASE};

use crate::console::{StdoutChat, parse_line};

#[derive(Parser)]
#[command(author, version, about = "Transcription relay (chat ⇄ storage ⇄ speech-to-text)")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// HTTP 入口とチャットループを起動
    Serve {
        /// 待ち受けアドレス（省略時は RELAY_BIND_ADDR）
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// stdin からメッセージを読まない
        #[arg(long, default_value_t = false)]
        no_stdin: bool,
    },
    /// `ec2` スラッシュコマンドを登録
    #[command(name = "register-command")]
    RegisterCommand {
        #[arg(long, default_value = DEFAULT_API_BASE)]
        api_base: String,
        /// 送信せずに定義 JSON を表示
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_env();
    observability::init_tracing();

    let cli = Cli::parse();
    let config = RelayConfig::from_env().context("invalid configuration")?;

    match cli.cmd {
        Cmd::Serve { bind, no_stdin } => serve(config, bind, !no_stdin).await,
        Cmd::RegisterCommand { api_base, dry_run } => {
            register(config, &api_base, dry_run).await
        }
    }
}

async fn serve(
    config: RelayConfig,
    bind: Option<SocketAddr>,
    read_stdin: bool,
) -> anyhow::Result<()> {
    let addr = bind.unwrap_or(config.bind_addr);
    let http = reqwest::Client::builder()
        .timeout(config.external_timeout)
        .build()
        .context("failed to build http client")?;

    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(http.clone(), url)),
        None => {
            warn!("DISCORD_WEBHOOK_URL is not set; completion messages are logged only");
            Arc::new(LogNotifier)
        }
    };
    let compute = match &config.compute_instance_id {
        Some(id) => InMemoryCompute::with_instance(id, "stopped"),
        None => InMemoryCompute::new(),
    };

    let relay = RelayBuilder::new(config.clone())
        .object_store(Arc::new(LocalObjectStore::new(&config.storage_root)))
        .transcription(Arc::new(InMemoryTranscriptionService::new()))
        .compute(Arc::new(compute))
        .chat(Arc::new(StdoutChat))
        .fetcher(Arc::new(HttpAttachmentFetcher::new(http)))
        .notifier(notifier)
        .build()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for ctrl-c; running until killed");
                std::future::pending::<()>().await;
            }
        }
    });

    let (events_tx, events_rx) = mpsc::channel(32);
    let event_loop = ChatEventLoop::spawn(events_rx, relay.ingestor.clone(), relay.ids.clone());
    if read_stdin {
        tokio::spawn(feed_stdin(events_tx, shutdown_rx.clone()));
    } else {
        drop(events_tx);
    }

    let state = GatewayState {
        dispatcher: relay.dispatcher.clone(),
        completion_relay: relay.completion_relay.clone(),
        public_key: config.discord_public_key.clone(),
        ids: relay.ids.clone(),
    };
    let mut server_shutdown = shutdown_rx;
    gateway::serve(addr, state, async move { stopped(&mut server_shutdown).await })
    .await
    .with_context(|| format!("gateway on {addr} failed"))?;

    let handled = event_loop.shutdown_and_join().await;
    info!(handled, "relay stopped");
    Ok(())
}

/// stdin の各行をチャットイベントとして流す。EOF か shutdown で終わる
async fn feed_stdin(events: mpsc::Sender<ChatMessage>, mut shutdown: watch::Receiver<bool>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let base = SystemClock.now().timestamp_millis().max(0) as u64;
    let mut seq = 0u64;

    loop {
        let line = tokio::select! {
            _ = stopped(&mut shutdown) => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                seq += 1;
                if events.send(parse_line(base + seq, &line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // sender が落ちた場合も停止扱い
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn register(config: RelayConfig, api_base: &str, dry_run: bool) -> anyhow::Result<()> {
    let command = registration::ec2_command();
    if dry_run {
        println!("{}", serde_json::to_string_pretty(&command)?);
        return Ok(());
    }

    let response = registration::register_command(
        &reqwest::Client::new(),
        api_base,
        &config.registration,
        &command,
    )
    .await?;
    println!("{}", response.status);
    println!("{}", response.body);
    Ok(())
}
