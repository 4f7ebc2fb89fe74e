//! Configuration - 環境変数から設定を読み込む
//!
//! `.env`（または `RELAY_ENV_PATH` が指すファイル）を dotenvy で読み込んでから、
//! 環境変数を RelayConfig に詰めます。必須かどうかは経路ごとに異なるため、
//! 多くの値は Option のまま保持し、使う側で ConfigurationError にします。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::chat::DEFAULT_TRIGGER_KEYWORD;

pub const DEFAULT_LANGUAGE_CODE: &str = "ja-JP";
pub const DEFAULT_SCRATCH_DIR: &str = "tmp_audio";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STORAGE_ROOT: &str = "relay-data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} is not a valid socket address: {value:?}")]
    InvalidAddress { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// 署名検証用の公開鍵（hex）
    pub discord_public_key: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub compute_instance_id: Option<String>,
    pub webhook_url: Option<String>,
    pub trigger_keyword: String,
    pub language_code: String,
    pub scratch_dir: PathBuf,
    pub external_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub storage_root: PathBuf,
    pub registration: RegistrationConfig,
}

/// スラッシュコマンド登録にだけ使う値
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationConfig {
    pub application_id: Option<String>,
    pub guild_id: Option<String>,
    pub bot_token: Option<String>,
}

/// `.env` を読み込む。読み込み失敗は無視する
pub fn load_env() {
    if let Ok(path) = std::env::var("RELAY_ENV_PATH") {
        dotenvy::from_path(path).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の lookup から組み立てる（テスト用に差し替え可能）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空文字は未設定として扱う
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let external_timeout = match get("EXTERNAL_CALL_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        key: "EXTERNAL_CALL_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
        };

        let bind_raw = get("RELAY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddress {
                key: "RELAY_BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        Ok(Self {
            discord_public_key: get("DISCORD_PUBLIC_KEY"),
            s3_bucket: get("S3_BUCKET"),
            s3_prefix: get("S3_PREFIX").map(|p| p.trim_end_matches('/').to_string()),
            compute_instance_id: get("COMPUTE_INSTANCE_ID"),
            webhook_url: get("DISCORD_WEBHOOK_URL"),
            trigger_keyword: get("TRIGGER_KEYWORD")
                .map(|k| k.trim().to_string())
                .unwrap_or_else(|| DEFAULT_TRIGGER_KEYWORD.to_string()),
            language_code: get("TRANSCRIBE_LANGUAGE_CODE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
            scratch_dir: get("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR)),
            external_timeout,
            bind_addr,
            storage_root: get("RELAY_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
            registration: RegistrationConfig {
                application_id: get("DISCORD_APPLICATION_ID"),
                guild_id: get("DISCORD_GUILD_ID"),
                bot_token: get("DISCORD_BOT_TOKEN"),
            },
        })
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            discord_public_key: None,
            s3_bucket: None,
            s3_prefix: None,
            compute_instance_id: None,
            webhook_url: None,
            trigger_keyword: DEFAULT_TRIGGER_KEYWORD.to_string(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            external_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            registration: RegistrationConfig::default(),
        }
    }
}
