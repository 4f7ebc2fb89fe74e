//! Slash-command registration
//!
//! `ec2` ギルドコマンド（必須の文字列オプション `action`: start / stop / status）を
//! チャットプラットフォームの application commands エンドポイントに登録します。

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::RegistrationConfig;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// オプション型 3 = STRING
const OPTION_TYPE_STRING: u8 = 3;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{0} is not set")]
    MissingSetting(&'static str),

    #[error("registration request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub required: bool,
    pub choices: Vec<CommandChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandChoice {
    pub name: String,
    pub value: String,
}

impl CommandChoice {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// `/ec2 action:<start|stop|status>`
pub fn ec2_command() -> CommandDefinition {
    CommandDefinition {
        name: "ec2".into(),
        description: "EC2 を操作します".into(),
        options: vec![CommandOption {
            name: "action".into(),
            description: "start / stop / status を指定".into(),
            kind: OPTION_TYPE_STRING,
            required: true,
            choices: vec![
                CommandChoice::new("起動", "start"),
                CommandChoice::new("停止", "stop"),
                CommandChoice::new("状態確認", "status"),
            ],
        }],
    }
}

/// 登録先 URL
pub fn commands_url(api_base: &str, application_id: &str, guild_id: &str) -> String {
    format!(
        "{}/applications/{application_id}/guilds/{guild_id}/commands",
        api_base.trim_end_matches('/')
    )
}

/// 応答のステータスと本文
#[derive(Debug, Clone)]
pub struct RegistrationResponse {
    pub status: u16,
    pub body: String,
}

pub async fn register_command(
    client: &reqwest::Client,
    api_base: &str,
    config: &RegistrationConfig,
    command: &CommandDefinition,
) -> Result<RegistrationResponse, RegistrationError> {
    let application_id = config
        .application_id
        .as_deref()
        .ok_or(RegistrationError::MissingSetting("DISCORD_APPLICATION_ID"))?;
    let guild_id = config
        .guild_id
        .as_deref()
        .ok_or(RegistrationError::MissingSetting("DISCORD_GUILD_ID"))?;
    let token = config
        .bot_token
        .as_deref()
        .ok_or(RegistrationError::MissingSetting("DISCORD_BOT_TOKEN"))?;

    let url = commands_url(api_base, application_id, guild_id);
    let response = client
        .post(&url)
        .header(reqwest::header::AUTHORIZATION, format!("Bot {token}"))
        .json(command)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;
    info!(status, command = %command.name, "command registration responded");
    Ok(RegistrationResponse { status, body })
}
