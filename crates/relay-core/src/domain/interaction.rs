//! Interactions (slash-command requests) and their replies.
//!
//! Interaction は署名検証が通った後にだけ組み立てられます。

use serde::{Deserialize, Serialize};

use super::errors::RelayError;

/// PING / PONG
pub const INTERACTION_TYPE_PING: u64 = 1;
/// スラッシュコマンド
pub const INTERACTION_TYPE_COMMAND: u64 = 2;

/// レスポンス type: PONG
pub const RESPONSE_TYPE_PONG: u8 = 1;
/// レスポンス type: 即時メッセージ
pub const RESPONSE_TYPE_MESSAGE: u8 = 4;

/// コンピュートインスタンスへの操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Status,
}

impl Action {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Action::Start),
            "stop" => Some(Action::Stop),
            "status" => Some(Action::Status),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Status => "status",
        }
    }
}

/// 検証済みのリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Handshake,
    /// `action` が None のときは未知の値、もしくは option が無い
    ActionCommand {
        action: Option<Action>,
        requested: Option<String>,
    },
    /// 1 / 2 以外の type。整数でない値や欠落もここに入る
    Unsupported(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    #[serde(rename = "type", default)]
    kind: serde_json::Value,
    #[serde(default)]
    data: Option<RawCommandData>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCommandData {
    #[serde(default)]
    options: Vec<RawOption>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    value: Option<serde_json::Value>,
}

impl Interaction {
    /// 検証済みの生ボディを解釈する
    pub fn parse(body: &[u8]) -> Result<Self, RelayError> {
        let raw: RawInteraction = serde_json::from_slice(body)
            .map_err(|e| RelayError::MalformedInput(format!("interaction json: {e}")))?;

        Ok(match raw.kind.as_u64() {
            Some(INTERACTION_TYPE_PING) => Interaction::Handshake,
            Some(INTERACTION_TYPE_COMMAND) => {
                let requested = raw
                    .data
                    .unwrap_or_default()
                    .options
                    .into_iter()
                    .next()
                    .and_then(|opt| opt.value)
                    .map(|value| match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    });
                let action = requested.as_deref().and_then(Action::parse);
                Interaction::ActionCommand { action, requested }
            }
            _ => Interaction::Unsupported(raw.kind),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    pub content: String,
}

/// チャットプラットフォームへ返す JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_TYPE_PONG,
            data: None,
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_TYPE_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
            }),
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Json(InteractionResponse),
    Text(String),
}

/// ディスパッチ結果。シリアライズして返したら捨てる
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl CommandReply {
    pub fn json(body: InteractionResponse) -> Self {
        Self {
            status: 200,
            body: ReplyBody::Json(body),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: ReplyBody::Text(body.into()),
        }
    }

    pub fn response(&self) -> Option<&InteractionResponse> {
        match &self.body {
            ReplyBody::Json(r) => Some(r),
            ReplyBody::Text(_) => None,
        }
    }
}
