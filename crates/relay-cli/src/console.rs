//! 標準入出力をチャットチャンネルの代わりにする
//!
//! - 入力: 1 行 = 1 メッセージ。`http(s)://` で始まるトークンは添付として扱う
//! - 出力: チャンネルへの返信を stdout に書く

use async_trait::async_trait;
use relay_core::domain::{Attachment, Author, ChannelId, ChatMessage, MessageId, ServiceError};
use relay_core::ports::ChatClient;

pub const CONSOLE_CHANNEL: ChannelId = ChannelId(0);

/// 返信を stdout に出す ChatClient
#[derive(Debug, Default)]
pub struct StdoutChat;

#[async_trait]
impl ChatClient for StdoutChat {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), ServiceError> {
        println!("[#{}] {text}", channel.0);
        Ok(())
    }
}

/// 入力 1 行をメッセージにする
pub fn parse_line(id: u64, line: &str) -> ChatMessage {
    let mut words = Vec::new();
    let mut attachments = Vec::new();
    for token in line.split_whitespace() {
        if token.starts_with("http://") || token.starts_with("https://") {
            attachments.push(Attachment::new(filename_of(token), token));
        } else {
            words.push(token);
        }
    }

    ChatMessage {
        id: MessageId(id),
        channel_id: CONSOLE_CHANNEL,
        author: Author {
            id: 0,
            name: "console".into(),
            bot: false,
        },
        content: words.join(" "),
        attachments,
    }
}

/// URL の最後のパス要素（クエリは除く）
fn filename_of(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("attachment")
        .to_string()
}
