//! Chat events and their classification.
//!
//! 受信したメッセージを副作用なしで分類し、I/O はその後の処理に任せます。

use std::path::Path;

use serde::{Deserialize, Serialize};

/// 受け付ける音声の拡張子
pub const ACCEPTED_AUDIO_EXTENSIONS: [&str; 5] = ["ogg", "wav", "mp3", "m4a", "webm"];

/// 既定のトリガーワード
pub const DEFAULT_TRIGGER_KEYWORD: &str = "変換";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
        }
    }

    pub fn is_audio(&self) -> bool {
        is_accepted_audio(&self.filename)
    }
}

/// message-received イベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// classify の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// 本文がトリガーワードと一致した
    TriggerPhrase,
    /// 受け付ける拡張子の添付（元の順序のまま）
    AttachmentBatch(Vec<Attachment>),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// bot 自身の投稿には反応しない
    AuthoredByBot,
    NoAttachments,
    NoAudioAttachments,
}

/// メッセージを分類する
///
/// 判定順:
/// 1. bot の投稿 → Ignored
/// 2. trim した本文がトリガーワードと完全一致 → TriggerPhrase（添付は見ない）
/// 3. 音声の添付があれば AttachmentBatch
pub fn classify(message: &ChatMessage, trigger_keyword: &str) -> InboundEvent {
    if message.author.bot {
        return InboundEvent::Ignored(IgnoreReason::AuthoredByBot);
    }
    if message.content.trim() == trigger_keyword {
        return InboundEvent::TriggerPhrase;
    }
    if message.attachments.is_empty() {
        return InboundEvent::Ignored(IgnoreReason::NoAttachments);
    }
    let audio: Vec<Attachment> = message
        .attachments
        .iter()
        .filter(|a| a.is_audio())
        .cloned()
        .collect();
    if audio.is_empty() {
        InboundEvent::Ignored(IgnoreReason::NoAudioAttachments)
    } else {
        InboundEvent::AttachmentBatch(audio)
    }
}

/// 拡張子（大文字小文字を区別しない）が受け付け対象か
pub fn is_accepted_audio(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_AUDIO_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn message(content: &str, files: &[&str], bot: bool) -> ChatMessage {
        ChatMessage {
            id: MessageId(7),
            channel_id: ChannelId(1),
            author: Author {
                id: 99,
                name: "user".into(),
                bot,
            },
            content: content.into(),
            attachments: files
                .iter()
                .map(|f| Attachment::new(*f, format!("https://cdn.example/{f}")))
                .collect(),
        }
    }

    #[rstest]
    #[case::ogg("a.ogg", true)]
    #[case::upper_wav("A.WAV", true)]
    #[case::mp3("x.y.mp3", true)]
    #[case::m4a("voice.M4a", true)]
    #[case::webm("v.webm", true)]
    #[case::png("image.png", false)]
    #[case::no_ext("wav", false)]
    #[case::suffix_only(".wav", false)]
    fn accepted_extensions(#[case] filename: &str, #[case] expected: bool) {
        assert_eq!(is_accepted_audio(filename), expected);
    }

    #[test]
    fn bot_messages_are_ignored_even_with_keyword() {
        let msg = message("変換", &["clip.wav"], true);
        assert_eq!(
            classify(&msg, DEFAULT_TRIGGER_KEYWORD),
            InboundEvent::Ignored(IgnoreReason::AuthoredByBot)
        );
    }

    #[test]
    fn trigger_phrase_wins_over_attachments() {
        let msg = message("  変換\n", &["clip.wav"], false);
        assert_eq!(
            classify(&msg, DEFAULT_TRIGGER_KEYWORD),
            InboundEvent::TriggerPhrase
        );
    }

    #[test]
    fn keyword_must_match_exactly() {
        let msg = message("変換して", &[], false);
        assert_eq!(
            classify(&msg, DEFAULT_TRIGGER_KEYWORD),
            InboundEvent::Ignored(IgnoreReason::NoAttachments)
        );
    }

    #[test]
    fn attachment_batch_keeps_order_and_drops_non_audio() {
        let msg = message("", &["b.mp3", "image.png", "a.ogg"], false);
        let InboundEvent::AttachmentBatch(batch) = classify(&msg, DEFAULT_TRIGGER_KEYWORD) else {
            panic!("expected batch");
        };
        let names: Vec<&str> = batch.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["b.mp3", "a.ogg"]);
    }

    #[test]
    fn only_non_audio_is_ignored() {
        let msg = message("look", &["image.png"], false);
        assert_eq!(
            classify(&msg, DEFAULT_TRIGGER_KEYWORD),
            InboundEvent::Ignored(IgnoreReason::NoAudioAttachments)
        );
    }
}
