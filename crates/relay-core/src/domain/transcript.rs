//! Transcript result artifacts.
//!
//! 外部サービスが書き出した結果 JSON を読むだけで、変更はしません。

use serde::Deserialize;
use url::Url;

use super::errors::RelayError;
use super::storage::{StorageKey, StorageLocation};

/// チャットへ流す本文の最大文字数
pub const MAX_TRANSCRIPT_CHARS: usize = 1900;

/// 切り詰めたときに付ける印
pub const TRUNCATION_MARKER: &str = " ...(省略)";

/// 完了通知の見出し
pub const COMPLETION_HEADER: &str = "🎤 文字起こし完了したよ！";

#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<TranscriptEntry>,
}

#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    transcript: String,
}

/// `results.transcripts[0].transcript` を取り出す
pub fn extract_transcript(json: &[u8]) -> Result<String, RelayError> {
    let doc: TranscriptDocument = serde_json::from_slice(json)
        .map_err(|e| RelayError::MalformedInput(format!("transcript json: {e}")))?;
    doc.results
        .transcripts
        .into_iter()
        .next()
        .map(|t| t.transcript)
        .ok_or_else(|| RelayError::MalformedInput("transcript json has no transcripts".into()))
}

/// 1900 文字を超えたら 1900 文字で切って印を付ける
pub fn truncate_transcript(text: &str) -> String {
    match text.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// チャットへ送る完了メッセージ
pub fn completion_message(transcript: &str) -> String {
    format!("{COMPLETION_HEADER}\n\n{}", truncate_transcript(transcript))
}

/// 結果 URI をストレージ位置に変換する
///
/// - `https://host/{bucket}/{key}`（パス形式）
/// - `s3://{bucket}/{key}`
pub fn parse_transcript_uri(uri: &str) -> Result<StorageLocation, RelayError> {
    let parsed =
        Url::parse(uri).map_err(|e| RelayError::MalformedInput(format!("transcript uri: {e}")))?;
    let path = parsed.path().trim_start_matches('/');

    let (bucket, key) = if parsed.scheme() == "s3" {
        let bucket = parsed.host_str().unwrap_or_default();
        (bucket.to_string(), path.to_string())
    } else {
        match path.split_once('/') {
            Some((bucket, key)) => (bucket.to_string(), key.to_string()),
            None => (String::new(), String::new()),
        }
    };

    if bucket.is_empty() || key.is_empty() {
        return Err(RelayError::MalformedInput(format!(
            "transcript uri has no bucket/key: {uri}"
        )));
    }
    Ok(StorageLocation::new(bucket, StorageKey::new(key)))
}
