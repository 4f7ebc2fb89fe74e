//! Errors - エラー型と分類
//!
//! # 分類
//! - **Authentication**: 署名が無い・不正（常に 401）
//! - **Configuration**: 必須の設定値が無い（500 またはチャンネルへのメッセージ）
//! - **NotFound**: 変換対象の音声が無い（ユーザー向けメッセージ）
//! - **External / Timeout**: ストレージ・ジョブサービスの失敗
//! - **MalformedInput**: 解釈できない入力

use std::time::Duration;

use thiserror::Error;

/// ErrorKind は実行エラーの運用分類
///
/// - Transient: 一時的なエラー（再送で回復しうる）
/// - Permanent: 恒久的なエラー（再送しても無意味）
/// - Infrastructure: 外部サービス側の障害
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// ServiceError は port（外部コラボレータ）が返すエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// RelayError はドメインエラー
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request signature")]
    Authentication,

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{service} call failed: {source}")]
    External {
        service: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl RelayError {
    pub fn external(service: &'static str, source: ServiceError) -> Self {
        Self::External { service, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Authentication
            | RelayError::Configuration(_)
            | RelayError::NotFound(_)
            | RelayError::MalformedInput(_) => ErrorKind::Permanent,
            RelayError::Timeout { .. } => ErrorKind::Transient,
            RelayError::External { source, .. } => match source {
                ServiceError::Unavailable(_) => ErrorKind::Transient,
                ServiceError::NotFound(_) | ServiceError::Rejected(_) => ErrorKind::Infrastructure,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_error_message_names_service() {
        let err = RelayError::external("object-store", ServiceError::Unavailable("503".into()));
        assert_eq!(err.to_string(), "object-store call failed: unavailable: 503");
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn user_facing_conditions_are_permanent() {
        assert_eq!(
            RelayError::NotFound("no audio".into()).kind(),
            ErrorKind::Permanent
        );
        assert_eq!(
            RelayError::Configuration("missing".into()).kind(),
            ErrorKind::Permanent
        );
    }

    #[test]
    fn timeout_is_transient() {
        let err = RelayError::Timeout {
            operation: "transcription.start",
            after: Duration::from_secs(3),
        };
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.to_string().contains("transcription.start"));
    }
}
