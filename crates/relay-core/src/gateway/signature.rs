//! Signature Verifier - Ed25519 の分離署名を検証する
//!
//! 署名対象は `timestamp` の文字列と生ボディのバイト列をそのまま連結したもの。
//! ボディを再シリアライズすると署名が合わなくなるので、受け取ったバイト列を使います。

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;
use tracing::debug;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error)]
enum SignatureError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("{0} is not valid hex")]
    Hex(&'static str),

    #[error("public key must be 32 bytes")]
    KeyLength,

    #[error(transparent)]
    Crypto(#[from] ed25519_dalek::SignatureError),
}

/// 署名が正しければ true。不正な入力はすべて false（panic もエラーもなし）
pub fn verify(
    public_key_hex: &str,
    timestamp: Option<&str>,
    raw_body: &[u8],
    signature_hex: Option<&str>,
) -> bool {
    match check(public_key_hex, timestamp, raw_body, signature_hex) {
        Ok(()) => true,
        Err(e) => {
            debug!(reason = %e, "signature check failed");
            false
        }
    }
}

fn check(
    public_key_hex: &str,
    timestamp: Option<&str>,
    raw_body: &[u8],
    signature_hex: Option<&str>,
) -> Result<(), SignatureError> {
    let timestamp = timestamp
        .filter(|t| !t.is_empty())
        .ok_or(SignatureError::Missing(TIMESTAMP_HEADER))?;
    let signature_hex = signature_hex
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing(SIGNATURE_HEADER))?;

    let key_bytes: [u8; 32] = hex::decode(public_key_hex.trim())
        .map_err(|_| SignatureError::Hex("public key"))?
        .try_into()
        .map_err(|_| SignatureError::KeyLength)?;
    let key = VerifyingKey::from_bytes(&key_bytes)?;

    let signature_bytes =
        hex::decode(signature_hex).map_err(|_| SignatureError::Hex("signature"))?;
    let signature = Signature::from_slice(&signature_bytes)?;

    let mut message = Vec::with_capacity(timestamp.len() + raw_body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(raw_body);

    key.verify(&message, &signature)?;
    Ok(())
}
