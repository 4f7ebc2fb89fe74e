//! Gateway - 署名付き HTTP 入口
//!
//! - **signature**: Ed25519 署名検証（純粋な述語）
//! - **http**: axum のルーターとハンドラ

pub mod http;
pub mod signature;

pub use self::http::{GatewayState, HttpError, router, serve};
pub use self::signature::verify;
