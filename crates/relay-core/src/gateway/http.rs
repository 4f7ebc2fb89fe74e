//! HTTP surface (axum)
//!
//! - `POST /interactions`: 署名付きスラッシュコマンド
//! - `POST /events/transcription`: ジョブ完了イベント → CompletionRelay
//! - `POST /events/transcription/status`: 完了イベントをログに残してそのまま返す
//! - `GET /health`

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{Instrument, info, info_span, warn};

use super::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, verify};
use crate::app::{CommandDispatcher, CompletionRelay};
use crate::domain::{
    CompletionEnvelope, CompletionSummary, Interaction, RelayError, RelayOutcome, ReplyBody,
};
use crate::ports::IdGenerator;

#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub completion_relay: Arc<CompletionRelay>,
    /// 未設定なら /interactions は 500
    pub public_key: Option<String>,
    pub ids: Arc<dyn IdGenerator>,
}

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest { message: String },
    NotFound { message: String },
    Configuration { message: String },
    BadGateway { message: String },
}

impl From<RelayError> for HttpError {
    fn from(error: RelayError) -> Self {
        let message = error.to_string();
        match error {
            RelayError::Authentication => HttpError::Unauthorized,
            RelayError::Configuration(_) => HttpError::Configuration { message },
            RelayError::MalformedInput(_) => HttpError::BadRequest { message },
            RelayError::NotFound(_) => HttpError::NotFound { message },
            RelayError::External { .. } | RelayError::Timeout { .. } => {
                HttpError::BadGateway { message }
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid request signature".to_string()),
            HttpError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            HttpError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            HttpError::Configuration { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
            HttpError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
        };

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/interactions", post(interactions_handler))
        .route("/events/transcription", post(completion_handler))
        .route("/events/transcription/status", post(status_handler))
        .with_state(state)
}

/// `shutdown` が完了するまで待ち受ける
pub async fn serve<F>(addr: SocketAddr, state: GatewayState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "gateway listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

pub async fn interactions_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let request_id = state.ids.generate_request_id();
    let span = info_span!("interaction", request_id = %request_id);
    handle_interaction(state, headers, body).instrument(span).await
}

async fn handle_interaction(
    state: GatewayState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let Some(public_key) = state.public_key.as_deref() else {
        warn!("DISCORD_PUBLIC_KEY is not configured");
        return Err(HttpError::Configuration {
            message: "DISCORD_PUBLIC_KEY が未設定です".into(),
        });
    };

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    if !verify(
        public_key,
        header(TIMESTAMP_HEADER),
        &body,
        header(SIGNATURE_HEADER),
    ) {
        warn!("signature rejected");
        return Err(RelayError::Authentication.into());
    }

    let interaction = Interaction::parse(&body)?;
    info!(?interaction, "command dispatched");
    let reply = state.dispatcher.dispatch(interaction).await.map_err(|e| {
        warn!(error = %e, "command failed");
        HttpError::from(e)
    })?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    Ok(match reply.body {
        ReplyBody::Json(response) => (status, Json(response)).into_response(),
        ReplyBody::Text(text) => (status, text).into_response(),
    })
}

pub async fn completion_handler(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, HttpError> {
    let request_id = state.ids.generate_request_id();
    let span = info_span!("completion_event", request_id = %request_id);
    async move {
        let event = parse_envelope(&body)?.detail;
        info!(job_name = %event.job_name, status = %event.status, "completion event received");

        // 封筒を解釈できた後の失敗はすべて 502（イベントバスに再送させる）
        let outcome = state.completion_relay.handle(&event).await.map_err(|e| {
            warn!(job_name = %event.job_name, error = %e, "completion relay failed");
            HttpError::BadGateway {
                message: e.to_string(),
            }
        })?;

        let result = match outcome {
            RelayOutcome::Skipped(_) => "skipped",
            RelayOutcome::Delivered { .. } => "delivered",
            RelayOutcome::FailureReported { .. } => "failure_reported",
        };
        Ok(Json(json!({
            "job_name": event.job_name,
            "status": event.status,
            "result": result,
        })))
    }
    .instrument(span)
    .await
}

pub async fn status_handler(body: Bytes) -> Result<Json<CompletionSummary>, HttpError> {
    let summary = parse_envelope(&body)?.detail.summary();
    info!(job_name = %summary.job_name, status = %summary.status, "transcription status observed");
    Ok(Json(summary))
}

fn parse_envelope(body: &[u8]) -> Result<CompletionEnvelope, HttpError> {
    serde_json::from_slice(body).map_err(|e| HttpError::BadRequest {
        message: format!("completion event json: {e}"),
    })
}
