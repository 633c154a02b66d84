//! Inbound webhook endpoint.
//!
//! Deliveries are authenticated with the shared secret, routed by the
//! `X-GitHub-Event` header, and acknowledged before the workflow runs.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::context::BotContext;
use crate::event::PullRequestEvent;
use crate::workflow::{self, Outcome};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingSignature | Self::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "invalid signature")
            }
            Self::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "invalid payload"),
        };
        (status, body).into_response()
    }
}

struct WebhookState {
    ctx: Arc<BotContext>,
    secret: String,
}

/// Router serving the webhook on `/`; every other path is a 404.
pub fn router(ctx: Arc<BotContext>, secret: impl Into<String>) -> Router {
    let state = Arc::new(WebhookState {
        ctx,
        secret: secret.into(),
    });
    Router::new().route("/", post(receive)).with_state(state)
}

async fn receive(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;
    verify_signature(&state.secret, &body, signature).inspect_err(|e| {
        warn!(error = %e, "rejected webhook delivery");
    })?;

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match event {
        "pull_request" => {
            let payload: Value = serde_json::from_slice(&body)
                .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
            let event = PullRequestEvent::try_from(&payload)
                .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
            dispatch(state.ctx.clone(), event);
            Ok("ok")
        }
        "ping" => Ok("pong"),
        other => {
            debug!(event = other, "ignoring event");
            Ok("ok")
        }
    }
}

/// Run the workflow for one event on its own task.
fn dispatch(ctx: Arc<BotContext>, event: PullRequestEvent) {
    if !event.is_opened() {
        debug!(action = %event.action, pr = event.number, "ignoring pull_request action");
        return;
    }

    tokio::spawn(async move {
        match workflow::run(&ctx, &event).await {
            Ok(Outcome::Commented { new_entries }) => {
                info!(repo = %event.repo, pr = event.number, new_entries, "report posted");
            }
            Ok(Outcome::Ignored) => {}
            Err(e) => {
                error!(repo = %event.repo, pr = event.number, error = %e, "workflow aborted");
            }
        }
    });
}

/// Check a `sha256=<hex>` signature header against the body.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> Result<(), WebhookError> {
    let hex_digest = header
        .strip_prefix("sha256=")
        .ok_or(WebhookError::InvalidSignature)?;
    let expected = hex::decode(hex_digest).map_err(|_| WebhookError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature)
}
