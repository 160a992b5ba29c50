//! Messenger page webhook handler
//!
//! `GET` answers the subscription handshake, `POST` receives event deliveries.
//! Deliveries are processed to completion before responding; the platform
//! only ever sees 200 for accepted page payloads, so it never redelivers.

pub mod types;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;

use self::types::MessengerWebhook;
use crate::api::ApiState;
use crate::bridge::Outcome;

/// Body returned once a delivery has been processed
pub const OK_BODY: &str = "ok";

/// Body returned for payloads that are not page events
pub const INVALID_OBJECT_BODY: &str = "Invalid object";

/// Body returned when the verify token does not match
pub const TOKEN_MISMATCH_BODY: &str = "Verification token mismatch";

/// Subscription handshake query parameters
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Handle the webhook subscription handshake
///
/// Echoes `hub.challenge` when `hub.verify_token` matches the configured secret.
pub async fn verify(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    let expected = state.verify_token.expose_secret();
    let matches = params
        .verify_token
        .as_deref()
        .is_some_and(|provided| constant_time_eq(expected.as_bytes(), provided.as_bytes()));

    if matches {
        tracing::info!(mode = ?params.mode, "webhook verified");
        (StatusCode::OK, params.challenge.unwrap_or_default())
    } else {
        tracing::warn!("webhook verify token mismatch");
        (StatusCode::FORBIDDEN, TOKEN_MISMATCH_BODY.to_string())
    }
}

/// Handle an event delivery
///
/// # Errors
///
/// Returns error (500) if the conversation store fails; every other per-event
/// failure is logged and the delivery is still acknowledged.
pub async fn handle_event(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> crate::Result<(StatusCode, &'static str)> {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "webhook body is not JSON");
            return Ok((StatusCode::BAD_REQUEST, INVALID_OBJECT_BODY));
        }
    };

    tracing::debug!(%payload, "received webhook data");

    if payload.get("object").and_then(serde_json::Value::as_str) != Some("page") {
        tracing::warn!(object = ?payload.get("object"), "ignoring non-page webhook");
        return Ok((StatusCode::BAD_REQUEST, INVALID_OBJECT_BODY));
    }

    let webhook: MessengerWebhook = match serde_json::from_value(payload) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "malformed page webhook");
            return Ok((StatusCode::BAD_REQUEST, INVALID_OBJECT_BODY));
        }
    };

    let mut replied = 0usize;
    for event in webhook.events() {
        let Some(message) = &event.message else {
            tracing::debug!("skipping non-message event");
            continue;
        };

        let Some(sender_id) = event.sender_id() else {
            tracing::warn!(mid = ?message.mid, "message event without sender");
            continue;
        };

        if message.is_echo {
            tracing::debug!(sender_id, "skipping echo of page message");
            continue;
        }

        let Some(text) = message.text.as_deref() else {
            tracing::debug!(sender_id, "skipping message without text");
            continue;
        };

        if state.bridge.handle_message(sender_id, text).await? == Outcome::Replied {
            replied += 1;
        }
    }

    tracing::debug!(replied, "webhook delivery processed");
    Ok((StatusCode::OK, OK_BODY))
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
