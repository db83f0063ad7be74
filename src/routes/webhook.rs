// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Stripe events.
//!
//! Completed checkout sessions go through the same reconciler as the client
//! callback, so whichever arrives first creates the record and the other
//! returns it.

use crate::error::AppError;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Maximum age of a signed event.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 5 * 60;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/stripe", post(handle_event))
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing or malformed signature header")]
    Malformed,
    #[error("timestamp outside tolerance")]
    Expired,
    #[error("no matching signature")]
    Mismatch,
}

/// Verify a `Stripe-Signature` header against the raw payload.
///
/// The header looks like `t=1700000000,v1=<hex>[,v1=<hex>...]`; any `v1`
/// matching HMAC-SHA256(secret, "{t}.{payload}") is accepted.
pub fn verify_signature(
    header: &str,
    payload: &[u8],
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("v1", v)) => {
                if let Ok(sig) = hex::decode(v) {
                    candidates.push(sig);
                }
            }
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    // Unsigned input; an out-of-range t= must not overflow
    let age = now.checked_sub(timestamp).map(i64::unsigned_abs);
    if !matches!(age, Some(secs) if secs <= SIGNATURE_TOLERANCE_SECS as u64) {
        return Err(SignatureError::Expired);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    if candidates
        .iter()
        .any(|sig| bool::from(sig.as_slice().ct_eq(expected.as_slice())))
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[derive(Deserialize, Debug)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Deserialize, Debug)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Deserialize, Debug)]
struct StripeEventObject {
    id: String,
}

/// Handle incoming webhook events (POST).
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
    else {
        tracing::warn!("Webhook rejected: missing signature header");
        return StatusCode::BAD_REQUEST;
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(e) = verify_signature(signature, &body, &state.config.stripe_webhook_secret, now) {
        tracing::warn!(error = %e, "Security Alert: Webhook signature rejected");
        return StatusCode::BAD_REQUEST;
    }

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook event");
            return StatusCode::BAD_REQUEST;
        }
    };

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        "Webhook event received"
    );

    match event.event_type.as_str() {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            let session_id = event.data.object.id;
            match state.reconciler.confirm(None, &session_id).await {
                Ok(result) => {
                    tracing::info!(
                        session_id = %session_id,
                        record_id = %result.confirmation.record_id,
                        replayed = result.confirmation.replayed,
                        "Webhook confirmation complete"
                    );
                    StatusCode::OK
                }
                // Delayed payment methods complete later with their own event
                Err(AppError::PaymentIncomplete(_)) => StatusCode::OK,
                // Ask Stripe to retry when a collaborator was down
                Err(e) if e.is_upstream() => {
                    tracing::error!(session_id = %session_id, error = %e, "Webhook confirmation failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                // Redelivery cannot succeed; paid seat rejections are logged for refund
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Webhook confirmation rejected");
                    StatusCode::OK
                }
            }
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Ignoring unhandled event type");
            StatusCode::OK
        }
    }
}
