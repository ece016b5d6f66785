//! Payment handlers
//!
//! Checkout session creation, the redirect success path (verified against
//! the processor before anything is granted), and the Stripe webhook.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use fictioneer_billing::{PaymentEvent, PaymentProvider, WebhookEventType};
use fictioneer_db::UserRepository;
use fictioneer_types::{CreditPack, PaymentKind, Purchase, UserId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// "premium" for the upgrade, or a credit pack name
    /// ("starter" / "popular" / "large")
    pub purchase: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessResponse {
    pub success: bool,
    pub kind: String,
    pub credits_added: i64,
    pub credits_balance: i64,
    pub is_premium: bool,
    pub already_applied: bool,
}

fn parse_purchase(s: &str) -> ApiResult<Purchase> {
    if s.eq_ignore_ascii_case("premium") {
        return Ok(Purchase::Premium);
    }
    s.parse::<CreditPack>()
        .map(Purchase::Credits)
        .map_err(|_| ApiError::BadRequest(format!("Unknown purchase: {s}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/payments/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    let purchase = parse_purchase(&req.purchase)?;

    let user = state
        .repos
        .users
        .find_by_id(user_id.0)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let session = state
        .provider
        .create_checkout_session(&user.email, user_id, purchase, user.is_premium)
        .await?;

    metrics::counter!("payment_checkouts_created_total").increment(1);
    metrics::histogram!("payment_operation_duration_seconds", "operation" => "create_checkout")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(user_id = %user_id, purchase = %req.purchase, "Checkout session created");

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// GET /api/v1/payments/success?session_id=...
///
/// The session is verified against the processor before any entitlement is
/// granted; query parameters are never trusted for amounts.
pub async fn payment_success(
    State(state): State<AppState>,
    MaybeUser(session_user): MaybeUser,
    Query(query): Query<SuccessQuery>,
) -> ApiResult<Json<PaymentSuccessResponse>> {
    let start = Instant::now();

    let session = state.provider.retrieve_session(&query.session_id).await?;
    if !session.paid {
        return Err(ApiError::PaymentNotVerified);
    }

    let kind = session
        .metadata
        .kind
        .as_deref()
        .and_then(|k| k.parse().ok())
        .unwrap_or(PaymentKind::PremiumSubscription);

    let credits_granted = match kind {
        PaymentKind::PremiumSubscription => 0,
        PaymentKind::CreditPackage => session.metadata.credits.unwrap_or(0),
    };

    let metadata_user_id = session
        .metadata
        .user_id
        .as_deref()
        .and_then(|u| UserId::parse(u).ok());

    let event = PaymentEvent {
        event_id: session.session_id,
        kind,
        credits_granted,
        metadata_user_id,
    };

    let outcome = state.reconciler.apply(event, session_user).await?;

    metrics::counter!("payment_events_applied_total", "path" => "redirect").increment(1);
    metrics::histogram!("payment_operation_duration_seconds", "operation" => "redirect_success")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(PaymentSuccessResponse {
        success: true,
        kind: outcome.kind.to_string(),
        credits_added: outcome.credits_added,
        credits_balance: outcome.credits_balance,
        is_premium: outcome.is_premium,
        already_applied: outcome.duplicate,
    }))
}

/// POST /webhooks/stripe
///
/// Returns 400 only for signature/parse failures. Post-verification
/// failures are logged and queued internally but still acknowledged, so
/// processor retries do not storm the system.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    // Extract Stripe signature header
    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    let event = match state.webhooks.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook verification failed");
            metrics::counter!("payment_webhooks_processed_total", "status" => "rejected")
                .increment(1);
            return StatusCode::BAD_REQUEST;
        }
    };

    if event.event_type != WebhookEventType::CheckoutSessionCompleted {
        metrics::counter!("payment_webhooks_processed_total", "status" => "ignored").increment(1);
        return StatusCode::OK;
    }

    let Some(payment) = event.into_payment_event() else {
        return StatusCode::OK;
    };

    match state.reconciler.apply(payment, None).await {
        Ok(outcome) => {
            metrics::counter!("payment_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::counter!("payment_events_applied_total", "path" => "webhook").increment(1);
            if outcome.duplicate {
                tracing::debug!("Webhook event was already applied");
            }
        }
        Err(e) => {
            // Entitlement gap is already queued by the reconciler; ack so the
            // processor stops retrying
            tracing::error!(error = %e, "Webhook reconciliation failed");
            metrics::counter!("payment_webhooks_processed_total", "status" => "error").increment(1);
        }
    }

    metrics::histogram!("payment_operation_duration_seconds", "operation" => "process_webhook")
        .record(start.elapsed().as_secs_f64());

    StatusCode::OK
}
