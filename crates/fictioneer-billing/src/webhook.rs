//! Stripe webhook handling
//!
//! Signature verification and event parsing. Only
//! `checkout.session.completed` carries an entitlement; everything else is
//! acknowledged and ignored.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

use fictioneer_types::{PaymentKind, UserId};

use crate::error::BillingError;
use crate::reconciler::PaymentEvent;

/// Maximum age of a webhook timestamp before it is rejected as a replay
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutSessionCompleted,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Checkout session id, when the event carries one
    pub session_id: Option<String>,
    /// Session metadata
    pub metadata: HashMap<String, String>,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

impl WebhookEvent {
    /// Convert to a reconcilable payment event.
    ///
    /// Returns `None` for event types that grant nothing. The idempotency
    /// key is the checkout session id, so a webhook and a redirect for the
    /// same purchase collapse into one application.
    pub fn into_payment_event(self) -> Option<PaymentEvent> {
        if self.event_type != WebhookEventType::CheckoutSessionCompleted {
            return None;
        }

        let event_id = self.session_id.unwrap_or(self.id);

        // Sessions created before kind metadata existed were premium
        // upgrades; fall back accordingly
        let kind = self
            .metadata
            .get("kind")
            .and_then(|k| k.parse().ok())
            .unwrap_or(PaymentKind::PremiumSubscription);

        let credits_granted = match kind {
            PaymentKind::PremiumSubscription => 0,
            PaymentKind::CreditPackage => self
                .metadata
                .get("credits")
                .and_then(|c| c.parse().ok())
                .unwrap_or(0),
        };

        let metadata_user_id = self
            .metadata
            .get("userId")
            .and_then(|u| UserId::parse(u).ok());

        Some(PaymentEvent {
            event_id,
            kind,
            credits_granted,
            metadata_user_id,
        })
    }
}

/// Webhook handler for verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BillingError> {
        // Verify signature
        self.verify_signature(payload, signature)?;

        // Parse event
        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        if let WebhookEventType::Unknown(ref t) = event_type {
            info!(event_type = %t, "Ignoring unhandled webhook event type");
        }

        let session: RawCheckoutSession =
            serde_json::from_value(raw_event.data.object).unwrap_or_default();

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            session_id: session.id,
            metadata: session.metadata,
            created: raw_event.created,
        })
    }

    /// Verify Stripe webhook signature
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), BillingError> {
        // Parse signature header: t=timestamp,v1=signature
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::WebhookError("Missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::WebhookError("Missing signature".to_string())
        })?;

        // Build signed payload
        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| BillingError::WebhookError("Invalid payload encoding".to_string()))?
        );

        // Compute expected signature
        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Compare signatures (constant-time)
        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(BillingError::WebhookError(
                "Signature verification failed".to_string(),
            ));
        }

        // Check timestamp freshness
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::WebhookError("Invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(BillingError::WebhookError("Timestamp too old".to_string()));
        }

        Ok(())
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw Stripe event for parsing

#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawCheckoutSession {
    id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}
