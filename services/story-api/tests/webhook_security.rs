//! Webhook security tests
//!
//! Stripe webhook signature verification and payment-event extraction.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use fictioneer_billing::{WebhookEventType, WebhookHandler};
use fictioneer_types::PaymentKind;

const SECRET: &str = "whsec_test_secret_key";

/// Generate a valid Stripe webhook signature for testing
fn generate_stripe_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, std::str::from_utf8(payload).unwrap());

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={},v1={}", timestamp, signature)
}

/// Generate a checkout-completed payload for testing
fn checkout_payload(kind: &str, credits: i64) -> Vec<u8> {
    let payload = serde_json::json!({
        "id": "evt_test_123",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_test_123",
                "payment_status": "paid",
                "metadata": {
                    "userId": "7f8a1c2e-4b6d-4f90-9a31-5f2e6d8c0b1a",
                    "kind": kind,
                    "credits": credits.to_string()
                }
            }
        }
    });
    serde_json::to_vec(&payload).unwrap()
}

#[test]
fn valid_signature_is_accepted_and_parsed() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("credit_package", 30);
    let signature = generate_stripe_signature(&payload, SECRET, Utc::now().timestamp());

    let event = handler.verify_and_parse(&payload, &signature).unwrap();

    assert_eq!(event.event_type, WebhookEventType::CheckoutSessionCompleted);
    assert_eq!(event.session_id.as_deref(), Some("cs_test_123"));
}

#[test]
fn tampered_payload_is_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("credit_package", 30);
    let signature = generate_stripe_signature(&payload, SECRET, Utc::now().timestamp());

    let tampered = checkout_payload("credit_package", 3000);
    assert!(handler.verify_and_parse(&tampered, &signature).is_err());
}

#[test]
fn wrong_secret_is_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("premium_subscription", 0);
    let signature =
        generate_stripe_signature(&payload, "whsec_other_secret", Utc::now().timestamp());

    assert!(handler.verify_and_parse(&payload, &signature).is_err());
}

#[test]
fn stale_timestamp_is_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("credit_package", 10);

    // 10 minutes old: outside the replay window
    let stale = Utc::now().timestamp() - 600;
    let signature = generate_stripe_signature(&payload, SECRET, stale);

    assert!(handler.verify_and_parse(&payload, &signature).is_err());
}

#[test]
fn future_timestamp_is_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("credit_package", 10);

    let future = Utc::now().timestamp() + 600;
    let signature = generate_stripe_signature(&payload, SECRET, future);

    assert!(handler.verify_and_parse(&payload, &signature).is_err());
}

#[test]
fn malformed_signature_headers_are_rejected() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("credit_package", 10);

    for bad in ["", "t=1234567890", "v1=abc123", "invalid_format"] {
        assert!(
            handler.verify_and_parse(&payload, bad).is_err(),
            "signature {bad:?} should be rejected"
        );
    }
}

#[test]
fn payment_event_extraction_reads_metadata() {
    let handler = WebhookHandler::new(SECRET);
    let payload = checkout_payload("credit_package", 30);
    let signature = generate_stripe_signature(&payload, SECRET, Utc::now().timestamp());

    let event = handler.verify_and_parse(&payload, &signature).unwrap();
    let payment = event.into_payment_event().unwrap();

    assert_eq!(payment.event_id, "cs_test_123");
    assert_eq!(payment.kind, PaymentKind::CreditPackage);
    assert_eq!(payment.credits_granted, 30);
    assert!(payment.metadata_user_id.is_some());
}

#[test]
fn sessions_without_kind_metadata_default_to_premium() {
    let handler = WebhookHandler::new(SECRET);
    let payload = serde_json::to_vec(&serde_json::json!({
        "id": "evt_legacy",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_legacy",
                "metadata": { "userId": "7f8a1c2e-4b6d-4f90-9a31-5f2e6d8c0b1a" }
            }
        }
    }))
    .unwrap();
    let signature = generate_stripe_signature(&payload, SECRET, Utc::now().timestamp());

    let payment = handler
        .verify_and_parse(&payload, &signature)
        .unwrap()
        .into_payment_event()
        .unwrap();

    assert_eq!(payment.kind, PaymentKind::PremiumSubscription);
    assert_eq!(payment.credits_granted, 0);
}

#[test]
fn unhandled_event_types_grant_nothing() {
    let handler = WebhookHandler::new(SECRET);
    let payload = serde_json::to_vec(&serde_json::json!({
        "id": "evt_other",
        "type": "invoice.paid",
        "created": Utc::now().timestamp(),
        "data": { "object": { "id": "in_123" } }
    }))
    .unwrap();
    let signature = generate_stripe_signature(&payload, SECRET, Utc::now().timestamp());

    let event = handler.verify_and_parse(&payload, &signature).unwrap();
    assert!(matches!(event.event_type, WebhookEventType::Unknown(_)));
    assert!(event.into_payment_event().is_none());
}
