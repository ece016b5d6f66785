//! Fictioneer Billing - Payments and entitlement reconciliation
//!
//! Checkout session creation against a Stripe-shaped API, webhook signature
//! verification, and the reconciler that turns payment-success signals into
//! exactly-once entitlement mutations.
//!
//! # Example
//!
//! ```rust,ignore
//! use fictioneer_billing::{BillingConfig, EntitlementReconciler, WebhookHandler};
//!
//! let handler = WebhookHandler::new(&config.stripe_webhook_secret);
//! let event = handler.verify_and_parse(&body, signature)?;
//!
//! if let Some(payment) = event.into_payment_event() {
//!     reconciler.apply(payment, None).await?;
//! }
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{CheckoutSession, PaymentProvider, SessionMetadata, VerifiedSession};
pub use reconciler::{EntitlementReconciler, PaymentEvent, Reconciled};
pub use stripe::StripeProvider;
pub use webhook::{WebhookEvent, WebhookEventType, WebhookHandler};
