//! Payment provider abstraction

use async_trait::async_trait;

use fictioneer_types::{Purchase, UserId};

use crate::error::BillingError;

/// A freshly created checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Session ID
    pub session_id: String,
    /// Hosted checkout URL
    pub url: String,
}

/// Metadata we attach at checkout and read back at reconciliation
#[derive(Debug, Clone, Default)]
pub struct SessionMetadata {
    /// Target user id
    pub user_id: Option<String>,
    /// Entitlement kind ("premium_subscription" / "credit_package")
    pub kind: Option<String>,
    /// Credits granted for credit packages
    pub credits: Option<i64>,
}

/// A checkout session retrieved back from the processor
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    /// Session ID
    pub session_id: String,
    /// Whether the processor reports the session as paid/complete
    pub paid: bool,
    /// Metadata attached at creation time
    pub metadata: SessionMetadata,
}

/// Payment provider trait
///
/// Abstracts payment processing to allow different providers (Stripe, etc.)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a one-time checkout session for a purchase.
    ///
    /// The target user id, entitlement kind, and credit amount are embedded
    /// in session metadata so the reconciler never has to trust the client.
    async fn create_checkout_session(
        &self,
        customer_email: &str,
        user_id: UserId,
        purchase: Purchase,
        buyer_is_premium: bool,
    ) -> Result<CheckoutSession, BillingError>;

    /// Retrieve a session from the processor for verification
    async fn retrieve_session(&self, session_id: &str) -> Result<VerifiedSession, BillingError>;
}
