//! Billing configuration

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Redirect target after successful checkout
    pub success_url: String,
    /// Redirect target after canceled checkout
    pub cancel_url: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            success_url: "https://app.fictioneer.example/payment/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://app.fictioneer.example/payment/cancel".to_string(),
        }
    }

    /// Set redirect URLs
    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }
}
