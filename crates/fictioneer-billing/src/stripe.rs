//! Stripe payment provider implementation

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

use fictioneer_types::{Purchase, UserId};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{CheckoutSession, PaymentProvider, SessionMetadata, VerifiedSession};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: reqwest::Client,
    config: BillingConfig,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: BillingConfig) -> Self {
        let client = reqwest::Client::new();
        Self { client, config }
    }

    /// Make authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.stripe_secret_key, Option::<&str>::None);

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BillingError::ProviderError(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            return Err(BillingError::ProviderError(format!(
                "Stripe API error: {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, customer_email))]
    async fn create_checkout_session(
        &self,
        customer_email: &str,
        user_id: UserId,
        purchase: Purchase,
        buyer_is_premium: bool,
    ) -> Result<CheckoutSession, BillingError> {
        debug!(user_id = %user_id, ?purchase, "Creating checkout session");

        let amount = purchase.price_cents(buyer_is_premium).to_string();
        let kind = purchase.kind().to_string();
        let credits = purchase.credits_granted().to_string();
        let user = user_id.to_string();

        let form = [
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("customer_email", customer_email),
            ("success_url", &self.config.success_url),
            ("cancel_url", &self.config.cancel_url),
            ("line_items[0][price_data][currency]", "usd"),
            (
                "line_items[0][price_data][product_data][name]",
                purchase.display_name(),
            ),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][quantity]", "1"),
            ("metadata[userId]", &user),
            ("metadata[kind]", &kind),
            ("metadata[credits]", &credits),
        ];

        let session: StripeCheckoutSession = self
            .stripe_request(reqwest::Method::POST, "/checkout/sessions", Some(&form))
            .await?;

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> Result<VerifiedSession, BillingError> {
        debug!(session_id = %session_id, "Retrieving checkout session");

        let session: StripeCheckoutSession = self
            .stripe_request(
                reqwest::Method::GET,
                &format!("/checkout/sessions/{session_id}"),
                None,
            )
            .await?;

        Ok(VerifiedSession {
            session_id: session.id,
            paid: session.payment_status.as_deref() == Some("paid")
                || session.status.as_deref() == Some("complete"),
            metadata: parse_metadata(&session.metadata),
        })
    }
}

/// Pull the fields we wrote at checkout back out of raw metadata
fn parse_metadata(metadata: &HashMap<String, String>) -> SessionMetadata {
    SessionMetadata {
        user_id: metadata.get("userId").cloned(),
        kind: metadata.get("kind").cloned(),
        credits: metadata.get("credits").and_then(|c| c.parse().ok()),
    }
}

// Stripe API response types

/// Stripe checkout session
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Hosted checkout URL
    pub url: Option<String>,
    /// Session status
    pub status: Option<String>,
    /// Payment status
    pub payment_status: Option<String>,
    /// Metadata attached at creation
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}
