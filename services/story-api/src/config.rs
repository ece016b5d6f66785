//! Configuration for the Story API service.

use std::time::Duration;

use fictioneer_billing::BillingConfig;
use fictioneer_gen::GenConfig;

/// Story API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Billing configuration
    pub billing: BillingConfig,
    /// Generation configuration
    pub generation: GenConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Stories returned by the public feed
    pub public_feed_limit: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Stripe configuration
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;

        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        let success_url = std::env::var("PAYMENT_SUCCESS_URL").unwrap_or_else(|_| {
            "https://app.fictioneer.example/payment/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string()
        });

        let cancel_url = std::env::var("PAYMENT_CANCEL_URL")
            .unwrap_or_else(|_| "https://app.fictioneer.example/payment/cancel".to_string());

        // Generation configuration
        let gen_api_base = std::env::var("GEN_API_BASE")
            .unwrap_or_else(|_| "https://api.novita.ai/v3/openai".to_string());

        let gen_api_key =
            std::env::var("GEN_API_KEY").map_err(|_| ConfigError::Missing("GEN_API_KEY"))?;

        let gen_model =
            std::env::var("GEN_MODEL").unwrap_or_else(|_| "deepseek/deepseek_v3".to_string());

        let tts_api_base = std::env::var("TTS_API_BASE")
            .unwrap_or_else(|_| "https://api.murf.ai/v1".to_string());

        let tts_api_key = std::env::var("TTS_API_KEY").unwrap_or_default();

        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("GENERATION_TIMEOUT_SECS"))?;

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "90".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let public_feed_limit: i64 = std::env::var("PUBLIC_FEED_LIMIT")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PUBLIC_FEED_LIMIT"))?;

        let billing = BillingConfig::new(&stripe_secret_key, &stripe_webhook_secret)
            .with_urls(&success_url, &cancel_url);

        let generation = GenConfig::new(&gen_api_base, &gen_api_key)
            .with_model(&gen_model)
            .with_tts(&tts_api_base, &tts_api_key)
            .with_timeout(Duration::from_secs(generation_timeout_secs));

        Ok(Self {
            http_port,
            database_url,
            billing,
            generation,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            public_feed_limit,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
