//! Generation configuration

use std::time::Duration;

/// Configuration for the external AI collaborators
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Base URL of the OpenAI-compatible completions API
    pub api_base: String,
    /// API key for the completions API
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Base URL of the text-to-speech API
    pub tts_api_base: String,
    /// API key for the text-to-speech API
    pub tts_api_key: String,
    /// Deadline for a single generation call
    pub request_timeout: Duration,
}

impl GenConfig {
    /// Create a new generation config
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: "deepseek/deepseek_v3".to_string(),
            tts_api_base: "https://api.elevenlabs.io/v1".to_string(),
            tts_api_key: String::new(),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the text-to-speech endpoint and key
    pub fn with_tts(
        mut self,
        tts_api_base: impl Into<String>,
        tts_api_key: impl Into<String>,
    ) -> Self {
        self.tts_api_base = tts_api_base.into();
        self.tts_api_key = tts_api_key.into();
        self
    }

    /// Set the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
