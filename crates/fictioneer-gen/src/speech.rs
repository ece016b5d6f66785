//! Speech synthesis client
//!
//! Narrates story text through a hosted text-to-speech API. Shares the
//! timeout and failure taxonomy of the generation client; not credit-metered.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use crate::config::GenConfig;
use crate::error::GenError;

/// Providers cap request size; longer stories are narrated truncated
const MAX_TTS_CHARS: usize = 2000;

/// Result of a synthesis call
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// URL of the rendered audio clip
    pub audio_url: String,
}

/// Text-to-speech collaborator
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render narration audio for the given text
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizedAudio, GenError>;
}

/// ElevenLabs-style synthesis client
#[derive(Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: GenConfig,
}

impl ElevenLabsSynthesizer {
    /// Create a new synthesizer
    pub fn new(config: GenConfig) -> Self {
        let client = reqwest::Client::new();
        Self { client, config }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizedAudio, GenError> {
        let sanitized = sanitize_for_tts(text);
        if sanitized.len() < text.len() {
            warn!(
                original = text.len(),
                truncated = sanitized.len(),
                "Narration text truncated to fit provider limits"
            );
        }

        let url = format!("{}/speech/generate", self.config.tts_api_base);
        let body = json!({
            "text": sanitized,
            "voiceId": voice_id,
        });

        debug!(voice_id = %voice_id, "Requesting speech synthesis");

        let request = self
            .client
            .post(&url)
            .header("api-key", &self.config.tts_api_key)
            .json(&body)
            .send();

        let timeout = self.config.request_timeout;
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| GenError::Timeout(timeout.as_secs()))?
            .map_err(|e| {
                error!(error = %e, "TTS API request failed");
                GenError::Transient(e.to_string())
            })?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(GenError::Quota),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                error!("TTS API rejected credentials");
                return Err(GenError::Auth);
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                error!(status = %s, body = %body, "TTS API error");
                return Err(GenError::Transient(format!("upstream status {s}")));
            }
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenError::InvalidResponse(e.to_string()))?;

        let audio_url = payload
            .get("audioFile")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                GenError::InvalidResponse("no audio file in TTS response".to_string())
            })?;

        Ok(SynthesizedAudio {
            audio_url: audio_url.to_string(),
        })
    }
}

/// Strip control characters, collapse whitespace, and cap the length
fn sanitize_for_tts(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    cleaned.chars().take(MAX_TTS_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_removes_control_chars_and_newlines() {
        let text = "First line\nSecond\tline\u{0007}  spaced";
        assert_eq!(sanitize_for_tts(text), "First line Second line spaced");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "word ".repeat(1000);
        assert!(sanitize_for_tts(&long).len() <= MAX_TTS_CHARS);
    }
}
