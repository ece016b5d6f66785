//! Story generation client
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. The model is
//! asked for JSON; responses are de-fenced and parsed with a plain-text
//! fallback because models do not reliably honor the format instruction.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use fictioneer_types::StorySettings;

use crate::config::GenConfig;
use crate::error::GenError;

/// Tokens granted per unit of the 1-5 length setting. Deliberately tight so
/// stories end mid-scene and invite continuation.
const TOKENS_PER_LENGTH: u32 = 300;

/// Result of a story generation call
#[derive(Debug, Clone)]
pub struct GeneratedStory {
    /// Story title (either echoed back or model-suggested)
    pub title: String,
    /// Generated narrative text
    pub content: String,
}

/// Story generation collaborator
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Generate a fresh story from a title and settings
    async fn generate(
        &self,
        title: &str,
        settings: &StorySettings,
    ) -> Result<GeneratedStory, GenError>;

    /// Continue an existing story, preserving its style and characters
    async fn continue_story(
        &self,
        existing_content: &str,
        settings: &StorySettings,
    ) -> Result<String, GenError>;

    /// Suggest titles for existing content
    async fn title_suggestions(&self, content: &str) -> Result<Vec<String>, GenError>;
}

/// OpenAI-compatible chat-completions generator
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GenConfig,
}

impl OpenAiGenerator {
    /// Create a new generator
    pub fn new(config: GenConfig) -> Self {
        let client = reqwest::Client::new();
        Self { client, config }
    }

    /// Make a chat-completions request and return the raw assistant message
    async fn chat_request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, GenError> {
        let url = format!("{}/chat/completions", self.config.api_base);

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send();

        let timeout = self.config.request_timeout;
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| GenError::Timeout(timeout.as_secs()))?
            .map_err(|e| {
                error!(error = %e, "Generation API request failed");
                GenError::Transient(e.to_string())
            })?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(GenError::Quota),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                error!("Generation API rejected credentials");
                return Err(GenError::Auth);
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                error!(status = %s, body = %body, "Generation API error");
                return Err(GenError::Transient(format!("upstream status {s}")));
            }
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GenError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenError::InvalidResponse("no choices in response".to_string()))
    }
}

#[async_trait]
impl StoryGenerator for OpenAiGenerator {
    #[instrument(skip(self, settings), fields(length = settings.length))]
    async fn generate(
        &self,
        title: &str,
        settings: &StorySettings,
    ) -> Result<GeneratedStory, GenError> {
        let max_tokens = TOKENS_PER_LENGTH * u32::from(settings.length);
        let system_prompt = generation_prompt(title, settings);

        debug!(max_tokens, "Requesting story generation");

        let raw = self
            .chat_request(
                &system_prompt,
                "Generate a high-quality story based on the parameters.",
                max_tokens,
                0.8,
            )
            .await?;

        let cleaned = strip_code_fences(&raw);
        match serde_json::from_str::<StoryPayload>(cleaned) {
            Ok(payload) => Ok(GeneratedStory {
                title: if title.is_empty() { payload.title } else { title.to_string() },
                content: payload.content,
            }),
            Err(e) => {
                // Fall back to treating the whole reply as prose
                warn!(error = %e, "Model reply was not the requested JSON, using raw text");
                Ok(GeneratedStory {
                    title: title.to_string(),
                    content: strip_json_noise(cleaned),
                })
            }
        }
    }

    #[instrument(skip(self, existing_content, settings))]
    async fn continue_story(
        &self,
        existing_content: &str,
        settings: &StorySettings,
    ) -> Result<String, GenError> {
        let max_tokens = TOKENS_PER_LENGTH * u32::from(settings.length);
        let system_prompt = continuation_prompt(settings, max_tokens);

        // Only the tail of a long story fits in the context window
        let excerpt: String = existing_content.chars().take(2000).collect();
        let user_prompt = format!(
            "Here's the existing story content:\n\n{excerpt}...\n\nContinue the story from where it left off."
        );

        debug!(
            existing_chars = existing_content.len(),
            max_tokens, "Requesting story continuation"
        );

        let raw = self
            .chat_request(&system_prompt, &user_prompt, max_tokens, 0.8)
            .await?;

        Ok(strip_code_fences(&raw).to_string())
    }

    #[instrument(skip(self, content))]
    async fn title_suggestions(&self, content: &str) -> Result<Vec<String>, GenError> {
        let excerpt: String = content.chars().take(300).collect();
        let raw = self
            .chat_request(
                "Generate 5 captivating titles for this story. Keep them concise \
                 (2-5 words). Respond in JSON format with an array of titles under \
                 the key \"titles\".",
                &format!("Story content (first paragraph): {excerpt}..."),
                150,
                0.8,
            )
            .await?;

        let cleaned = strip_code_fences(&raw);
        if let Ok(payload) = serde_json::from_str::<TitlesPayload>(cleaned) {
            return Ok(payload.titles);
        }

        // Non-JSON reply: one title per line, numbered or not
        let titles: Vec<String> = cleaned
            .lines()
            .map(|line| {
                line.trim()
                    .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                    .trim_matches('"')
                    .trim()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .take(5)
            .collect();

        if titles.is_empty() {
            return Err(GenError::InvalidResponse(
                "no usable titles in response".to_string(),
            ));
        }
        Ok(titles)
    }
}

/// Build the system prompt for fresh generation
fn generation_prompt(title: &str, settings: &StorySettings) -> String {
    let explicit_line = match settings.explicit_level {
        Some(level) => format!(
            "Set the explicitness level to {level}% - the higher the percentage, the more explicit the content."
        ),
        None => "Keep the content moderately explicit unless otherwise specified.".to_string(),
    };

    let title_line = if title.is_empty() {
        "Generate an appropriate title for the story.".to_string()
    } else {
        format!(
            "The story must directly involve the central concept of \"{title}\" as its primary focus."
        )
    };

    let mut prompt = format!(
        "You are an expert romance fiction writer known for creating tasteful, sensual narratives.\n\
         Generate a story with the following parameters:\n\
         - Time Period: {}\n\
         - Location: {}\n\
         - Atmosphere: {}\n\
         - Protagonist Gender: {}\n\
         - Partner Gender: {}\n\
         - Relationship: {}\n\
         - Writing Tone: {}\n\
         - Length: {} out of 5 (adjust word count accordingly)\n\
         {explicit_line}\n\
         {title_line}\n",
        settings.time_period,
        settings.location,
        settings.atmosphere,
        settings.protagonist_gender,
        settings.partner_gender,
        settings.relationship,
        settings.writing_tone,
        settings.length,
    );

    if let Some(desc) = &settings.setting_description {
        prompt.push_str(&format!(
            "\nSetting description: {desc}\nIncorporate these specific setting details into your narrative.\n"
        ));
    }
    if let Some(desc) = &settings.protagonist_description {
        prompt.push_str(&format!(
            "\nProtagonist description: {desc}\nEnsure the protagonist has these specific characteristics.\n"
        ));
    }
    if let Some(desc) = &settings.love_interest_description {
        prompt.push_str(&format!(
            "\nLove interest description: {desc}\nIncorporate these specific details about the love interest.\n"
        ));
    }

    prompt.push_str(
        "\nIMPORTANT: Make the story incomplete/unfinished, ending with a cliffhanger or in the \
         middle of a scene. It should feel like it needs continuation.\n\n\
         Include vivid descriptions and engaging dialogue. Start with setting the scene and \
         gradually build tension.\n\n\
         Format your response as JSON with the following structure:\n\
         {\"title\": \"Story Title\", \"content\": \"Full story with proper paragraphs and formatting\"}",
    );

    prompt
}

/// Build the system prompt for continuation
fn continuation_prompt(settings: &StorySettings, max_tokens: u32) -> String {
    let explicit_line = match settings.explicit_level {
        Some(level) => format!(
            "Set the explicitness level to {level}% - the higher the percentage, the more explicit the content."
        ),
        None => "Keep the content moderately explicit unless otherwise specified.".to_string(),
    };

    format!(
        "You are an expert romance fiction writer. Continue this story based on the existing \
         content and settings.\n\
         Story settings:\n\
         - Time Period: {}\n\
         - Location: {}\n\
         - Atmosphere: {}\n\
         - Protagonist Gender: {}\n\
         - Partner Gender: {}\n\
         - Relationship: {}\n\
         - Writing Tone: {}\n\
         {explicit_line}\n\n\
         Your continuation should maintain the style, tone, and characters from the existing \
         content. Focus on advancing the plot while keeping the emotional connection between \
         characters. Write approximately {} words of continuation.",
        settings.time_period,
        settings.location,
        settings.atmosphere,
        settings.protagonist_gender,
        settings.partner_gender,
        settings.relationship,
        settings.writing_tone,
        max_tokens / 2,
    )
}

/// Remove markdown code fences the model may wrap JSON in
fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Best-effort cleanup when the model ignored the JSON format instruction
fn strip_json_noise(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '{' | '}' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

// Chat-completions API response types

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StoryPayload {
    #[serde(default)]
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct TitlesPayload {
    titles: Vec<String>,
}
