//! Mock generation collaborators for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use fictioneer_gen::{
    GenError, GeneratedStory, SpeechSynthesizer, StoryGenerator, SynthesizedAudio,
};
use fictioneer_types::StorySettings;

/// Generator returning canned text, optionally failing with a timeout
#[derive(Default)]
pub struct MockGenerator {
    fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Generator whose every call times out
    pub fn failing() -> Arc<Self> {
        let gen = Self::default();
        gen.fail.store(true, Ordering::SeqCst);
        Arc::new(gen)
    }
}

#[async_trait]
impl StoryGenerator for MockGenerator {
    async fn generate(
        &self,
        title: &str,
        _settings: &StorySettings,
    ) -> Result<GeneratedStory, GenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenError::Timeout(30));
        }
        Ok(GeneratedStory {
            title: if title.is_empty() { "Untitled".into() } else { title.into() },
            content: "Once upon a time, the rain would not stop.".to_string(),
        })
    }

    async fn continue_story(
        &self,
        _existing_content: &str,
        _settings: &StorySettings,
    ) -> Result<String, GenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenError::Timeout(30));
        }
        Ok("And then the storm broke.".to_string())
    }

    async fn title_suggestions(&self, _content: &str) -> Result<Vec<String>, GenError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenError::Timeout(30));
        }
        Ok(vec!["Rainfall".to_string(), "The Storm".to_string()])
    }
}

/// Synthesizer returning a fixed URL
#[derive(Default)]
pub struct MockSynthesizer;

impl MockSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _voice_id: &str,
    ) -> Result<SynthesizedAudio, GenError> {
        Ok(SynthesizedAudio {
            audio_url: "/audio/story_test.mp3".to_string(),
        })
    }
}
