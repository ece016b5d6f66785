//! Fictioneer Gen - External AI collaborators
//!
//! HTTP clients for the two long-latency external services the platform
//! consumes: an OpenAI-compatible chat-completions endpoint for story text
//! and a text-to-speech service for narration. Both are bounded by timeouts
//! and mapped into a small shared failure taxonomy.

pub mod config;
pub mod error;
pub mod generate;
pub mod speech;

pub use config::GenConfig;
pub use error::GenError;
pub use generate::{GeneratedStory, OpenAiGenerator, StoryGenerator};
pub use speech::{ElevenLabsSynthesizer, SpeechSynthesizer, SynthesizedAudio};
