//! Shared speech-synthesis client library for the bookvoice workspace
//!
//! Provides a unified interface for the TTS providers the conversion
//! pipeline talks to:
//! - Neural voice API (named higher-quality voices, direct REST)
//! - Translate TTS (generic voice-agnostic fallback)
//! - Mock (configurable test double)

pub mod error;
pub mod provider;
pub mod providers;

pub use error::{Result, TtsError};
pub use provider::{SpeechProvider, SpeechRequest};
pub use providers::{
    MockProvider, NeuralVoiceProvider, ProviderKind, ProviderSettings, TranslateTtsProvider,
    get_provider, is_neural_voice, NEURAL_VOICES,
};
