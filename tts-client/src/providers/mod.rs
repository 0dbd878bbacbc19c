//! Speech provider implementations

pub mod mock;
mod neural;
mod translate;

pub use mock::MockProvider;
pub use neural::{NeuralVoiceProvider, NEURAL_VOICES, is_neural_voice};
pub use translate::TranslateTtsProvider;

use crate::error::{Result, TtsError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Neural,
    Translate,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "neural" | "neural-voice" | "neural_voice" => Ok(Self::Neural),
            "translate" | "translate-tts" | "translate_tts" => Ok(Self::Translate),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::Neural => Some("SPEECH_API_KEY"),
            Self::Translate => None,
        }
    }
}

/// Connection settings shared by the provider constructors.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// API key; falls back to the provider's environment variable when unset.
    pub api_key: Option<String>,
    /// Endpoint override (defaults to the provider's public endpoint).
    pub endpoint: Option<String>,
    /// Language code for voice-agnostic providers (e.g. "vi").
    pub language: Option<String>,
}

/// Create a provider instance from a kind and settings
pub fn get_provider(
    kind: ProviderKind,
    settings: &ProviderSettings,
) -> Result<Box<dyn SpeechProvider>> {
    match kind {
        ProviderKind::Neural => {
            let env_var = kind.env_var().unwrap_or("SPEECH_API_KEY");
            let api_key = get_api_key(settings, env_var, "Neural voice API")?;
            Ok(Box::new(NeuralVoiceProvider::new(
                api_key,
                settings.endpoint.clone(),
            )))
        }
        ProviderKind::Translate => {
            let language = settings.language.clone().unwrap_or_else(|| "vi".to_string());
            Ok(Box::new(TranslateTtsProvider::new(
                language,
                settings.endpoint.clone(),
            )))
        }
    }
}

/// Get API key from settings or environment variable
fn get_api_key(
    settings: &ProviderSettings,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    // Check settings first
    if let Some(key) = settings.api_key.clone() {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| TtsError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}
