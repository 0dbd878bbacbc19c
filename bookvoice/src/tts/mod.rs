//! Synthesis adapter: voice routing, provider fallback, and retry.
//!
//! Two provider classes sit behind this module: the primary named neural
//! voices, and a generic voice-agnostic fallback. A chunk requested with a
//! primary voice tries the primary once and falls back to the generic
//! provider on any failure; the generic leg retries with linear backoff
//! before giving up. Chunk boundaries are the caller's job (see
//! [`crate::text::split_text`]).

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use tts_client::{
    MockProvider, ProviderKind, ProviderSettings, SpeechProvider, SpeechRequest, TtsError,
    get_provider, is_neural_voice,
};

use crate::config::Config;

/// Attempts against the generic provider before a chunk is given up on.
const FALLBACK_ATTEMPTS: u32 = 3;

/// Adapter over the primary and fallback speech providers.
pub struct Synthesizer {
    primary: Arc<dyn SpeechProvider>,
    fallback: Arc<dyn SpeechProvider>,
    /// Base delay between fallback retries; attempt N waits N times this
    retry_delay: Duration,
}

impl Synthesizer {
    pub fn new(primary: Arc<dyn SpeechProvider>, fallback: Arc<dyn SpeechProvider>) -> Self {
        Self {
            primary,
            fallback,
            retry_delay: Duration::from_secs(2),
        }
    }

    /// Build both provider legs from config, resolving the primary API key
    /// from the environment.
    pub fn from_config(config: &Config) -> Result<Self, TtsError> {
        let primary = get_provider(
            ProviderKind::Neural,
            &ProviderSettings {
                endpoint: config.neural_endpoint.clone(),
                ..Default::default()
            },
        )?;
        let fallback = get_provider(
            ProviderKind::Translate,
            &ProviderSettings {
                language: Some(config.fallback_language.clone()),
                ..Default::default()
            },
        )?;
        Ok(Self::new(Arc::from(primary), Arc::from(fallback)).with_retry_delay(
            Duration::from_millis(config.retry_delay_ms),
        ))
    }

    /// Override the base retry delay (tests use a short one).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Synthesize one pre-chunked piece of text.
    ///
    /// A primary-voice failure is absorbed here: the same chunk is retried
    /// on the generic provider, and only the generic provider's terminal
    /// error reaches the caller.
    pub async fn synthesize_chunk(&self, text: &str, voice: &str) -> Result<Vec<u8>, TtsError> {
        if is_neural_voice(voice) {
            let request = SpeechRequest::new(text).with_voice(voice);
            match self.primary.synthesize(request).await {
                Ok(audio) => return Ok(audio),
                Err(e) => {
                    warn!(
                        "{} failed for voice {}, falling back to {}: {}",
                        self.primary.name(),
                        voice,
                        self.fallback.name(),
                        e
                    );
                }
            }
        }

        self.synthesize_fallback(text).await
    }

    /// Drive the generic provider with up to 3 attempts and linearly
    /// increasing backoff (2s, 4s between attempts by default).
    async fn synthesize_fallback(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let mut last_error = None;

        for attempt in 0..FALLBACK_ATTEMPTS {
            match self.fallback.synthesize(SpeechRequest::new(text)).await {
                Ok(audio) => {
                    if attempt > 0 {
                        info!(
                            "{} succeeded on attempt {}",
                            self.fallback.name(),
                            attempt + 1
                        );
                    }
                    return Ok(audio);
                }
                Err(e) => {
                    warn!(
                        "{} attempt {}/{} failed: {}",
                        self.fallback.name(),
                        attempt + 1,
                        FALLBACK_ATTEMPTS,
                        e
                    );
                    last_error = Some(e);
                    if attempt + 1 < FALLBACK_ATTEMPTS {
                        tokio::time::sleep(self.retry_delay * (attempt + 1)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TtsError::ApiError {
            message: "all synthesis attempts failed".to_string(),
            status_code: None,
        }))
    }
}

/// A synthesizer wired to mock providers, for tests.
pub fn mock_synthesizer(primary: MockProvider, fallback: MockProvider) -> Synthesizer {
    Synthesizer::new(Arc::new(primary), Arc::new(fallback))
        .with_retry_delay(Duration::from_millis(1))
}
