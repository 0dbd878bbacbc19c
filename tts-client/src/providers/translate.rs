//! Translate TTS provider
//!
//! Voice-agnostic fallback that drives the public translate text-to-speech
//! endpoint. One fixed voice per language, MP3 out, no API key. Quality is
//! below the neural voices, which is why it only serves as the fallback leg.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Provider for the generic translate TTS endpoint
pub struct TranslateTtsProvider {
    language: String,
    endpoint: String,
    client: Client,
}

impl TranslateTtsProvider {
    /// Create a new translate TTS provider for the given language code.
    pub fn new(language: String, endpoint: Option<String>) -> Self {
        Self {
            language,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechProvider for TranslateTtsProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>> {
        // The named voice, if any, is ignored — this endpoint speaks a single
        // voice per language.
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", request.text.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TtsError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(TtsError::RateLimited { retry_after: None });
            }
            if status.as_u16() == 503 {
                return Err(TtsError::ServerOverloaded { message });
            }

            return Err(TtsError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::ApiError {
                message: format!("Failed to read audio body: {}", e),
                status_code: None,
            })?
            .to_vec();

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio(format!(
                "empty response for language {}",
                self.language
            )));
        }

        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "Translate TTS"
    }
}
