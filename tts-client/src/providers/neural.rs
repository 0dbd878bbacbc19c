//! Neural voice API provider
//!
//! Direct HTTP implementation for an Azure-style neural speech endpoint:
//! SSML in, MP3 bytes out.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

const DEFAULT_ENDPOINT: &str =
    "https://southeastasia.tts.speech.microsoft.com/cognitiveservices/v1";
const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Named voices this provider class can speak.
pub const NEURAL_VOICES: &[&str] = &["vi-VN-HoaiMyNeural", "vi-VN-NamMinhNeural"];

/// Whether `voice` names one of the primary neural voices.
pub fn is_neural_voice(voice: &str) -> bool {
    NEURAL_VOICES.contains(&voice)
}

/// Provider for direct neural speech API calls
pub struct NeuralVoiceProvider {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl NeuralVoiceProvider {
    /// Create a new neural voice provider
    pub fn new(api_key: String, endpoint: Option<String>) -> Self {
        Self {
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            client: Client::new(),
        }
    }
}

// Error body some speech endpoints return as JSON

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Build the SSML payload for a single synthesis call.
fn build_ssml(text: &str, voice: &str) -> String {
    let lang = voice
        .rsplitn(2, '-')
        .nth(1)
        .unwrap_or("vi-VN");
    format!(
        "<speak version='1.0' xml:lang='{lang}'><voice name='{voice}'>{}</voice></speak>",
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl SpeechProvider for NeuralVoiceProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>> {
        let voice = request.voice.as_deref().ok_or_else(|| {
            TtsError::ConfigError("neural provider requires a named voice".to_string())
        })?;

        let ssml = build_ssml(&request.text, voice);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| TtsError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            // 429 and 503 are separated out for the caller's backoff logic
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
                "empty response for voice {}",
                voice
            )));
        }

        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "Neural voice API"
    }
}
