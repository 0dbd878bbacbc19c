use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a speech provider.
///
/// `text` must already be sized for a single synthesis call; chunking long
/// text is the caller's job.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Named voice to use. Providers that only speak one voice ignore it.
    pub voice: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

/// Trait for speech providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request text, returning encoded audio bytes (MP3).
    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}
