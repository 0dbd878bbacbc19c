//! bookvoice configuration management.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

// Defaults match the production service
const DEFAULT_VOICE: &str = "vi-VN-HoaiMyNeural";
const DEFAULT_FALLBACK_LANGUAGE: &str = "vi";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Voice assigned to books that don't request one
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Language code for the voice-agnostic fallback provider
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,

    /// Endpoint override for the neural voice provider. None uses the
    /// provider's public endpoint.
    #[serde(default)]
    pub neural_endpoint: Option<String>,

    /// Maximum characters per synthesis chunk
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Maximum characters accepted by the direct speak call
    #[serde(default = "default_speak_max_chars")]
    pub speak_max_chars: usize,

    /// Sections whose normalized text is shorter than this are dropped
    /// during segmentation (tables of contents, copyright pages)
    #[serde(default = "default_min_chapter_chars")]
    pub min_chapter_chars: usize,

    /// How many chapters to auto-enqueue right after parsing
    #[serde(default = "default_prefetch_ahead")]
    pub prefetch_ahead: usize,

    /// Base delay between fallback-provider retry attempts, in milliseconds.
    /// Attempt N waits N times this long.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_fallback_language() -> String {
    DEFAULT_FALLBACK_LANGUAGE.to_string()
}

fn default_max_chunk_chars() -> usize {
    5000
}

fn default_speak_max_chars() -> usize {
    2000
}

fn default_min_chapter_chars() -> usize {
    100
}

fn default_prefetch_ahead() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_voice: default_voice(),
            fallback_language: default_fallback_language(),
            neural_endpoint: None,
            max_chunk_chars: default_max_chunk_chars(),
            speak_max_chars: default_speak_max_chars(),
            min_chapter_chars: default_min_chapter_chars(),
            prefetch_ahead: default_prefetch_ahead(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, returning defaults if it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_voice, "vi-VN-HoaiMyNeural");
        assert_eq!(config.max_chunk_chars, 5000);
        assert_eq!(config.speak_max_chars, 2000);
        assert_eq!(config.min_chapter_chars, 100);
        assert_eq!(config.prefetch_ahead, 3);
        assert_eq!(config.retry_delay_ms, 2000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("max_chunk_chars = 400\n").unwrap();
        assert_eq!(config.max_chunk_chars, 400);
        assert_eq!(config.prefetch_ahead, 3);
        assert_eq!(config.fallback_language, "vi");
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/bookvoice.toml")).unwrap();
        assert_eq!(config.speak_max_chars, 2000);
    }
}
