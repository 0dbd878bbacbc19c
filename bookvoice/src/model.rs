//! Data model for books moving through the conversion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a book through parse and conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Parsing,
    Parsed,
    Converting,
    Ready,
    Error,
}

/// Status of a single chapter's conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    Pending,
    Converting,
    Ready,
    Error,
}

/// An uploaded book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    /// Public URL of the extracted cover image, if any
    pub cover_url: Option<String>,
    /// Voice requested at upload time
    pub voice: String,
    pub status: BookStatus,
    pub total_chapters: usize,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Create a freshly uploaded book, not yet parsed.
    pub fn new(id: impl Into<String>, title: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            cover_url: None,
            voice: voice.into(),
            status: BookStatus::Parsing,
            total_chapters: 0,
            created_at: Utc::now(),
        }
    }
}

/// One speech-eligible chapter segmented out of a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub book_id: String,
    /// Book-relative ordering key: dense, zero-based, assigned at parse
    /// time over kept sections and never renumbered.
    pub index: usize,
    pub title: String,
    /// Normalized plain text ready for chunking
    pub text: String,
    pub word_count: usize,
    pub status: ChapterStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored audio output for a chapter. At most one live artifact per
/// chapter; a new synthesis replaces the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFile {
    pub id: String,
    pub chapter_id: String,
    pub book_id: String,
    pub storage_path: String,
    pub public_url: String,
    pub file_size_bytes: u64,
    pub duration_seconds: f64,
    pub voice: String,
}
