//! Persistence seams consumed by the pipeline.
//!
//! The pipeline never talks to a concrete database or object store; it is
//! handed these traits at construction. The in-memory implementations in
//! [`memory`] back the tests and document the expected semantics.

pub mod memory;

pub use memory::{MemoryBlobStore, MemoryStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AudioFile, Book, BookStatus, Chapter, ChapterStatus};

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Metadata committed when parsing completes.
#[derive(Debug, Clone)]
pub struct ParsedBookMeta {
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub total_chapters: usize,
}

/// Relational store for books, chapters, and audio artifacts.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_book(&self, book: Book) -> StoreResult<()>;

    async fn book(&self, id: &str) -> StoreResult<Option<Book>>;

    async fn set_book_status(&self, id: &str, status: BookStatus) -> StoreResult<()>;

    /// Apply parse results to the book row and flip it to `Parsed`.
    async fn mark_book_parsed(&self, id: &str, meta: ParsedBookMeta) -> StoreResult<()>;

    /// Insert a full chapter set. All-or-nothing: implementations must not
    /// leave a partial set behind on failure.
    async fn insert_chapters(&self, chapters: Vec<Chapter>) -> StoreResult<()>;

    async fn chapter(&self, id: &str) -> StoreResult<Option<Chapter>>;

    /// All chapters of a book, ordered by `index`.
    async fn chapters_by_book(&self, book_id: &str) -> StoreResult<Vec<Chapter>>;

    /// Update a chapter's status. `error_message` replaces the stored
    /// message (pass `None` to clear it).
    async fn set_chapter_status(
        &self,
        id: &str,
        status: ChapterStatus,
        error_message: Option<String>,
    ) -> StoreResult<()>;

    /// Insert or replace the audio artifact for `audio.chapter_id`.
    async fn upsert_audio(&self, audio: AudioFile) -> StoreResult<()>;

    async fn audio_for_chapter(&self, chapter_id: &str) -> StoreResult<Option<AudioFile>>;
}

/// Object store for original documents, covers, and audio artifacts,
/// keyed by `{bucket}/{book_id}/...`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return a public URL.
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<String>;

    /// List object paths under a prefix.
    async fn list(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<String>>;

    /// Remove a batch of objects.
    async fn remove_many(&self, bucket: &str, paths: &[String]) -> StoreResult<()>;
}
