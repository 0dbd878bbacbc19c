//! In-memory store implementations.
//!
//! Reference implementations of the persistence seams, used by the test
//! suite. Maps are guarded by a std `Mutex`; locks are never held across
//! await points.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BlobStore, MetadataStore, ParsedBookMeta, StoreError, StoreResult};
use crate::model::{AudioFile, Book, BookStatus, Chapter, ChapterStatus};

#[derive(Default)]
struct Tables {
    books: HashMap<String, Book>,
    chapters: HashMap<String, Chapter>,
    /// Keyed by chapter_id — the upsert key for audio artifacts
    audio: HashMap<String, AudioFile>,
}

/// In-memory relational store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn insert_book(&self, book: Book) -> StoreResult<()> {
        let mut tables = self.inner.lock().unwrap();
        tables.books.insert(book.id.clone(), book);
        Ok(())
    }

    async fn book(&self, id: &str) -> StoreResult<Option<Book>> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.books.get(id).cloned())
    }

    async fn set_book_status(&self, id: &str, status: BookStatus) -> StoreResult<()> {
        let mut tables = self.inner.lock().unwrap();
        let book = tables
            .books
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("book", id))?;
        book.status = status;
        Ok(())
    }

    async fn mark_book_parsed(&self, id: &str, meta: ParsedBookMeta) -> StoreResult<()> {
        let mut tables = self.inner.lock().unwrap();
        let book = tables
            .books
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("book", id))?;
        book.title = meta.title;
        book.author = meta.author;
        book.cover_url = meta.cover_url;
        book.total_chapters = meta.total_chapters;
        book.status = BookStatus::Parsed;
        Ok(())
    }

    async fn insert_chapters(&self, chapters: Vec<Chapter>) -> StoreResult<()> {
        let mut tables = self.inner.lock().unwrap();
        for chapter in chapters {
            tables.chapters.insert(chapter.id.clone(), chapter);
        }
        Ok(())
    }

    async fn chapter(&self, id: &str) -> StoreResult<Option<Chapter>> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.chapters.get(id).cloned())
    }

    async fn chapters_by_book(&self, book_id: &str) -> StoreResult<Vec<Chapter>> {
        let tables = self.inner.lock().unwrap();
        let mut chapters: Vec<Chapter> = tables
            .chapters
            .values()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| c.index);
        Ok(chapters)
    }

    async fn set_chapter_status(
        &self,
        id: &str,
        status: ChapterStatus,
        error_message: Option<String>,
    ) -> StoreResult<()> {
        let mut tables = self.inner.lock().unwrap();
        let chapter = tables
            .chapters
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("chapter", id))?;
        chapter.status = status;
        chapter.error_message = error_message;
        Ok(())
    }

    async fn upsert_audio(&self, audio: AudioFile) -> StoreResult<()> {
        let mut tables = self.inner.lock().unwrap();
        tables.audio.insert(audio.chapter_id.clone(), audio);
        Ok(())
    }

    async fn audio_for_chapter(&self, chapter_id: &str) -> StoreResult<Option<AudioFile>> {
        let tables = self.inner.lock().unwrap();
        Ok(tables.audio.get(chapter_id).cloned())
    }
}

/// In-memory object store. URLs use a `memory://` scheme.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(bucket: &str, path: &str) -> String {
        format!("{}/{}", bucket, path)
    }

    /// Stored bytes for a bucket/path, if present.
    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        let objects = self.objects.lock().unwrap();
        objects.get(&Self::key(bucket, path)).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> StoreResult<String> {
        let mut objects = self.objects.lock().unwrap();
        objects.insert(Self::key(bucket, path), bytes);
        Ok(format!("memory://{}/{}", bucket, path))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> StoreResult<Vec<String>> {
        let objects = self.objects.lock().unwrap();
        let full_prefix = Self::key(bucket, prefix);
        let bucket_prefix = format!("{}/", bucket);
        let mut paths: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(&full_prefix))
            .map(|k| k[bucket_prefix.len()..].to_string())
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn remove_many(&self, bucket: &str, paths: &[String]) -> StoreResult<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&Self::key(bucket, path));
        }
        Ok(())
    }
}
