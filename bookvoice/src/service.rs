//! The service facade the API layer drives.
//!
//! Owns the store handles, the synthesizer, and the enqueue side of the
//! job queue. Constructed once at process start via [`AudiobookService::start`],
//! which also spawns the single conversion worker.

use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::ingest_document;
use crate::model::{Book, BookStatus, ChapterStatus};
use crate::queue::{QueueHandle, Worker, channel};
use crate::store::{BlobStore, MetadataStore};
use crate::tts::Synthesizer;
use tts_client::NEURAL_VOICES;

/// Per-status chapter counts for one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionStatus {
    pub total_chapters: usize,
    pub ready: usize,
    pub failed: usize,
    pub converting: usize,
    pub pending: usize,
}

pub struct AudiobookService {
    store: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    synthesizer: Arc<Synthesizer>,
    config: Arc<Config>,
    queue: QueueHandle,
}

impl AudiobookService {
    /// Construct the service and spawn its worker. Call once at process
    /// start; the returned handle finishes when the service is dropped.
    pub fn start(
        store: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        synthesizer: Synthesizer,
        config: Config,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let synthesizer = Arc::new(synthesizer);
        let config = Arc::new(config);

        let (queue, rx) = channel();
        let worker = Worker::new(
            store.clone(),
            blobs.clone(),
            synthesizer.clone(),
            config.clone(),
        );
        let handle = worker.spawn(rx);

        let service = Arc::new(Self {
            store,
            blobs,
            synthesizer,
            config,
            queue,
        });
        (service, handle)
    }

    /// Register an uploaded document: insert the book row, keep the
    /// original bytes, then parse and auto-enqueue the opening chapters.
    ///
    /// Returns the new book id. The voice must be one of the known named
    /// voices.
    pub async fn create_book(
        &self,
        filename: &str,
        voice: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let voice = match voice {
            Some(v) if NEURAL_VOICES.contains(&v) => v.to_string(),
            Some(v) => {
                return Err(Error::Validation(format!(
                    "invalid voice {:?}; choose from {:?}",
                    v, NEURAL_VOICES
                )));
            }
            None => self.config.default_voice.clone(),
        };

        let book_id = Uuid::new_v4().to_string();
        let title = filename.trim_end_matches(".epub").to_string();
        self.store
            .insert_book(Book::new(book_id.clone(), title, voice))
            .await?;

        let path = format!("epub-uploads/{}/original.epub", book_id);
        self.blobs
            .put("epub-uploads", &path, bytes.clone(), "application/epub+zip")
            .await?;

        info!("book {} uploaded, parsing started", book_id);
        ingest_document(
            &self.store,
            &self.blobs,
            &self.queue,
            &self.config,
            &book_id,
            bytes,
        )
        .await;

        Ok(book_id)
    }

    /// Enqueue one chapter for (re)conversion. Resets an errored chapter
    /// back to pending; re-enqueueing a ready chapter is a safe no-op at
    /// the worker.
    pub async fn enqueue_chapter(&self, chapter_id: &str) -> Result<()> {
        let chapter = self
            .store
            .chapter(chapter_id)
            .await?
            .ok_or_else(|| Error::not_found("chapter", chapter_id))?;

        self.queue.enqueue(chapter.book_id, chapter_id);
        self.store
            .set_chapter_status(chapter_id, ChapterStatus::Pending, None)
            .await?;
        Ok(())
    }

    /// Enqueue every pending or errored chapter of a book. Returns how
    /// many were enqueued.
    pub async fn enqueue_book(&self, book_id: &str) -> Result<usize> {
        self.store
            .book(book_id)
            .await?
            .ok_or_else(|| Error::not_found("book", book_id))?;

        let chapters = self.store.chapters_by_book(book_id).await?;
        let mut enqueued = 0;
        for chapter in chapters {
            if matches!(chapter.status, ChapterStatus::Pending | ChapterStatus::Error) {
                self.queue.enqueue(book_id, chapter.id);
                enqueued += 1;
            }
        }

        if enqueued > 0 {
            self.store
                .set_book_status(book_id, BookStatus::Converting)
                .await?;
        }
        Ok(enqueued)
    }

    /// Enqueue pending chapters with `index` in `[from_index, from_index + count)`.
    /// Called when the listener starts chapter N to pre-generate the next
    /// few. Returns how many were enqueued.
    pub async fn prefetch(&self, book_id: &str, from_index: usize, count: usize) -> Result<usize> {
        let chapters = self.store.chapters_by_book(book_id).await?;
        let mut enqueued = 0;
        for chapter in chapters {
            let in_window = chapter.index >= from_index && chapter.index < from_index + count;
            if in_window && chapter.status == ChapterStatus::Pending {
                self.queue.enqueue(book_id, chapter.id);
                enqueued += 1;
            }
        }

        if enqueued > 0 {
            self.store
                .set_book_status(book_id, BookStatus::Converting)
                .await?;
        }
        Ok(enqueued)
    }

    /// Synthesize a short text directly, bypassing the queue. Rejects
    /// empty or oversized input before any provider is called.
    pub async fn speak(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("text must not be empty".to_string()));
        }
        if trimmed.chars().count() > self.config.speak_max_chars {
            return Err(Error::Validation(format!(
                "text exceeds {} characters",
                self.config.speak_max_chars
            )));
        }

        Ok(self.synthesizer.synthesize_chunk(trimmed, voice).await?)
    }

    /// Per-status chapter counts for a book.
    pub async fn conversion_status(&self, book_id: &str) -> Result<ConversionStatus> {
        self.store
            .book(book_id)
            .await?
            .ok_or_else(|| Error::not_found("book", book_id))?;

        let chapters = self.store.chapters_by_book(book_id).await?;
        let mut status = ConversionStatus {
            total_chapters: chapters.len(),
            ready: 0,
            failed: 0,
            converting: 0,
            pending: 0,
        };
        for chapter in &chapters {
            match chapter.status {
                ChapterStatus::Ready => status.ready += 1,
                ChapterStatus::Error => status.failed += 1,
                ChapterStatus::Converting => status.converting += 1,
                ChapterStatus::Pending => status.pending += 1,
            }
        }
        Ok(status)
    }

    /// Delete a book's stored media (audio, cover, original upload), best
    /// effort: storage failures are logged and swallowed.
    pub async fn remove_book_media(&self, book_id: &str) {
        for bucket in ["audio", "covers", "epub-uploads"] {
            let prefix = format!("{}/{}", bucket, book_id);
            let result = async {
                let paths = self.blobs.list(bucket, &prefix).await?;
                if !paths.is_empty() {
                    self.blobs.remove_many(bucket, &paths).await?;
                }
                Ok::<usize, crate::store::StoreError>(paths.len())
            }
            .await;

            match result {
                Ok(removed) if removed > 0 => {
                    info!("removed {} objects under {}/{}", removed, bucket, prefix)
                }
                Ok(_) => {}
                Err(e) => warn!("could not delete {}/{}: {}", bucket, prefix, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chapter;
    use crate::store::{MemoryBlobStore, MemoryStore, StoreError, StoreResult};
    use crate::testutil::{epub_fixture, long_section};
    use crate::tts::mock_synthesizer;
    use async_trait::async_trait;
    use chrono::Utc;
    use tts_client::MockProvider;

    fn service_with(
        synthesizer: Synthesizer,
    ) -> (Arc<AudiobookService>, Arc<MemoryStore>, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let (service, _handle) = AudiobookService::start(
            store.clone(),
            blobs.clone(),
            synthesizer,
            Config::default(),
        );
        (service, store, blobs)
    }

    fn ok_synth() -> Synthesizer {
        mock_synthesizer(
            MockProvider::always_succeeds(b"mp3"),
            MockProvider::always_succeeds(b"mp3"),
        )
    }

    fn pending_chapter(id: &str, book_id: &str, index: usize, status: ChapterStatus) -> Chapter {
        Chapter {
            id: id.to_string(),
            book_id: book_id.to_string(),
            index,
            title: format!("Chương {}", index + 1),
            text: long_section(index),
            word_count: 40,
            status,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_book_stores_original_and_parses() {
        let (service, store, blobs) = service_with(ok_synth());
        let bytes = epub_fixture(
            "Truyện Mới",
            None,
            &[("<h1>Một</h1>", long_section(1)), ("", long_section(2))],
        );

        let book_id = service
            .create_book("truyen-moi.epub", None, bytes)
            .await
            .unwrap();

        let book = store.book(&book_id).await.unwrap().unwrap();
        assert_eq!(book.title, "Truyện Mới");
        assert_eq!(book.voice, "vi-VN-HoaiMyNeural");
        assert_eq!(book.total_chapters, 2);

        let original = blobs.object(
            "epub-uploads",
            &format!("epub-uploads/{}/original.epub", book_id),
        );
        assert!(original.is_some());
    }

    #[tokio::test]
    async fn test_create_book_rejects_unknown_voice() {
        let (service, _store, _blobs) = service_with(ok_synth());
        let err = service
            .create_book("x.epub", Some("en-US-GuyNeural"), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_enqueue_chapter_resets_error_state() {
        let (service, store, _blobs) = service_with(ok_synth());
        store
            .insert_book(Book::new("b1", "Truyện", "vi-VN-HoaiMyNeural"))
            .await
            .unwrap();
        let mut chapter = pending_chapter("c1", "b1", 0, ChapterStatus::Error);
        chapter.error_message = Some("hỏng lần trước".to_string());
        store.insert_chapters(vec![chapter]).await.unwrap();

        service.enqueue_chapter("c1").await.unwrap();

        let chapter = store.chapter("c1").await.unwrap().unwrap();
        // The worker may already have converted it; either way the error
        // state was cleared
        assert!(chapter.error_message.is_none() || chapter.status == ChapterStatus::Ready);
    }

    #[tokio::test]
    async fn test_enqueue_chapter_missing_is_not_found() {
        let (service, _store, _blobs) = service_with(ok_synth());
        let err = service.enqueue_chapter("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_enqueue_book_counts_pending_and_error() {
        let (service, store, _blobs) = service_with(ok_synth());
        store
            .insert_book(Book::new("b1", "Truyện", "vi-VN-HoaiMyNeural"))
            .await
            .unwrap();
        store
            .insert_chapters(vec![
                pending_chapter("c0", "b1", 0, ChapterStatus::Pending),
                pending_chapter("c1", "b1", 1, ChapterStatus::Error),
                pending_chapter("c2", "b1", 2, ChapterStatus::Ready),
            ])
            .await
            .unwrap();

        let enqueued = service.enqueue_book("b1").await.unwrap();
        assert_eq!(enqueued, 2);

        let book = store.book("b1").await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::Converting);
    }

    #[tokio::test]
    async fn test_prefetch_window_only_takes_pending() {
        let (service, store, _blobs) = service_with(ok_synth());
        store
            .insert_book(Book::new("b1", "Truyện", "vi-VN-HoaiMyNeural"))
            .await
            .unwrap();
        store
            .insert_chapters(vec![
                pending_chapter("c0", "b1", 0, ChapterStatus::Ready),
                pending_chapter("c1", "b1", 1, ChapterStatus::Pending),
                pending_chapter("c2", "b1", 2, ChapterStatus::Pending),
                pending_chapter("c3", "b1", 3, ChapterStatus::Pending),
                pending_chapter("c4", "b1", 4, ChapterStatus::Pending),
            ])
            .await
            .unwrap();

        // Window [1, 4): c1, c2, c3; c0 is ready and outside interest
        let enqueued = service.prefetch("b1", 1, 3).await.unwrap();
        assert_eq!(enqueued, 3);
    }

    #[tokio::test]
    async fn test_speak_rejects_empty_without_provider_call() {
        let primary = Arc::new(MockProvider::always_succeeds(b"mp3"));
        let fallback = Arc::new(MockProvider::always_succeeds(b"mp3"));
        let synthesizer = Synthesizer::new(primary.clone(), fallback.clone());
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryStore::new());
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let (service, _handle) =
            AudiobookService::start(store, blobs, synthesizer, Config::default());

        let err = service.speak("   ", "vi-VN-HoaiMyNeural").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(primary.call_count(), 0);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_speak_rejects_oversized() {
        let (service, _store, _blobs) = service_with(ok_synth());
        let text = "a".repeat(2001);
        let err = service.speak(&text, "vi-VN-HoaiMyNeural").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_speak_synthesizes_within_limit() {
        let (service, _store, _blobs) = service_with(ok_synth());
        let audio = service.speak("Xin chào", "vi-VN-HoaiMyNeural").await.unwrap();
        assert_eq!(audio, b"mp3");
    }

    #[tokio::test]
    async fn test_conversion_status_counts() {
        let (service, store, _blobs) = service_with(ok_synth());
        store
            .insert_book(Book::new("b1", "Truyện", "vi-VN-HoaiMyNeural"))
            .await
            .unwrap();
        store
            .insert_chapters(vec![
                pending_chapter("c0", "b1", 0, ChapterStatus::Ready),
                pending_chapter("c1", "b1", 1, ChapterStatus::Error),
                pending_chapter("c2", "b1", 2, ChapterStatus::Converting),
                pending_chapter("c3", "b1", 3, ChapterStatus::Pending),
                pending_chapter("c4", "b1", 4, ChapterStatus::Pending),
            ])
            .await
            .unwrap();

        let status = service.conversion_status("b1").await.unwrap();
        assert_eq!(
            status,
            ConversionStatus {
                total_chapters: 5,
                ready: 1,
                failed: 1,
                converting: 1,
                pending: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_remove_book_media_clears_buckets() {
        let (service, _store, blobs) = service_with(ok_synth());
        blobs
            .put("audio", "audio/b1/c1.mp3", b"mp3".to_vec(), "audio/mpeg")
            .await
            .unwrap();
        blobs
            .put("covers", "covers/b1/cover.jpg", b"img".to_vec(), "image/jpeg")
            .await
            .unwrap();
        blobs
            .put("audio", "audio/b2/c1.mp3", b"mp3".to_vec(), "audio/mpeg")
            .await
            .unwrap();

        service.remove_book_media("b1").await;

        assert!(blobs.list("audio", "audio/b1").await.unwrap().is_empty());
        assert!(blobs.list("covers", "covers/b1").await.unwrap().is_empty());
        assert_eq!(blobs.list("audio", "audio/b2").await.unwrap().len(), 1);
    }

    /// Blob store that fails every call.
    struct BrokenBlobStore;

    #[async_trait]
    impl BlobStore for BrokenBlobStore {
        async fn put(
            &self,
            _bucket: &str,
            _path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> StoreResult<String> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }

        async fn list(&self, _bucket: &str, _prefix: &str) -> StoreResult<Vec<String>> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }

        async fn remove_many(&self, _bucket: &str, _paths: &[String]) -> StoreResult<()> {
            Err(StoreError::Backend("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_remove_book_media_swallows_storage_failures() {
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryStore::new());
        let (service, _handle) = AudiobookService::start(
            store,
            Arc::new(BrokenBlobStore),
            ok_synth(),
            Config::default(),
        );

        // Must not panic or surface an error
        service.remove_book_media("b1").await;
    }
}
