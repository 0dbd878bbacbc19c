//! Conversion job queue and its single worker.
//!
//! Jobs flow through an unbounded FIFO channel owned by one long-lived
//! worker task: exactly one job executes at a time, in enqueue order, so
//! no two jobs for the same chapter ever run concurrently. The queue is
//! in-memory only — a restart loses queued jobs, and re-enqueueing is the
//! recovery path. Duplicate enqueues are harmless: a chapter that is
//! already `ready` is skipped.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::audio::assemble;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{AudioFile, BookStatus, ChapterStatus};
use crate::store::{BlobStore, MetadataStore, StoreError};
use crate::text::split_text;
use crate::tts::Synthesizer;

/// Chapter error messages are cut to this many characters before storing.
const MAX_ERROR_CHARS: usize = 500;

/// A pending request to synthesize audio for one chapter.
#[derive(Debug, Clone)]
pub struct Job {
    pub book_id: String,
    pub chapter_id: String,
}

pub type JobReceiver = mpsc::UnboundedReceiver<Job>;

/// Create the job channel. The receiver goes to [`Worker::spawn`]; the
/// handle is cloned into whatever enqueues jobs.
pub fn channel() -> (QueueHandle, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueHandle { tx }, rx)
}

/// Clonable enqueue side of the job queue.
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl QueueHandle {
    pub fn enqueue(&self, book_id: impl Into<String>, chapter_id: impl Into<String>) {
        let job = Job {
            book_id: book_id.into(),
            chapter_id: chapter_id.into(),
        };
        if self.tx.send(job).is_err() {
            warn!("job queue is closed; dropping conversion job");
        }
    }
}

/// The single queue consumer.
pub struct Worker {
    store: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    synthesizer: Arc<Synthesizer>,
    config: Arc<Config>,
}

impl Worker {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        synthesizer: Arc<Synthesizer>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            blobs,
            synthesizer,
            config,
        }
    }

    /// Start draining jobs. Runs until every [`QueueHandle`] is dropped.
    pub fn spawn(self, rx: JobReceiver) -> JoinHandle<()> {
        info!("conversion worker started");
        tokio::spawn(self.run(rx))
    }

    async fn run(self, mut rx: JobReceiver) {
        while let Some(job) = rx.recv().await {
            self.handle_job(&job).await;
        }
        info!("conversion worker stopped");
    }

    /// Process one job, containing any failure: the chapter is marked
    /// errored and the loop moves on.
    pub async fn handle_job(&self, job: &Job) {
        if let Err(e) = self.process(job).await {
            error!("error processing chapter {}: {}", job.chapter_id, e);
            self.mark_chapter_error(&job.chapter_id, &e.to_string()).await;
        }
    }

    async fn process(&self, job: &Job) -> Result<()> {
        // Duplicate enqueues and deleted chapters are no-ops
        let Some(chapter) = self.store.chapter(&job.chapter_id).await? else {
            return Ok(());
        };
        if chapter.status == ChapterStatus::Ready {
            return Ok(());
        }

        if chapter.text.trim().is_empty() {
            self.mark_chapter_error(&job.chapter_id, "No text content").await;
            return Ok(());
        }

        self.store
            .set_chapter_status(&job.chapter_id, ChapterStatus::Converting, None)
            .await?;

        // Voice comes from the owning book; a book deleted mid-flight
        // degrades to a no-op
        let Some(book) = self.store.book(&job.book_id).await? else {
            warn!(
                "book {} vanished while chapter {} was queued",
                job.book_id, job.chapter_id
            );
            return Ok(());
        };

        let chunks = split_text(&chapter.text, self.config.max_chunk_chars);
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            parts.push(self.synthesizer.synthesize_chunk(chunk, &book.voice).await?);
        }

        let assembled = assemble(parts)?;
        let file_size_bytes = assembled.bytes.len() as u64;
        let duration_seconds = assembled.duration_seconds;

        let storage_path = format!("audio/{}/{}.mp3", job.book_id, job.chapter_id);
        let public_url = self
            .blobs
            .put("audio", &storage_path, assembled.bytes, "audio/mpeg")
            .await?;

        let artifact = AudioFile {
            id: Uuid::new_v4().to_string(),
            chapter_id: job.chapter_id.clone(),
            book_id: job.book_id.clone(),
            storage_path,
            public_url,
            file_size_bytes,
            duration_seconds,
            voice: book.voice.clone(),
        };
        match self.store.upsert_audio(artifact).await {
            Err(StoreError::NotFound { .. }) => {
                warn!(
                    "chapter {} vanished before its audio could be recorded",
                    job.chapter_id
                );
                return Ok(());
            }
            other => other?,
        }
        match self
            .store
            .set_chapter_status(&job.chapter_id, ChapterStatus::Ready, None)
            .await
        {
            Err(StoreError::NotFound { .. }) => {
                warn!(
                    "chapter {} vanished before it could be marked ready",
                    job.chapter_id
                );
                return Ok(());
            }
            other => other?,
        }

        info!(
            "chapter {} converted ({} chunks, {:.1}s)",
            job.chapter_id,
            chunks.len(),
            duration_seconds
        );

        self.recompute_book_status(&job.book_id).await;
        Ok(())
    }

    /// Mark a chapter errored, best effort.
    async fn mark_chapter_error(&self, chapter_id: &str, message: &str) {
        let truncated = truncate_chars(message, MAX_ERROR_CHARS);
        if let Err(e) = self
            .store
            .set_chapter_status(chapter_id, ChapterStatus::Error, Some(truncated))
            .await
        {
            error!("could not mark chapter {} as error: {}", chapter_id, e);
        }
    }

    /// Derive the book's aggregate status from its chapters: still
    /// converting while any chapter is pending or converting, then ready
    /// if at least one chapter made it, otherwise error. Best effort.
    async fn recompute_book_status(&self, book_id: &str) {
        let result = async {
            let chapters = self.store.chapters_by_book(book_id).await?;
            if chapters.is_empty() {
                return Ok(());
            }

            let in_flight = chapters.iter().any(|c| {
                matches!(c.status, ChapterStatus::Pending | ChapterStatus::Converting)
            });
            if in_flight {
                return Ok(());
            }

            let has_ready = chapters.iter().any(|c| c.status == ChapterStatus::Ready);
            let status = if has_ready {
                BookStatus::Ready
            } else {
                BookStatus::Error
            };
            self.store.set_book_status(book_id, status).await?;
            info!("book {} marked as {:?}", book_id, status);
            Ok::<(), Error>(())
        }
        .await;

        if let Err(e) = result {
            error!("could not recompute status for book {}: {}", book_id, e);
        }
    }
}

fn truncate_chars(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        message.to_string()
    } else {
        message.chars().take(max_chars).collect()
    }
}
