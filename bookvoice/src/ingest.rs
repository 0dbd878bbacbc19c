//! Document ingestion: parse an uploaded EPUB into chapters and kick off
//! conversion.
//!
//! Parsing is all-or-nothing: chapters and book metadata are committed
//! together, and any failure surfaces as book status `error` with no
//! partial chapter set left behind.

use std::sync::Arc;

use chrono::Utc;
use log::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::epub::parse_document;
use crate::error::Result;
use crate::model::{BookStatus, Chapter, ChapterStatus};
use crate::queue::QueueHandle;
use crate::store::{BlobStore, MetadataStore, ParsedBookMeta};

/// Parse `bytes` into chapters for `book_id` and enqueue the first few.
///
/// Never propagates: the error boundary for ingestion is the book row
/// itself.
pub async fn ingest_document(
    store: &Arc<dyn MetadataStore>,
    blobs: &Arc<dyn BlobStore>,
    queue: &QueueHandle,
    config: &Config,
    book_id: &str,
    bytes: Vec<u8>,
) {
    if let Err(e) = run_ingest(store, blobs, queue, config, book_id, bytes).await {
        error!("error parsing book {}: {}", book_id, e);
        if let Err(e) = store.set_book_status(book_id, BookStatus::Error).await {
            error!("could not mark book {} as error: {}", book_id, e);
        }
    }
}

async fn run_ingest(
    store: &Arc<dyn MetadataStore>,
    blobs: &Arc<dyn BlobStore>,
    queue: &QueueHandle,
    config: &Config,
    book_id: &str,
    bytes: Vec<u8>,
) -> Result<()> {
    let parsed = parse_document(bytes, config.min_chapter_chars)?;

    let cover_url = match parsed.cover {
        Some(cover) => {
            let path = format!("covers/{}/cover.jpg", book_id);
            let url = blobs
                .put("covers", &path, cover.bytes, &cover.content_type)
                .await?;
            Some(url)
        }
        None => None,
    };

    let now = Utc::now();
    let chapters: Vec<Chapter> = parsed
        .sections
        .into_iter()
        .map(|section| Chapter {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            index: section.index,
            title: section.title,
            text: section.text,
            word_count: section.word_count,
            status: ChapterStatus::Pending,
            error_message: None,
            created_at: now,
        })
        .collect();

    let total_chapters = chapters.len();
    let first_ids: Vec<String> = chapters
        .iter()
        .take(config.prefetch_ahead)
        .map(|c| c.id.clone())
        .collect();

    store.insert_chapters(chapters).await?;
    store
        .mark_book_parsed(
            book_id,
            ParsedBookMeta {
                title: parsed.title,
                author: parsed.author,
                cover_url,
                total_chapters,
            },
        )
        .await?;

    info!("book {}: parsed {} chapters", book_id, total_chapters);

    // Only the first few chapters convert up front; the rest are enqueued
    // on demand as the listener approaches them
    for chapter_id in first_ids {
        queue.enqueue(book_id, chapter_id);
    }

    store.set_book_status(book_id, BookStatus::Converting).await?;
    Ok(())
}
