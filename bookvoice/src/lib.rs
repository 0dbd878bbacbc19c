//! bookvoice - convert uploaded EPUB books to per-chapter audio
//!
//! The asynchronous conversion pipeline behind an audiobook service:
//! chapter segmentation, text normalization and chunking, a single-consumer
//! job queue with provider retry and fallback, audio assembly, and the
//! status state machine tracking each chapter and book.
//!
//! The HTTP layer, authentication, and concrete storage backends live
//! elsewhere; this crate consumes stores through the traits in [`store`]
//! and exposes [`AudiobookService`] as its surface.

pub mod audio;
pub mod config;
pub mod epub;
pub mod error;
pub mod ingest;
pub mod model;
pub mod queue;
pub mod service;
pub mod store;
pub mod text;
pub mod tts;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{AudioFile, Book, BookStatus, Chapter, ChapterStatus};
pub use queue::{Job, QueueHandle, Worker};
pub use service::{AudiobookService, ConversionStatus};
pub use tts::Synthesizer;
