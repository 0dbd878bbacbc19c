//! Text processing for speech synthesis: markup extraction, cleaning, and
//! chunking.

pub mod chunker;
pub mod cleaner;

pub use chunker::split_text;
pub use cleaner::{clean_text, html_to_text};
