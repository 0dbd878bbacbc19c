//! Text chunking for speech synthesis.
//!
//! Splits chapter text into pieces sized for one synthesis call. Splits
//! fall on sentence boundaries where possible, then clause boundaries, and
//! a clause that still exceeds the limit is emitted oversized rather than
//! truncated — no content is ever dropped.

/// Terminal punctuation that ends a sentence.
const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Clause separators used when a single sentence exceeds the chunk limit.
const CLAUSE_SEPARATORS: &[char] = &[',', '，', '、'];

/// Split text into chunks of at most `max_chars` characters.
///
/// Returns the input unchanged as a single chunk when it already fits. A
/// chunk only exceeds `max_chars` when one sentence alone exceeds it and
/// has no clause boundary to split at.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        if char_len(&sentence) > max_chars {
            // Flush, then fall back to clause boundaries within the sentence
            flush(&mut chunks, &mut current);
            pack_clauses(&sentence, max_chars, &mut chunks, &mut current);
        } else if fits(&current, &sentence, max_chars) {
            append(&mut current, &sentence);
        } else {
            flush(&mut chunks, &mut current);
            current = sentence;
        }
    }

    flush(&mut chunks, &mut current);
    chunks
}

/// Pack the clauses of one oversized sentence. A clause over the limit is
/// pushed through as-is.
fn pack_clauses(sentence: &str, max_chars: usize, chunks: &mut Vec<String>, current: &mut String) {
    for clause in split_clauses(sentence) {
        if char_len(&clause) > max_chars {
            flush(chunks, current);
            chunks.push(clause);
        } else if fits(current, &clause, max_chars) {
            append(current, &clause);
        } else {
            flush(chunks, current);
            *current = clause;
        }
    }
    flush(chunks, current);
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn fits(current: &str, piece: &str, max_chars: usize) -> bool {
    if current.is_empty() {
        char_len(piece) <= max_chars
    } else {
        char_len(current) + 1 + char_len(piece) <= max_chars
    }
}

fn append(current: &mut String, piece: &str) {
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(piece);
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

/// Segment text into sentences at terminal punctuation followed by
/// whitespace (or end of input). A "..." run never splits mid-run.
fn split_sentences(text: &str) -> Vec<String> {
    split_after(text, SENTENCE_TERMINALS)
}

/// Segment a sentence into clauses at separator punctuation followed by
/// whitespace. The separator stays with the preceding clause.
fn split_clauses(sentence: &str) -> Vec<String> {
    split_after(sentence, CLAUSE_SEPARATORS)
}

fn split_after(text: &str, boundary: &[char]) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if boundary.contains(&c) {
            let at_boundary = match chars.peek() {
                Some(next) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                while chars.peek().is_some_and(|next| next.is_whitespace()) {
                    chars.next();
                }
                let piece = current.trim();
                if !piece.is_empty() {
                    pieces.push(piece.to_string());
                }
                current.clear();
            }
        }
    }

    let piece = current.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }

    pieces
}
