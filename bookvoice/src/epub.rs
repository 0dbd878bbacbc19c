// EPUB parsing and chapter segmentation

use std::collections::HashSet;
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::text::html_to_text;

/// How much of a heading is kept as a chapter title
const MAX_TITLE_CHARS: usize = 200;

/// An image resource qualifies as a cover candidate above this size.
/// Heuristic: small images are usually ornaments or spacers.
const MIN_COVER_BYTES: usize = 1000;

/// A section segmented out of the document, ready to become a chapter.
#[derive(Debug, Clone)]
pub struct ParsedSection {
    /// Dense, zero-based position among kept sections
    pub index: usize,
    pub title: String,
    /// Normalized plain text
    pub text: String,
    pub word_count: usize,
}

/// Extracted cover image
#[derive(Debug, Clone)]
pub struct Cover {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Parsed EPUB document
#[derive(Debug)]
pub struct ParsedBook {
    pub title: String,
    pub author: Option<String>,
    pub cover: Option<Cover>,
    /// Sections in spine order, already filtered and indexed
    pub sections: Vec<ParsedSection>,
}

/// Parse an EPUB from raw bytes and segment it into chapters.
///
/// Sections whose normalized text is shorter than `min_section_chars` are
/// discarded (tables of contents, copyright pages); `index` values are
/// dense over the kept sections only. Fails with [`Error::NoContent`] when
/// nothing survives the filter.
pub fn parse_document(bytes: Vec<u8>, min_section_chars: usize) -> Result<ParsedBook> {
    let mut doc = epub::doc::EpubDoc::from_reader(Cursor::new(bytes))
        .map_err(|e| Error::Document(format!("failed to open EPUB: {}", e)))?;

    let title = doc
        .mdata("title")
        .map(|m| m.value.clone())
        .unwrap_or_else(|| "Không có tiêu đề".to_string());

    let author = doc.mdata("creator").map(|m| m.value.clone());

    let cover = extract_cover(&mut doc);

    let mut sections = Vec::new();
    let mut seen_ids = HashSet::new();
    let spine = doc.spine.clone();

    for spine_item in spine.iter() {
        if !seen_ids.insert(spine_item.idref.clone()) {
            continue;
        }

        let Some((content_bytes, _mime)) = doc.get_resource(&spine_item.idref) else {
            continue;
        };

        let html = String::from_utf8_lossy(&content_bytes).to_string();
        let text = html_to_text(&html);

        // Skip very short sections (TOC, copyright pages, etc.)
        if text.chars().count() < min_section_chars {
            continue;
        }

        let index = sections.len();
        let section_title = extract_title_from_html(&html)
            .unwrap_or_else(|| format!("Chương {}", index + 1));
        let word_count = text.split_whitespace().count();

        sections.push(ParsedSection {
            index,
            title: section_title,
            text,
            word_count,
        });
    }

    if sections.is_empty() {
        return Err(Error::NoContent);
    }

    Ok(ParsedBook {
        title,
        author,
        cover,
        sections,
    })
}

/// Extract a cover image, best effort.
///
/// Tries the declared EPUB cover, then a resource literally named like a
/// cover file, then the first embedded image large enough to plausibly be
/// one. A miss returns None, never an error.
fn extract_cover<R: std::io::Read + std::io::Seek>(
    doc: &mut epub::doc::EpubDoc<R>,
) -> Option<Cover> {
    if let Some((bytes, mime)) = doc.get_cover() {
        return Some(Cover {
            bytes,
            content_type: mime,
        });
    }

    // A file named cover.jpg/cover.jpeg/cover.png
    let mut named_candidate = None;
    let mut image_candidates = Vec::new();
    for (id, resource) in doc.resources.iter() {
        let file_name = resource
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if matches!(file_name.as_str(), "cover.jpg" | "cover.jpeg" | "cover.png") {
            named_candidate = Some(id.clone());
        } else if resource.mime.starts_with("image/") {
            image_candidates.push((resource.path.clone(), id.clone()));
        }
    }

    if let Some(id) = named_candidate {
        if let Some((bytes, mime)) = doc.get_resource(&id) {
            return Some(Cover {
                bytes,
                content_type: mime,
            });
        }
    }

    // First sufficiently large embedded image, in path order so the pick
    // is deterministic
    image_candidates.sort();
    for (_, id) in image_candidates {
        if let Some((bytes, mime)) = doc.get_resource(&id) {
            if bytes.len() > MIN_COVER_BYTES {
                return Some(Cover {
                    bytes,
                    content_type: mime,
                });
            }
        }
    }

    None
}

/// Extract a chapter title from section HTML (first h1, h2, or h3).
fn extract_title_from_html(html: &str) -> Option<String> {
    let html_lower = html.to_lowercase();

    for tag in ["h1", "h2", "h3"] {
        let open = format!("<{}", tag);
        let close = format!("</{}>", tag);

        if let Some(start) = html_lower.find(&open) {
            if let Some(tag_end) = html_lower[start..].find('>') {
                let content_start = start + tag_end + 1;
                if let Some(end) = html_lower[content_start..].find(&close) {
                    // Indices come from the lowercased copy; stay safe on
                    // input where lowercasing shifted byte offsets
                    let Some(title_html) = html.get(content_start..content_start + end) else {
                        continue;
                    };
                    let title = strip_html_tags(title_html);
                    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !title.is_empty() {
                        return Some(title.chars().take(MAX_TITLE_CHARS).collect());
                    }
                }
            }
        }
    }

    None
}

/// Strip HTML tags from a string
fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result
}
