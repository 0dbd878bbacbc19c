//! Text cleaning: turn chapter markup into plain speakable text.

use once_cell::sync::Lazy;
use regex::Regex;

use html2text::render::text_renderer::TrivialDecorator;

/// Render width passed to html2text. Wide enough that paragraphs stay on
/// one line and wrapping never splits a sentence mid-clause.
const RENDER_WIDTH: usize = 1000;

/// Elements that produce no speakable content. Stripped wholesale before
/// rendering, including everything they contain.
static NON_SPEECH_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?is)<script\b.*?</script\s*>",
        r"|<style\b.*?</style\s*>",
        r"|<table\b.*?</table\s*>",
        r"|<nav\b.*?</nav\s*>",
        r"|<aside\b.*?</aside\s*>",
        r"|<figure\b.*?</figure\s*>",
        r"|<figcaption\b.*?</figcaption\s*>",
    ))
    .expect("non-speech block pattern should compile")
});

static IMG_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("img pattern should compile"));

/// Convert HTML chapter content to clean plain text for TTS.
///
/// Never fails: malformed markup degrades to best-effort extraction.
pub fn html_to_text(html: &str) -> String {
    let stripped = NON_SPEECH_BLOCKS.replace_all(html, "\n");
    let stripped = IMG_TAGS.replace_all(&stripped, "");

    // Block-level boundaries become newlines in the rendered text
    let text =
        html2text::from_read_with_decorator(stripped.as_bytes(), RENDER_WIDTH, TrivialDecorator::new());

    // The renderer can mark heading lines with leading hashes; those are
    // markup, not prose
    let text: String = text
        .lines()
        .map(strip_heading_marks)
        .collect::<Vec<_>>()
        .join("\n");

    clean_text(&text)
}

fn strip_heading_marks(line: &str) -> &str {
    let stripped = line.trim_start_matches('#');
    if stripped.len() != line.len() && stripped.starts_with(' ') {
        stripped.trim_start()
    } else {
        line
    }
}

/// Normalize whitespace and remove TTS-unfriendly noise.
///
/// - collapses runs of spaces/tabs to a single space
/// - trims each line and drops footnote-marker lines (purely digits and
///   punctuation, e.g. `[12]`)
/// - collapses runs of 3+ newlines to exactly 2
/// - collapses runs of 5+ periods to a 3-dot ellipsis
pub fn clean_text(text: &str) -> String {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let line = collapse_spaces(raw_line.trim());
        if is_footnote_marker(&line) {
            lines.push(String::new());
        } else {
            lines.push(line);
        }
    }

    let joined = lines.join("\n");
    let collapsed = collapse_newlines(&joined);
    let ellipsized = fix_period_runs(&collapsed);
    ellipsized.trim().to_string()
}

/// Collapse runs of spaces and tabs into one space.
fn collapse_spaces(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut prev_was_space = false;

    for c in line.chars() {
        if c == ' ' || c == '\t' {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            prev_was_space = false;
            result.push(c);
        }
    }

    result
}

/// Lines that carry only digits and punctuation are footnote markers or
/// page numbers, not prose.
fn is_footnote_marker(line: &str) -> bool {
    !line.is_empty()
        && line.chars().any(|c| c.is_ascii_digit())
        && line
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_punctuation() || c == ' ')
}

/// Collapse more than 2 consecutive newlines down to 2.
fn collapse_newlines(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut newline_count = 0;

    for c in text.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
        } else {
            newline_count = 0;
            result.push(c);
        }
    }

    result
}

/// Replace runs of 5 or more periods with a plain 3-dot ellipsis.
fn fix_period_runs(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut run = 0usize;

    for c in text.chars() {
        if c == '.' {
            run += 1;
        } else {
            flush_periods(&mut result, run);
            run = 0;
            result.push(c);
        }
    }
    flush_periods(&mut result, run);

    result
}

fn flush_periods(result: &mut String, run: usize) {
    if run >= 5 {
        result.push_str("...");
    } else {
        for _ in 0..run {
            result.push('.');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scripts_and_styles() {
        let html = "<p>Ngày xưa có một người.</p><script>alert('x')</script><style>p{}</style>";
        let text = html_to_text(html);
        assert!(text.contains("Ngày xưa có một người."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("p{}"));
    }

    #[test]
    fn test_strips_tables_and_nav() {
        let html = "<nav><a href='#c1'>Mục lục</a></nav><p>Thân bài.</p><table><tr><td>42</td></tr></table>";
        let text = html_to_text(html);
        assert!(text.contains("Thân bài."));
        assert!(!text.contains("Mục lục"));
        assert!(!text.contains("42"));
    }

    #[test]
    fn test_block_boundaries_become_newlines() {
        let html = "<h1>Chương 1</h1><p>Đoạn một.</p><p>Đoạn hai.</p>";
        let text = html_to_text(html);
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["Chương 1", "Đoạn một.", "Đoạn hai."]);
    }

    #[test]
    fn test_strip_heading_marks() {
        assert_eq!(strip_heading_marks("## Chương 2"), "Chương 2");
        assert_eq!(strip_heading_marks("đánh số #1 trong bảng"), "đánh số #1 trong bảng");
        assert_eq!(strip_heading_marks("#không có cách"), "#không có cách");
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(clean_text("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(clean_text("xin   chào\t\tbạn"), "xin chào bạn");
    }

    #[test]
    fn test_removes_footnote_marker_lines() {
        assert_eq!(clean_text("đoạn văn\n[12]\ntiếp theo"), "đoạn văn\n\ntiếp theo");
        assert_eq!(clean_text("đoạn văn\n(3)\ntiếp"), "đoạn văn\n\ntiếp");
        // A line with letters is prose, not a marker
        assert_eq!(clean_text("trang 12"), "trang 12");
    }

    #[test]
    fn test_period_runs() {
        assert_eq!(clean_text("chờ đã......."), "chờ đã...");
        // 3- and 4-dot runs are left alone
        assert_eq!(clean_text("chờ đã..."), "chờ đã...");
        assert_eq!(clean_text("chờ đã...."), "chờ đã....");
    }

    #[test]
    fn test_trims_result() {
        assert_eq!(clean_text("  \n xin chào \n  "), "xin chào");
    }

    #[test]
    fn test_malformed_markup_degrades() {
        let text = html_to_text("<p>mở đầu <b>không đóng");
        assert!(text.contains("mở đầu"));
        assert!(text.contains("không đóng"));
    }
}
