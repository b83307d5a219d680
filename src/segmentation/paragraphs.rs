/*!
 * Paragraph detection and newline statistics.
 *
 * A paragraph is a maximal run of non-blank lines. Paragraphs are separated
 * by one or more blank (empty or whitespace-only) lines.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::Span;

/// Two or more line breaks, optionally with whitespace between them
static PARAGRAPH_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[^\S\n]*(?:\r?\n[^\S\n]*)+").expect("paragraph break regex"));

/// Split text into lossless paragraph spans.
///
/// Each span holds a paragraph plus the blank lines that follow it. Leading
/// blank lines belong to the first span, so the spans tile the whole input.
pub fn split_paragraphs(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    let mut seen_content = false;
    let mut in_gap = false;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if seen_content {
                in_gap = true;
            }
        } else {
            if in_gap {
                spans.push(Span::new(start, pos));
                start = pos;
                in_gap = false;
            }
            seen_content = true;
        }
        pos += line.len();
    }

    if pos > start {
        spans.push(Span::new(start, pos));
    }

    spans
}

/// Collapse every run of blank lines into a single paragraph break
pub fn normalize_paragraph_breaks(text: &str) -> String {
    PARAGRAPH_BREAK_RE
        .replace_all(text.trim(), "\n\n")
        .into_owned()
}

/// Count paragraphs after blank-line normalization
pub fn count_paragraphs(text: &str) -> usize {
    normalize_paragraph_breaks(text)
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .count()
}

/// Line-break profile of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NewlineStats {
    /// Line breaks that are not part of a paragraph break
    pub single_breaks: usize,
    /// Runs of two or more line breaks
    pub paragraph_breaks: usize,
    /// Lines with visible content
    pub non_blank_lines: usize,
}

impl NewlineStats {
    /// Measure a text. Leading and trailing whitespace is ignored.
    pub fn measure(text: &str) -> Self {
        let trimmed = text.trim();
        let total_newlines = trimmed.matches('\n').count();

        let mut paragraph_breaks = 0;
        let mut newlines_in_breaks = 0;
        for m in PARAGRAPH_BREAK_RE.find_iter(trimmed) {
            paragraph_breaks += 1;
            newlines_in_breaks += m.as_str().matches('\n').count();
        }

        let non_blank_lines = trimmed.lines().filter(|l| !l.trim().is_empty()).count();

        Self {
            single_breaks: total_newlines - newlines_in_breaks,
            paragraph_breaks,
            non_blank_lines,
        }
    }
}
