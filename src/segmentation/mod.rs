/*!
 * Lossless segmentation of long source text.
 *
 * This module splits chapters into provider-sized pieces without losing,
 * duplicating or reordering a single byte:
 * - `paragraphs`: Paragraph spans and newline statistics
 * - `sentences`: Language-aware sentence spans
 * - `chunker`: Greedy paragraph/sentence packing under a size limit
 * - `source`: Immutable source text with its precomputed structure
 *
 * Every splitter here returns spans that tile the input, so concatenating
 * the pieces always reproduces the original text exactly.
 */

pub mod chunker;
pub mod paragraphs;
pub mod sentences;
pub mod source;

// Re-export main types
pub use chunker::{Chunk, Segmenter, reassemble};
pub use sentences::SentenceSplitter;
pub use source::SourceText;

/// A half-open byte range `[start, end)` into a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start after end");
        Self { start, end }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Borrow the spanned text
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    /// Shift the span by a byte offset
    pub fn offset(&self, by: usize) -> Self {
        Self::new(self.start + by, self.end + by)
    }
}

/// Count the characters (not bytes) of a text
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Count the non-whitespace characters of a text
pub fn content_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
