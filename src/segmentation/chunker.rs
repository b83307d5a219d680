/*!
 * Chunking of source text for size-bounded provider calls.
 *
 * Whole paragraphs are packed greedily into chunks. A paragraph that is
 * larger than the limit on its own is packed sentence by sentence instead,
 * and a sentence that is still too large becomes a flagged, oversized chunk.
 * Text is never cut inside a sentence and never truncated.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::SegmentError;
use crate::language_utils::ScriptFamily;

use super::paragraphs::split_paragraphs;
use super::sentences::SentenceSplitter;
use super::{Span, char_len};

/// A contiguous, boundary-respecting slice of a source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in source order
    pub index: usize,
    /// Byte offset of the first byte in the source
    pub start: usize,
    /// Byte offset one past the last byte in the source
    pub end: usize,
    /// The chunk text
    pub text: String,
    /// Length in characters
    pub char_len: usize,
    /// Single sentence larger than the chunk limit
    pub oversized: bool,
}

impl Chunk {
    /// Byte span of the chunk in its source
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Accumulates contiguous spans into the chunk being built
struct ChunkBuilder<'a> {
    text: &'a str,
    chunks: Vec<Chunk>,
    current: Option<Span>,
    current_chars: usize,
}

impl<'a> ChunkBuilder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chunks: Vec::new(),
            current: None,
            current_chars: 0,
        }
    }

    fn fits(&self, chars: usize, max_chunk_chars: usize) -> bool {
        self.current.is_none() || self.current_chars + chars <= max_chunk_chars
    }

    fn extend(&mut self, span: Span, chars: usize) {
        self.current = Some(match self.current {
            Some(current) => {
                debug_assert_eq!(current.end, span.start, "chunk spans must be contiguous");
                Span::new(current.start, span.end)
            }
            None => span,
        });
        self.current_chars += chars;
    }

    fn flush(&mut self) {
        if let Some(span) = self.current.take() {
            self.push(span, self.current_chars, false);
        }
        self.current_chars = 0;
    }

    fn push(&mut self, span: Span, chars: usize, oversized: bool) {
        self.chunks.push(Chunk {
            index: self.chunks.len(),
            start: span.start,
            end: span.end,
            text: span.slice(self.text).to_string(),
            char_len: chars,
            oversized,
        });
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Splits source text into chunks bounded by a character limit
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    splitter: SentenceSplitter,
}

impl Segmenter {
    /// Create a segmenter for a script family
    pub fn new(family: ScriptFamily) -> Self {
        Self {
            splitter: SentenceSplitter::new(family),
        }
    }

    /// Create a segmenter for an ISO language code
    pub fn for_language(code: &str) -> Self {
        Self {
            splitter: SentenceSplitter::for_language(code),
        }
    }

    /// The sentence splitter used for oversized paragraphs
    pub fn splitter(&self) -> &SentenceSplitter {
        &self.splitter
    }

    /// Split `text` into ordered chunks of at most `max_chunk_chars` characters.
    ///
    /// Concatenating the returned chunks reproduces `text` exactly. Only a
    /// single sentence longer than the limit may exceed it, and such a chunk
    /// has `oversized` set.
    pub fn segment(&self, text: &str, max_chunk_chars: usize) -> Result<Vec<Chunk>, SegmentError> {
        if max_chunk_chars == 0 {
            return Err(SegmentError::InvalidChunkSize(max_chunk_chars));
        }

        let mut builder = ChunkBuilder::new(text);

        for paragraph in split_paragraphs(text) {
            let paragraph_chars = char_len(paragraph.slice(text));

            if paragraph_chars <= max_chunk_chars {
                if !builder.fits(paragraph_chars, max_chunk_chars) {
                    builder.flush();
                }
                builder.extend(paragraph, paragraph_chars);
                continue;
            }

            // Paragraph alone is too large: fall back to sentence boundaries
            builder.flush();
            for sentence in self.splitter.split_spans(paragraph.slice(text)) {
                let sentence = sentence.offset(paragraph.start);
                let sentence_chars = char_len(sentence.slice(text));

                if sentence_chars > max_chunk_chars {
                    builder.flush();
                    warn!(
                        "Sentence at bytes {}..{} has {} chars, over the {} char limit; emitting it as an oversized chunk",
                        sentence.start, sentence.end, sentence_chars, max_chunk_chars
                    );
                    builder.push(sentence, sentence_chars, true);
                    continue;
                }

                if !builder.fits(sentence_chars, max_chunk_chars) {
                    builder.flush();
                }
                builder.extend(sentence, sentence_chars);
            }
        }

        let chunks = builder.finish();
        debug!(
            "Segmented {} chars into {} chunks (limit {})",
            char_len(text),
            chunks.len(),
            max_chunk_chars
        );

        Ok(chunks)
    }
}

/// Concatenate chunk texts in source order
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);
    ordered.iter().map(|c| c.text.as_str()).collect()
}
