/*!
 * Immutable source text with its logical structure.
 */

use std::sync::Arc;

use super::paragraphs::split_paragraphs;
use super::sentences::SentenceSplitter;
use super::{Span, char_len};

/// A chapter's source text, its language, and its paragraph and sentence spans.
///
/// Created once at ingestion and shared read-only; cloning is cheap.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: Arc<str>,
    language: String,
    paragraphs: Arc<[Span]>,
    sentences: Arc<[Span]>,
}

impl SourceText {
    /// Analyse a text in the given language
    pub fn new(text: impl Into<String>, language: &str) -> Self {
        let text: Arc<str> = Arc::from(text.into());
        let splitter = SentenceSplitter::for_language(language);

        let paragraphs: Arc<[Span]> = split_paragraphs(&text).into();
        let sentences: Arc<[Span]> = splitter.split_spans(&text).into();

        Self {
            text,
            language: language.to_string(),
            paragraphs,
            sentences,
        }
    }

    /// The full text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// ISO language code of the text
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether the text has no visible content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    /// Lossless paragraph spans
    pub fn paragraph_spans(&self) -> &[Span] {
        &self.paragraphs
    }

    /// Lossless sentence spans
    pub fn sentence_spans(&self) -> &[Span] {
        &self.sentences
    }

    /// Paragraph texts with surrounding whitespace trimmed
    pub fn paragraphs(&self) -> Vec<&str> {
        self.paragraphs
            .iter()
            .map(|s| s.slice(&self.text).trim())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Sentence texts with surrounding whitespace trimmed
    pub fn sentences(&self) -> Vec<&str> {
        self.sentences
            .iter()
            .map(|s| s.slice(&self.text).trim())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
