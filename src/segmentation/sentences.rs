/*!
 * Language-aware sentence splitting.
 *
 * Sentences end at a terminal punctuation mark (plus any closing quotes or
 * brackets that follow it) or at a line break. Trailing whitespace is kept
 * with the sentence it follows, so the spans tile the input.
 */

use crate::language_utils::{ScriptFamily, script_family};

use super::Span;

/// Characters that may trail a terminator and still belong to the sentence
const CLOSERS: &[char] = &[
    '"', '\'', '”', '’', '»', ')', ']', '}', '」', '』', '）', '》', '】', '〉',
];

/// Latin abbreviations that end with a period but do not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "jr", "sr", "vs", "etc", "e.g", "i.e", "no", "prof", "mt",
];

/// Splits text into sentences using a script family's terminators
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceSplitter {
    family: ScriptFamily,
}

impl SentenceSplitter {
    /// Create a splitter for a script family
    pub fn new(family: ScriptFamily) -> Self {
        Self { family }
    }

    /// Create a splitter for an ISO language code
    pub fn for_language(code: &str) -> Self {
        Self::new(script_family(code))
    }

    /// Script family used by this splitter
    pub fn family(&self) -> ScriptFamily {
        self.family
    }

    /// Split text into lossless sentence spans
    pub fn split_spans(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((idx, ch)) = chars.next() {
            let mut boundary = None;

            if ch == '\n' {
                boundary = Some(idx + ch.len_utf8());
            } else if self.family.is_terminator(ch) {
                // Absorb runs like "?!" and closing quotes
                let mut end = idx + ch.len_utf8();
                while let Some(&(next_idx, next)) = chars.peek() {
                    if self.family.is_terminator(next) || CLOSERS.contains(&next) {
                        end = next_idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }

                let at_end = end == text.len();
                let followed_by_space = text[end..].starts_with(char::is_whitespace);
                let closes = if self.family.requires_space_after_terminator() {
                    (at_end || followed_by_space) && !ends_with_abbreviation(&text[start..idx], ch)
                } else {
                    true
                };

                if closes {
                    boundary = Some(end);
                }
            }

            if let Some(mut end) = boundary {
                // Trailing whitespace (including further newlines) stays with this sentence
                while let Some(&(next_idx, next)) = chars.peek() {
                    if next.is_whitespace() {
                        end = next_idx + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                spans.push(Span::new(start, end));
                start = end;
            }
        }

        if start < text.len() {
            spans.push(Span::new(start, text.len()));
        }

        spans
    }

    /// Split text into trimmed, non-empty sentences
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_spans(text)
            .into_iter()
            .map(|span| span.slice(text).trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Whether the word right before a period is a known abbreviation or an initial
fn ends_with_abbreviation(before: &str, terminator: char) -> bool {
    if terminator != '.' {
        return false;
    }

    let word = before
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '"')
        .next()
        .unwrap_or("");

    if word.is_empty() {
        return false;
    }

    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        return first.is_uppercase();
    }

    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}
