//! Language utilities for ISO language code handling
//!
//! Source and target texts are tagged with ISO 639-1 (2-letter) or
//! ISO 639-2 (3-letter) codes. The code decides which sentence terminators
//! the segmenter and the aligner use for that text.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// ISO 639-2/T codes of languages written without inter-word spaces and
/// with full-width sentence punctuation
const FULL_WIDTH_LANGUAGES: &[&str] = &["zho", "jpn", "kor", "yue", "wuu", "lzh"];

/// Writing-system family, as far as sentence splitting is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptFamily {
    /// Space-separated scripts with `.`, `!`, `?` terminators
    #[default]
    Latin,
    /// CJK scripts with full-width terminators and no spacing requirement
    Cjk,
}

impl ScriptFamily {
    /// Whether the character ends a sentence in this script family
    pub fn is_terminator(&self, ch: char) -> bool {
        match self {
            ScriptFamily::Latin => matches!(ch, '.' | '!' | '?' | '…' | '。' | '！' | '？'),
            ScriptFamily::Cjk => matches!(ch, '。' | '！' | '？' | '…' | '!' | '?' | '．'),
        }
    }

    /// Whether a terminator must be followed by whitespace to close a sentence
    pub fn requires_space_after_terminator(&self) -> bool {
        matches!(self, ScriptFamily::Latin)
    }
}

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized_code) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized_code).is_some() {
                return Ok(normalized_code);
            }
            if let Some(terminology) = bibliographic_to_terminology(&normalized_code) {
                return Ok(terminology.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Validate that a code names a known language
pub fn validate_language_code(code: &str) -> Result<()> {
    normalize_to_part2t(code).map(|_| ())
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Script family for a language code. Unknown codes fall back to Latin rules.
pub fn script_family(code: &str) -> ScriptFamily {
    match normalize_to_part2t(code) {
        Ok(part2t) if FULL_WIDTH_LANGUAGES.contains(&part2t.as_str()) => ScriptFamily::Cjk,
        _ => ScriptFamily::Latin,
    }
}
