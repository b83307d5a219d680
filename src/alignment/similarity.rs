/*!
 * Cross-language sentence similarity.
 *
 * Translations rarely share surface words with their source, so similarity is
 * built from language-neutral signals:
 * - Length agreement, calibrated by the length ratio of the enclosing block
 * - Anchor overlap: digit runs and question/exclamation marks survive translation
 */

use crate::segmentation::content_len;

/// Weight of the length score when anchors are present
const LENGTH_WEIGHT: f64 = 0.7;

/// Weight of the anchor score when anchors are present
const ANCHOR_WEIGHT: f64 = 0.3;

/// Features of a sentence or a run of sentences used for scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    /// Non-whitespace character count
    pub content_len: usize,
    /// Sorted anchor tokens
    pub anchors: Vec<String>,
}

impl Features {
    /// Extract features from a text
    pub fn of(text: &str) -> Self {
        Self {
            content_len: content_len(text),
            anchors: extract_anchors(text),
        }
    }

    /// Features of two consecutive fragments taken together
    pub fn merge(&self, other: &Features) -> Self {
        let mut anchors = Vec::with_capacity(self.anchors.len() + other.anchors.len());
        anchors.extend(self.anchors.iter().cloned());
        anchors.extend(other.anchors.iter().cloned());
        anchors.sort();

        Self {
            content_len: self.content_len + other.content_len,
            anchors,
        }
    }
}

/// Extract the anchor tokens of a text, sorted
pub fn extract_anchors(text: &str) -> Vec<String> {
    let mut anchors = Vec::new();
    let mut digits = String::new();

    for ch in text.chars() {
        if let Some(d) = normalize_digit(ch) {
            digits.push(d);
            continue;
        }
        if !digits.is_empty() {
            anchors.push(std::mem::take(&mut digits));
        }
        match ch {
            '?' | '？' => anchors.push("?".to_string()),
            '!' | '！' => anchors.push("!".to_string()),
            _ => {}
        }
    }
    if !digits.is_empty() {
        anchors.push(digits);
    }

    anchors.sort();
    anchors
}

/// Map ASCII and full-width digits to ASCII
fn normalize_digit(ch: char) -> Option<char> {
    match ch {
        '0'..='9' => Some(ch),
        '０'..='９' => char::from_u32(ch as u32 - '０' as u32 + '0' as u32),
        _ => None,
    }
}

/// Dice overlap of two sorted token multisets
fn anchor_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let (mut i, mut j, mut common) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                common += 1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }

    2.0 * common as f64 / (a.len() + b.len()) as f64
}

/// Scores candidate pairs inside one block of jointly transformed text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScorer {
    expected_ratio: f64,
}

impl SimilarityScorer {
    /// Create a scorer expecting `target_len / source_len` to be `expected_ratio`
    pub fn new(expected_ratio: f64) -> Self {
        Self { expected_ratio }
    }

    /// Create a scorer calibrated on a source block and its transformation
    pub fn calibrated(source_block: &str, target_block: &str) -> Self {
        let source_len = content_len(source_block);
        let target_len = content_len(target_block);
        if source_len == 0 || target_len == 0 {
            return Self::new(1.0);
        }
        Self::new(target_len as f64 / source_len as f64)
    }

    /// Expected target/source length ratio
    pub fn expected_ratio(&self) -> f64 {
        self.expected_ratio
    }

    /// Agreement of a pair's length ratio with the expected ratio, in [0, 1]
    pub fn length_score(&self, source_len: usize, target_len: usize) -> f64 {
        if source_len == 0 || target_len == 0 || self.expected_ratio <= 0.0 {
            return 0.0;
        }
        let ratio = target_len as f64 / source_len as f64;
        ratio.min(self.expected_ratio) / ratio.max(self.expected_ratio)
    }

    /// Similarity of two fragments, in [0, 1]
    pub fn score(&self, source: &Features, target: &Features) -> f64 {
        let length = self.length_score(source.content_len, target.content_len);
        if source.anchors.is_empty() && target.anchors.is_empty() {
            return length;
        }
        LENGTH_WEIGHT * length + ANCHOR_WEIGHT * anchor_overlap(&source.anchors, &target.anchors)
    }

    /// Similarity of two raw texts
    pub fn score_text(&self, source: &str, target: &str) -> f64 {
        self.score(&Features::of(source), &Features::of(target))
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(1.0)
    }
}
