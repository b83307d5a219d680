/*!
 * Alignment pairs and the aggregate alignment report.
 */

use serde::{Deserialize, Serialize};

use crate::segmentation::content_len;

use super::aligner::AlignmentConfig;

/// Coverage above 1.0 by more than this is treated as duplication
const DUPLICATION_EPSILON: f64 = 1e-9;

/// A source fragment and the target fragment it corresponds to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentPair {
    /// One or more consecutive source sentences
    pub source_fragment: String,
    /// One or more consecutive target sentences
    pub target_fragment: String,
    /// Similarity of the two fragments, in [0, 1]
    pub confidence: f64,
}

/// Aggregate result of aligning a source text with its transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Retained pairs in source order
    pub pairs: Vec<AlignmentPair>,
    /// Aligned share of source characters; above 1.0 means duplicated fragments
    pub coverage_source: f64,
    /// Aligned share of target characters; above 1.0 means duplicated fragments
    pub coverage_target: f64,
    /// Weighted quality in [0, 1]
    pub quality_score: f64,
    /// Sentences or proposals without an acceptable counterpart
    pub misalignment_count: usize,
    /// Either coverage exceeds 1.0
    pub duplication_detected: bool,
    /// Pairs whose fragments start before the end of the preceding pair
    #[serde(default)]
    pub out_of_order_count: usize,
    /// Whether the alignment must be regenerated or reviewed
    pub needs_review: bool,
}

/// Aligned share of a text's non-whitespace characters
fn coverage<'a>(fragments: impl Iterator<Item = &'a str>, text: &str) -> f64 {
    let total = content_len(text);
    if total == 0 {
        return 0.0;
    }
    let aligned: usize = fragments.map(content_len).sum();
    aligned as f64 / total as f64
}

impl AlignmentReport {
    /// Compute coverage, quality and the review flag for a set of pairs
    pub fn build(
        pairs: Vec<AlignmentPair>,
        misalignment_count: usize,
        source: &str,
        target: &str,
        config: &AlignmentConfig,
    ) -> Self {
        let coverage_source = coverage(pairs.iter().map(|p| p.source_fragment.as_str()), source);
        let coverage_target = coverage(pairs.iter().map(|p| p.target_fragment.as_str()), target);

        let mean_confidence = if pairs.is_empty() {
            0.0
        } else {
            pairs.iter().map(|p| p.confidence).sum::<f64>() / pairs.len() as f64
        };

        // Coverage is rewarded for being close to 1.0 from either side
        let coverage_term = ((1.0 - (1.0 - coverage_source).abs()).max(0.0)
            + (1.0 - (1.0 - coverage_target).abs()).max(0.0))
            / 2.0;
        let misalignment_term =
            1.0 / (1.0 + misalignment_count as f64 * config.misalignment_penalty);

        let weight_sum = config.coverage_weight + config.confidence_weight + config.misalignment_weight;
        let quality_score = if weight_sum > 0.0 {
            ((config.coverage_weight * coverage_term
                + config.confidence_weight * mean_confidence
                + config.misalignment_weight * misalignment_term)
                / weight_sum)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };

        let duplication_detected = coverage_source > 1.0 + DUPLICATION_EPSILON
            || coverage_target > 1.0 + DUPLICATION_EPSILON;

        let needs_review = coverage_source < config.coverage_floor
            || coverage_target < config.coverage_floor
            || quality_score < config.quality_floor
            || duplication_detected;

        Self {
            pairs,
            coverage_source,
            coverage_target,
            quality_score,
            misalignment_count,
            duplication_detected,
            out_of_order_count: 0,
            needs_review,
        }
    }

    /// Record pairs that break source or target order; any of them forces review
    pub fn with_out_of_order(mut self, count: usize) -> Self {
        self.out_of_order_count = count;
        self.needs_review |= count > 0;
        self
    }

    /// Mean confidence of the retained pairs (0 without pairs)
    pub fn mean_confidence(&self) -> f64 {
        if self.pairs.is_empty() {
            return 0.0;
        }
        self.pairs.iter().map(|p| p.confidence).sum::<f64>() / self.pairs.len() as f64
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{} pairs, coverage {:.3}/{:.3}, quality {:.3}, {} misaligned{}{}{}",
            self.pairs.len(),
            self.coverage_source,
            self.coverage_target,
            self.quality_score,
            self.misalignment_count,
            if self.duplication_detected { ", duplication detected" } else { "" },
            if self.out_of_order_count > 0 { ", out of order" } else { "" },
            if self.needs_review { ", needs review" } else { "" }
        )
    }
}
