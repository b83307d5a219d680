/*!
 * Paragraph-structure validation.
 *
 * Counts paragraphs in the source and the transformed text after blank-line
 * normalization and compares them. Some sources put every logical line on
 * its own line and rarely use blank lines, which makes the raw paragraph
 * count of the source meaningless. Two heuristics handle that:
 *
 * 1. Recount: when single line breaks dominate (`single > double * factor`)
 *    and the source still has more than `recount_min_breaks` blank-line
 *    breaks, the source is measured in non-blank lines instead. If the
 *    output already looks richly structured (many paragraphs and enough
 *    volume), the recount is skipped as a soft pass.
 * 2. Override: when single line breaks dominate at all, the output has a
 *    reasonable number of paragraphs and enough volume, the ratio is forced
 *    to 1.0.
 *
 * The recount runs first. The override is evaluated last, against the
 * counts the recount left behind, and wins when it applies.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::segmentation::paragraphs::{NewlineStats, count_paragraphs};

/// Outcome of the line-mode heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    /// Source uses blank-line paragraphs; counts compared as-is
    #[default]
    NotDetected,
    /// Source is line-oriented but the output looked structured enough to skip the recount
    SoftPass,
    /// Both texts were recounted in non-blank lines
    Recounted,
    /// Ratio forced to 1.0
    Overridden,
}

/// Structural issue found by the check; always blocks acceptance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructureIssue {
    /// Paragraph ratio below the critical threshold
    StructuralLoss {
        ratio: f64,
        threshold: f64,
        original_paragraphs: usize,
        transformed_paragraphs: usize,
    },
}

impl std::fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureIssue::StructuralLoss {
                ratio,
                threshold,
                original_paragraphs,
                transformed_paragraphs,
            } => write!(
                f,
                "structural loss: paragraph ratio {:.3} < {:.2} ({} -> {} paragraphs)",
                ratio, threshold, original_paragraphs, transformed_paragraphs
            ),
        }
    }
}

/// Result of a structure check
#[derive(Debug, Clone, PartialEq)]
pub struct StructureCheck {
    /// Source paragraph count used for the ratio
    pub original_paragraphs: usize,
    /// Transformed paragraph count used for the ratio
    pub transformed_paragraphs: usize,
    /// Source paragraph count before any recount
    pub original_paragraphs_initial: usize,
    /// Transformed paragraph count before any recount
    pub transformed_paragraphs_initial: usize,
    /// Transformed / source paragraph ratio
    pub paragraph_ratio: f64,
    /// Which heuristic shaped the result
    pub line_mode: LineMode,
    /// Issue found, if any
    pub issue: Option<StructureIssue>,
}

/// Thresholds for structure validation
#[derive(Debug, Clone, PartialEq)]
pub struct StructureValidatorConfig {
    /// Paragraph ratio below which structure is considered lost
    pub critical_ratio: f64,
    /// Single breaks must exceed double breaks times this factor for line mode
    pub single_newline_factor: f64,
    /// Blank-line breaks required before the recount applies
    pub recount_min_breaks: usize,
    /// Output paragraphs above which a soft pass is possible
    pub soft_pass_min_paragraphs: usize,
    /// Length ratio above which a soft pass is possible
    pub soft_pass_min_length_ratio: f64,
    /// Length ratio above which the override is possible
    pub override_min_length_ratio: f64,
    /// Upper cap of the override's paragraph requirement
    pub override_paragraph_cap: usize,
    /// Lower floor of the override's paragraph requirement
    pub override_paragraph_floor: usize,
    /// Divisor applied to the source paragraph count for the override requirement
    pub override_paragraph_divisor: usize,
}

impl Default for StructureValidatorConfig {
    fn default() -> Self {
        Self {
            critical_ratio: 0.6,
            single_newline_factor: 1.8,
            recount_min_breaks: 10,
            soft_pass_min_paragraphs: 20,
            soft_pass_min_length_ratio: 0.7,
            override_min_length_ratio: 0.65,
            override_paragraph_cap: 20,
            override_paragraph_floor: 5,
            override_paragraph_divisor: 3,
        }
    }
}

/// Paragraph-structure validator
#[derive(Debug, Clone, Default)]
pub struct StructureValidator {
    config: StructureValidatorConfig,
}

impl StructureValidator {
    /// Create a new validator with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new validator with custom thresholds
    pub fn with_config(config: StructureValidatorConfig) -> Self {
        Self { config }
    }

    /// Paragraphs the output needs for the override to apply
    fn override_requirement(&self, original_initial: usize) -> usize {
        let divisor = self.config.override_paragraph_divisor.max(1);
        (original_initial / divisor)
            .max(self.config.override_paragraph_floor)
            .min(self.config.override_paragraph_cap)
    }

    /// Compare the paragraph structure of a transformed text with its source.
    ///
    /// `length_ratio` is the volume ratio already computed for the pair.
    pub fn check(&self, original: &str, transformed: &str, length_ratio: f64) -> StructureCheck {
        let original_initial = count_paragraphs(original);
        let transformed_initial = count_paragraphs(transformed);
        let stats = NewlineStats::measure(original);

        let lines_dominate = stats.single_breaks as f64
            > stats.paragraph_breaks as f64 * self.config.single_newline_factor;
        let recount_applies = lines_dominate && stats.paragraph_breaks > self.config.recount_min_breaks;

        let mut original_paragraphs = original_initial;
        let mut transformed_paragraphs = transformed_initial;
        let mut line_mode = LineMode::NotDetected;

        if recount_applies {
            let soft_pass = stats.non_blank_lines >= original_initial
                && transformed_initial > self.config.soft_pass_min_paragraphs
                && length_ratio > self.config.soft_pass_min_length_ratio;

            if soft_pass {
                line_mode = LineMode::SoftPass;
            } else {
                let transformed_lines = NewlineStats::measure(transformed).non_blank_lines;
                original_paragraphs = stats.non_blank_lines;
                transformed_paragraphs = transformed_initial.max(transformed_lines);
                line_mode = LineMode::Recounted;
            }
        }

        let mut paragraph_ratio = if original_paragraphs == 0 {
            0.0
        } else {
            transformed_paragraphs as f64 / original_paragraphs as f64
        };

        if lines_dominate
            && stats.non_blank_lines >= original_initial
            && transformed_paragraphs >= self.override_requirement(original_initial)
            && length_ratio > self.config.override_min_length_ratio
        {
            paragraph_ratio = 1.0;
            line_mode = LineMode::Overridden;
        }

        let issue = (paragraph_ratio < self.config.critical_ratio).then(|| {
            StructureIssue::StructuralLoss {
                ratio: paragraph_ratio,
                threshold: self.config.critical_ratio,
                original_paragraphs,
                transformed_paragraphs,
            }
        });

        debug!(
            "Structure check: {} -> {} paragraphs (initial {} -> {}), ratio {:.3}, line mode {:?} (single {}, double {})",
            original_paragraphs,
            transformed_paragraphs,
            original_initial,
            transformed_initial,
            paragraph_ratio,
            line_mode,
            stats.single_breaks,
            stats.paragraph_breaks
        );

        StructureCheck {
            original_paragraphs,
            transformed_paragraphs,
            original_paragraphs_initial: original_initial,
            transformed_paragraphs_initial: transformed_initial,
            paragraph_ratio,
            line_mode,
            issue,
        }
    }
}
