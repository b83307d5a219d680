/*!
 * Volume validation for transformed text.
 *
 * Compares the character count of a transformed text with its source:
 * - Ratio below the critical threshold: content was lost
 * - Ratio below the warning threshold: suspiciously short, advisory only
 *
 * Over-length output is not flagged here; repeated content is caught by
 * alignment coverage instead.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::segmentation::char_len;

/// Default ratio under which the output is considered truncated
pub const DEFAULT_CRITICAL_LENGTH_RATIO: f64 = 0.6;

/// Default ratio under which the output earns a warning
pub const DEFAULT_WARNING_LENGTH_RATIO: f64 = 0.9;

/// Types of volume issues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LengthIssue {
    /// Transformed text lost a critical share of the source volume
    TooShort {
        ratio: f64,
        threshold: f64,
        source_len: usize,
        transformed_len: usize,
    },
    /// Transformed text is shorter than expected but within tolerance
    ShorterThanExpected {
        ratio: f64,
        threshold: f64,
        source_len: usize,
        transformed_len: usize,
    },
}

impl LengthIssue {
    /// Whether the issue should block acceptance
    pub fn is_critical(&self) -> bool {
        matches!(self, LengthIssue::TooShort { .. })
    }
}

impl std::fmt::Display for LengthIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthIssue::TooShort {
                ratio,
                threshold,
                source_len,
                transformed_len,
            } => {
                write!(
                    f,
                    "transformed text too short: length ratio {:.3} < {:.2} ({} -> {} chars)",
                    ratio, threshold, source_len, transformed_len
                )
            }
            LengthIssue::ShorterThanExpected {
                ratio,
                threshold,
                source_len,
                transformed_len,
            } => {
                write!(
                    f,
                    "transformed text shorter than expected: length ratio {:.3} < {:.2} ({} -> {} chars)",
                    ratio, threshold, source_len, transformed_len
                )
            }
        }
    }
}

/// Result of a volume check
#[derive(Debug, Clone, PartialEq)]
pub struct LengthCheck {
    /// Transformed length divided by source length (0 for an empty source)
    pub ratio: f64,
    /// Source length in characters
    pub source_len: usize,
    /// Transformed length in characters
    pub transformed_len: usize,
    /// Issue found, if any
    pub issue: Option<LengthIssue>,
}

/// Configuration for volume validation
#[derive(Debug, Clone, PartialEq)]
pub struct LengthValidatorConfig {
    /// Ratio below which the output is critical
    pub critical_ratio: f64,
    /// Ratio below which the output is warned
    pub warning_ratio: f64,
}

impl Default for LengthValidatorConfig {
    fn default() -> Self {
        Self {
            critical_ratio: DEFAULT_CRITICAL_LENGTH_RATIO,
            warning_ratio: DEFAULT_WARNING_LENGTH_RATIO,
        }
    }
}

/// Volume validator
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    config: LengthValidatorConfig,
}

impl LengthValidator {
    /// Create a new validator with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new validator with custom thresholds
    pub fn with_config(config: LengthValidatorConfig) -> Self {
        Self { config }
    }

    /// Calculate the character-length ratio of transformed to source text
    pub fn calculate_ratio(source: &str, transformed: &str) -> f64 {
        let source_len = char_len(source);
        if source_len == 0 {
            return 0.0;
        }
        char_len(transformed) as f64 / source_len as f64
    }

    /// Check the volume of a transformed text against its source
    pub fn check(&self, source: &str, transformed: &str) -> LengthCheck {
        let source_len = char_len(source);
        let transformed_len = char_len(transformed);
        let ratio = Self::calculate_ratio(source, transformed);

        let issue = if ratio < self.config.critical_ratio {
            Some(LengthIssue::TooShort {
                ratio,
                threshold: self.config.critical_ratio,
                source_len,
                transformed_len,
            })
        } else if ratio < self.config.warning_ratio {
            Some(LengthIssue::ShorterThanExpected {
                ratio,
                threshold: self.config.warning_ratio,
                source_len,
                transformed_len,
            })
        } else {
            None
        };

        debug!(
            "Length check: {} -> {} chars, ratio {:.3}",
            source_len, transformed_len, ratio
        );

        LengthCheck {
            ratio,
            source_len,
            transformed_len,
            issue,
        }
    }
}
