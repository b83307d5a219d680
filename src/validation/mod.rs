/*!
 * Integrity validation for transformed text.
 *
 * This module checks that provider output conserves its source:
 * - Volume (character length ratio)
 * - Paragraph structure, with heuristics for line-oriented sources
 *
 * # Architecture
 *
 * - `length`: Validates length ratios
 * - `structure`: Validates paragraph ratios
 * - `service`: Combines both into a `ValidationReport`
 */

pub mod length;
pub mod service;
pub mod structure;

// Re-export main types
pub use service::{IntegrityValidator, ValidationConfig, ValidationReport, Verdict};
pub use structure::LineMode;
