/*!
 * Bilingual sentence alignment with coverage and quality scoring.
 *
 * - `similarity`: Language-neutral similarity of sentence pairs
 * - `aligner`: Block-wise monotonic alignment and provider-proposed pairs
 * - `report`: Pairs, coverage, quality score and the review flag
 *
 * Coverage counts non-whitespace characters, so it is not skewed by the
 * spacing conventions of either language.
 */

pub mod aligner;
pub mod report;
pub mod similarity;

// Re-export main types
pub use aligner::{Aligner, AlignmentConfig, ProposedPair, parse_proposals};
pub use report::{AlignmentPair, AlignmentReport};
