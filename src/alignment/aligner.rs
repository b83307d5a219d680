/*!
 * Sentence-level bilingual alignment.
 *
 * Alignment never searches the whole chapter for matches. It works inside
 * blocks that were transformed together (a chunk and its output, or a
 * paragraph and its counterpart), where sentence order is preserved, and runs
 * a monotonic dynamic program over the two sentence lists with these moves:
 * - 1-1, 1-2 and 2-1 matches, kept only when similarity reaches the floor
 * - skipping a source or target sentence, which counts as a misalignment
 *
 * Pairs can also be proposed by the provider during alignment regeneration;
 * those are located in the texts and scored instead of derived.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::segmentation::paragraphs::split_paragraphs;
use crate::segmentation::{SentenceSplitter, Span};

use super::report::{AlignmentPair, AlignmentReport};
use super::similarity::{Features, SimilarityScorer};

/// Thresholds and weights for alignment scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Minimum similarity for a pair to be retained
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Coverage below which the alignment needs review
    #[serde(default = "default_coverage_floor")]
    pub coverage_floor: f64,

    /// Quality below which the alignment needs review
    #[serde(default = "default_quality_floor")]
    pub quality_floor: f64,

    /// Weight of the coverage term in the quality score
    #[serde(default = "default_coverage_weight")]
    pub coverage_weight: f64,

    /// Weight of the mean confidence in the quality score
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f64,

    /// Weight of the misalignment term in the quality score
    #[serde(default = "default_misalignment_weight")]
    pub misalignment_weight: f64,

    /// Per-misalignment penalty in `1 / (1 + count * penalty)`
    #[serde(default = "default_misalignment_penalty")]
    pub misalignment_penalty: f64,
}

fn default_confidence_floor() -> f64 {
    0.5
}

fn default_coverage_floor() -> f64 {
    0.95
}

fn default_quality_floor() -> f64 {
    0.7
}

fn default_coverage_weight() -> f64 {
    0.5
}

fn default_confidence_weight() -> f64 {
    0.3
}

fn default_misalignment_weight() -> f64 {
    0.2
}

fn default_misalignment_penalty() -> f64 {
    0.1
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            coverage_floor: default_coverage_floor(),
            quality_floor: default_quality_floor(),
            coverage_weight: default_coverage_weight(),
            confidence_weight: default_confidence_weight(),
            misalignment_weight: default_misalignment_weight(),
            misalignment_penalty: default_misalignment_penalty(),
        }
    }
}

/// A pair proposed by the provider during alignment regeneration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedPair {
    /// Source fragment, verbatim
    pub source: String,
    /// Target fragment, verbatim
    pub target: String,
}

/// Parse a provider's JSON array of proposed pairs.
///
/// Surrounding prose and code fences are ignored; only the outermost
/// `[...]` is parsed.
pub fn parse_proposals(raw: &str) -> Result<Vec<ProposedPair>, serde_json::Error> {
    let json = match (raw.find('['), raw.rfind(']')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    };
    serde_json::from_str(json)
}

/// Step taken by the dynamic program to reach a cell
#[derive(Debug, Clone, Copy, PartialEq)]
enum Move {
    Start,
    Match { sources: usize, targets: usize, confidence: f64 },
    SkipSource,
    SkipTarget,
}

/// Match shapes tried at every cell, in order of preference
const MATCH_SHAPES: [(usize, usize); 3] = [(1, 1), (1, 2), (2, 1)];

/// Most sentences one side of a pair may span
const MAX_RUN: usize = 2;

/// Smallest half-width of the diagonal band
const MIN_BAND_HALF_WIDTH: usize = 32;

/// Bilingual sentence aligner
#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignmentConfig,
    source_splitter: SentenceSplitter,
    target_splitter: SentenceSplitter,
}

impl Aligner {
    /// Create an aligner with default thresholds for a language pair
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self::with_config(AlignmentConfig::default(), source_language, target_language)
    }

    /// Create an aligner with custom thresholds for a language pair
    pub fn with_config(config: AlignmentConfig, source_language: &str, target_language: &str) -> Self {
        Self {
            config,
            source_splitter: SentenceSplitter::for_language(source_language),
            target_splitter: SentenceSplitter::for_language(target_language),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align two whole texts.
    ///
    /// Paragraphs are paired one to one when both texts have the same number
    /// of them; otherwise the texts are aligned as a single block.
    pub fn align(&self, source: &str, target: &str) -> AlignmentReport {
        let source_paragraphs = trimmed_paragraphs(source);
        let target_paragraphs = trimmed_paragraphs(target);

        let blocks: Vec<(&str, &str)> =
            if !source_paragraphs.is_empty() && source_paragraphs.len() == target_paragraphs.len() {
                source_paragraphs.into_iter().zip(target_paragraphs).collect()
            } else {
                vec![(source, target)]
            };

        self.align_blocks(&blocks, source, target)
    }

    /// Align chunk outputs with the chunks that produced them.
    ///
    /// Coverage is measured against the concatenation of all chunks on each side.
    pub fn align_chunks<S: AsRef<str>, T: AsRef<str>>(&self, pairs: &[(S, T)]) -> AlignmentReport {
        let source: String = pairs.iter().map(|(s, _)| s.as_ref()).collect();
        let target: String = pairs.iter().map(|(_, t)| t.as_ref()).collect();
        let blocks: Vec<(&str, &str)> = pairs.iter().map(|(s, t)| (s.as_ref(), t.as_ref())).collect();

        self.align_blocks(&blocks, &source, &target)
    }

    /// Score pairs proposed by the provider.
    ///
    /// Each fragment is located in its text at or after the end of the
    /// previous in-order pair. A proposal is rejected and counted as a
    /// misalignment when a fragment does not occur verbatim, spans more
    /// sentences than a local match shape allows, or scores below the floor.
    /// A proposal found only before the previous pair breaks order: it is kept,
    /// so repeated proposals show up as coverage above 1.0, and the report is
    /// flagged for review.
    pub fn align_proposed(&self, source: &str, target: &str, proposals: &[ProposedPair]) -> AlignmentReport {
        let scorer = SimilarityScorer::calibrated(source, target);
        let mut pairs = Vec::with_capacity(proposals.len());
        let mut misalignment_count = 0;
        let mut out_of_order = 0;
        let (mut source_cursor, mut target_cursor) = (0, 0);

        for proposal in proposals {
            let source_fragment = proposal.source.trim();
            let target_fragment = proposal.target.trim();

            let (Some(source_at), Some(target_at)) = (
                locate(source, source_fragment, source_cursor),
                locate(target, target_fragment, target_cursor),
            ) else {
                debug!("Rejected proposed pair not found in texts: {:?}", proposal);
                misalignment_count += 1;
                continue;
            };

            if sentence_count(&self.source_splitter, source_fragment) > MAX_RUN
                || sentence_count(&self.target_splitter, target_fragment) > MAX_RUN
            {
                debug!("Rejected proposed pair spanning too many sentences: {:?}", proposal);
                misalignment_count += 1;
                continue;
            }

            let confidence = scorer.score_text(source_fragment, target_fragment);
            if confidence < self.config.confidence_floor {
                debug!(
                    "Rejected proposed pair with confidence {:.3}: {:?}",
                    confidence, proposal
                );
                misalignment_count += 1;
                continue;
            }

            match (source_at, target_at) {
                (Located::InOrder(source_span), Located::InOrder(target_span)) => {
                    source_cursor = source_span.end;
                    target_cursor = target_span.end;
                }
                _ => {
                    debug!("Proposed pair breaks order: {:?}", proposal);
                    out_of_order += 1;
                }
            }

            pairs.push(AlignmentPair {
                source_fragment: source_fragment.to_string(),
                target_fragment: target_fragment.to_string(),
                confidence,
            });
        }

        let report = AlignmentReport::build(pairs, misalignment_count, source, target, &self.config)
            .with_out_of_order(out_of_order);
        debug!("Proposed alignment: {}", report.summary());
        report
    }

    fn align_blocks(&self, blocks: &[(&str, &str)], source: &str, target: &str) -> AlignmentReport {
        let mut pairs = Vec::new();
        let mut misalignment_count = 0;

        for (source_block, target_block) in blocks {
            let (block_pairs, block_misaligned) = self.align_block(source_block, target_block);
            pairs.extend(block_pairs);
            misalignment_count += block_misaligned;
        }

        let report = AlignmentReport::build(pairs, misalignment_count, source, target, &self.config);
        debug!("Aligned {} blocks: {}", blocks.len(), report.summary());
        report
    }

    /// Align the sentences of one block, returning pairs and the unaligned sentence count
    fn align_block(&self, source: &str, target: &str) -> (Vec<AlignmentPair>, usize) {
        let source_spans = sentence_spans(&self.source_splitter, source);
        let target_spans = sentence_spans(&self.target_splitter, target);
        let (n, m) = (source_spans.len(), target_spans.len());

        if n == 0 || m == 0 {
            return (Vec::new(), n + m);
        }

        let scorer = SimilarityScorer::calibrated(source, target);
        let source_runs = run_features(source, &source_spans);
        let target_runs = run_features(target, &target_spans);

        let band = Band::new(n, m);
        let mut score = vec![f64::NEG_INFINITY; band.len];
        let mut moves = vec![Move::Start; band.len];
        score[0] = 0.0;
        let score_at = |score: &[f64], i: usize, j: usize| band.index(i, j).map_or(f64::NEG_INFINITY, |k| score[k]);

        for i in 0..=n {
            for j in band.columns(i) {
                if i == 0 && j == 0 {
                    continue;
                }
                let mut best = f64::NEG_INFINITY;
                let mut best_move = Move::Start;

                for (sources, targets) in MATCH_SHAPES {
                    if i < sources || j < targets {
                        continue;
                    }
                    let previous = score_at(&score, i - sources, j - targets);
                    if previous == f64::NEG_INFINITY {
                        continue;
                    }
                    let confidence = scorer.score(
                        &source_runs[sources - 1][i - sources],
                        &target_runs[targets - 1][j - targets],
                    );
                    if confidence < self.config.confidence_floor {
                        continue;
                    }
                    if previous + confidence > best {
                        best = previous + confidence;
                        best_move = Move::Match { sources, targets, confidence };
                    }
                }

                if i > 0 && score_at(&score, i - 1, j) > best {
                    best = score_at(&score, i - 1, j);
                    best_move = Move::SkipSource;
                }
                if j > 0 && score_at(&score, i, j - 1) > best {
                    best = score_at(&score, i, j - 1);
                    best_move = Move::SkipTarget;
                }

                if let Some(k) = band.index(i, j) {
                    score[k] = best;
                    moves[k] = best_move;
                }
            }
        }

        let mut pairs = Vec::new();
        let mut misaligned = 0;
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            let Some(k) = band.index(i, j) else { break };
            match moves[k] {
                Move::Match { sources, targets, confidence } => {
                    let source_span = Span::new(source_spans[i - sources].start, source_spans[i - 1].end);
                    let target_span = Span::new(target_spans[j - targets].start, target_spans[j - 1].end);
                    pairs.push(AlignmentPair {
                        source_fragment: source_span.slice(source).trim().to_string(),
                        target_fragment: target_span.slice(target).trim().to_string(),
                        confidence,
                    });
                    i -= sources;
                    j -= targets;
                }
                Move::SkipSource => {
                    misaligned += 1;
                    i -= 1;
                }
                Move::SkipTarget => {
                    misaligned += 1;
                    j -= 1;
                }
                Move::Start => break,
            }
        }
        pairs.reverse();

        (pairs, misaligned)
    }
}

/// Diagonal band of the sentence lattice explored by the dynamic program.
///
/// Rows are stored contiguously, so memory grows with `n * half_width`
/// rather than `n * m` when a whole chapter is aligned as one block.
struct Band {
    /// Per row: first column, last column (inclusive), offset into storage
    rows: Vec<(usize, usize, usize)>,
    len: usize,
}

impl Band {
    fn new(n: usize, m: usize) -> Self {
        // Wide enough that consecutive rows overlap, so (n, m) stays reachable
        let half = MIN_BAND_HALF_WIDTH
            .max(m.div_ceil(n.max(1)) + MAX_RUN)
            .max(n.div_ceil(m.max(1)) + MAX_RUN);

        let mut rows = Vec::with_capacity(n + 1);
        let mut len = 0;
        for i in 0..=n {
            let center = if n == 0 { 0 } else { i * m / n };
            let first = center.saturating_sub(half);
            let last = (center + half).min(m);
            rows.push((first, last, len));
            len += last - first + 1;
        }

        Self { rows, len }
    }

    fn columns(&self, i: usize) -> std::ops::RangeInclusive<usize> {
        let (first, last, _) = self.rows[i];
        first..=last
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        let (first, last, offset) = self.rows[i];
        (first..=last).contains(&j).then(|| offset + j - first)
    }
}

/// Where a proposed fragment was found relative to the previous pair
#[derive(Debug, Clone, Copy, PartialEq)]
enum Located {
    InOrder(Span),
    Behind,
}

/// Find a non-empty fragment at or after `cursor`, falling back to an earlier occurrence
fn locate(text: &str, fragment: &str, cursor: usize) -> Option<Located> {
    if fragment.is_empty() {
        return None;
    }
    let tail = text.get(cursor..)?;
    match tail.find(fragment) {
        Some(offset) => {
            let start = cursor + offset;
            Some(Located::InOrder(Span::new(start, start + fragment.len())))
        }
        None => text.find(fragment).map(|_| Located::Behind),
    }
}

fn sentence_count(splitter: &SentenceSplitter, text: &str) -> usize {
    sentence_spans(splitter, text).len()
}

/// Paragraph texts with surrounding whitespace trimmed
fn trimmed_paragraphs(text: &str) -> Vec<&str> {
    split_paragraphs(text)
        .into_iter()
        .map(|span| span.slice(text).trim())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Spans of the non-blank sentences of a block
fn sentence_spans(splitter: &SentenceSplitter, text: &str) -> Vec<Span> {
    splitter
        .split_spans(text)
        .into_iter()
        .filter(|span| !span.slice(text).trim().is_empty())
        .collect()
}

/// Features of every run of one and of two consecutive sentences, by run length then start
fn run_features(text: &str, spans: &[Span]) -> [Vec<Features>; MAX_RUN] {
    let singles: Vec<Features> = spans.iter().map(|span| Features::of(span.slice(text))).collect();
    let doubles = singles.windows(2).map(|w| w[0].merge(&w[1])).collect();
    [singles, doubles]
}
