/*!
 * Tests for chunking and source text structure
 */

use rand::SeedableRng;
use rand::rngs::StdRng;

use chapterguard::errors::SegmentError;
use chapterguard::segmentation::{SourceText, Segmenter, char_len, reassemble};

use crate::common::{prose_chapter, random_text};

#[test]
fn test_segment_withRandomTexts_shouldBeLossless() {
    let mut rng = StdRng::seed_from_u64(7);
    let segmenter = Segmenter::for_language("en");

    for round in 0..200 {
        let text = random_text(&mut rng, 5 + round);
        for max_chunk_chars in [1, 7, 40, 250] {
            let chunks = segmenter.segment(&text, max_chunk_chars).unwrap();
            let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();

            assert_eq!(rebuilt, text, "round {} limit {}", round, max_chunk_chars);
        }
    }
}

#[test]
fn test_segment_withRandomTexts_shouldBoundOrFlagChunks() {
    let mut rng = StdRng::seed_from_u64(11);
    let segmenter = Segmenter::for_language("ja");

    for _ in 0..100 {
        let text = random_text(&mut rng, 60);
        let chunks = segmenter.segment(&text, 30).unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.char_len, char_len(&chunk.text));
            assert!(chunk.char_len <= 30 || chunk.oversized, "chunk {:?}", chunk);
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

#[test]
fn test_segment_withParagraphs_shouldCutOnlyAtParagraphBoundaries() {
    let text = prose_chapter(6, 3);
    let segmenter = Segmenter::for_language("en");

    let chunks = segmenter.segment(&text, 400).unwrap();

    assert!(chunks.len() > 1);
    for chunk in &chunks[..chunks.len() - 1] {
        assert!(chunk.text.ends_with("\n\n"), "chunk ends mid-paragraph: {:?}", chunk.text);
    }
    assert_eq!(reassemble(&chunks), text);
}

#[test]
fn test_segment_withLongSentence_shouldEmitOversizedChunk() {
    let long_sentence = format!("{}.", "word ".repeat(40).trim_end());
    let text = format!("Short one. {} Short two.", long_sentence);
    let segmenter = Segmenter::for_language("en");

    let chunks = segmenter.segment(&text, 50).unwrap();

    let oversized: Vec<_> = chunks.iter().filter(|c| c.oversized).collect();
    assert_eq!(oversized.len(), 1);
    assert!(oversized[0].text.contains(&long_sentence));
    assert_eq!(reassemble(&chunks), text);
}

#[test]
fn test_segment_withZeroLimit_shouldFail() {
    let segmenter = Segmenter::default();
    assert_eq!(
        segmenter.segment("Text.", 0),
        Err(SegmentError::InvalidChunkSize(0))
    );
}

#[test]
fn test_segment_withEmptyText_shouldReturnNoChunks() {
    let segmenter = Segmenter::default();
    assert!(segmenter.segment("", 100).unwrap().is_empty());
}

#[test]
fn test_reassemble_withShuffledChunks_shouldRestoreSourceOrder() {
    let text = prose_chapter(4, 2);
    let mut chunks = Segmenter::default().segment(&text, 150).unwrap();
    chunks.reverse();

    assert_eq!(reassemble(&chunks), text);
}

#[test]
fn test_sourceText_shouldExposeParagraphsAndSentences() {
    let source = SourceText::new("One. Two!\n\nThree?\nFour.", "en");

    assert_eq!(source.paragraphs(), vec!["One. Two!", "Three?\nFour."]);
    assert_eq!(source.sentences(), vec!["One.", "Two!", "Three?", "Four."]);
    assert_eq!(source.char_len(), 23);
    assert!(!source.is_blank());
}

#[test]
fn test_sourceText_withCjk_shouldSplitOnFullWidthTerminators() {
    let source = SourceText::new("雨が降る。風が吹く！", "ja");

    assert_eq!(source.sentences(), vec!["雨が降る。", "風が吹く！"]);
}
