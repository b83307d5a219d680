/*!
 * Common test utilities for the chapterguard test suite
 */

use anyhow::Result;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use chapterguard::app_config::Config;
use chapterguard::orchestration::ChapterOrchestrator;
use chapterguard::persistence::ChapterStore;
use chapterguard::providers::TransformProvider;

// Re-export the fixture providers module
pub mod mock_providers;

/// Route library logs through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// `count` blank-line separated paragraphs of exactly `chars_each` characters
pub fn uniform_paragraphs(count: usize, chars_each: usize) -> String {
    (0..count)
        .map(|i| {
            let head = format!("P{} ", i);
            format!("{}{}", head, "a".repeat(chars_each.saturating_sub(head.len())))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A prose chapter of `paragraphs` paragraphs with `sentences` sentences each
pub fn prose_chapter(paragraphs: usize, sentences: usize) -> String {
    (0..paragraphs)
        .map(|p| {
            (0..sentences)
                .map(|s| format!("In chapter part {} the narrator adds remark {} to the tale.", p, s))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A line-oriented text: `blocks` blank-line separated blocks of `lines` lines
pub fn line_oriented_text(blocks: usize, lines: usize) -> String {
    (0..blocks)
        .map(|b| {
            (0..lines)
                .map(|l| format!("Line {} of block {} keeps going.", l, b))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Random text mixing paragraphs, line breaks, sentence ends, CJK and odd whitespace
pub fn random_text<R: Rng>(rng: &mut R, pieces: usize) -> String {
    const WORDS: [&str; 12] = [
        "river", "lantern", "échelle", "über", "night", "東京", "雨が降る", "42", "«quoted»", "said", "(aside)", "end",
    ];
    const SEPARATORS: [&str; 10] = [" ", " ", " ", ". ", "! ", "? ", "\n", "\n\n", "\n \n\n", "。"];

    let mut text = String::new();
    for _ in 0..pieces {
        text.push_str(WORDS[rng.random_range(0..WORDS.len())]);
        text.push_str(SEPARATORS[rng.random_range(0..SEPARATORS.len())]);
    }
    text
}

/// Default configuration for an English-to-English run with a chunk limit
pub fn test_config(max_chunk_chars: usize) -> Config {
    Config::default()
        .with_languages("en", "en")
        .with_max_chunk_chars(max_chunk_chars)
}

/// Build an orchestrator over shared provider and store
pub fn orchestrator<P, S>(config: &Config, provider: Arc<P>, store: Arc<S>) -> ChapterOrchestrator<P, S>
where
    P: TransformProvider,
    S: ChapterStore,
{
    ChapterOrchestrator::new(config, provider, store).expect("valid test configuration")
}
