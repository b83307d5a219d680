/*!
 * # chapterguard - text-integrity pipeline for chapter translation
 *
 * A Rust library that sends long chapters through an LLM transformation
 * provider without silently losing, duplicating or reordering content.
 *
 * ## Features
 *
 * - Lossless, boundary-respecting segmentation into provider-sized chunks
 * - Volume and paragraph-structure validation of provider output, including
 *   sources that put one line per paragraph
 * - Sentence-level bilingual alignment with coverage and quality scoring
 * - Bounded retries with adjusted parameters, then escalation to manual review
 * - Cooperative cancellation between provider calls
 * - SQLite persistence of sources and accepted results
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `segmentation`: Source text structure and chunking
 * - `validation`: Integrity validation of transformed text
 * - `alignment`: Bilingual sentence alignment
 * - `providers`: The transformation provider interface and a mock provider
 * - `orchestration`: Retry state machine, orchestrator and worker pool
 * - `persistence`: Chapter stores (in-memory and SQLite)
 * - `language_utils`: ISO language code utilities
 * - `logging`: Logger for the `log` facade
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod errors;
pub mod language_utils;
pub mod logging;
pub mod orchestration;
pub mod persistence;
pub mod providers;
pub mod segmentation;
pub mod validation;

// Re-export main types for easier usage
pub use alignment::{Aligner, AlignmentReport};
pub use app_config::Config;
pub use errors::{AppError, OrchestrationError, ProviderError, SegmentError, StoreError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use orchestration::{CancellationFlag, ChapterOrchestrator, RetryStore, Stage, WorkerPool};
pub use persistence::{ChapterStore, MemoryChapterStore, SqliteChapterStore};
pub use providers::{TransformProvider, TransformRequest, TransformResponse};
pub use segmentation::{Chunk, Segmenter, SourceText};
pub use validation::{IntegrityValidator, ValidationReport};
