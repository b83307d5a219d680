/*!
 * Error types for the chapterguard library.
 *
 * This module contains custom error types for the different parts of the
 * text-integrity pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling a transformation provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The call did not complete in time
    #[error("Provider call timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors raised while segmenting source text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// The requested chunk size cannot hold any text
    #[error("Invalid chunk size: {0} (must be greater than zero)")]
    InvalidChunkSize(usize),
}

/// Errors raised by chapter stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// Requested chapter or result does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),

    /// A stored report could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Database(error.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(error: anyhow::Error) -> Self {
        Self::Database(format!("{:#}", error))
    }
}

/// Errors raised by the retry orchestration layer
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// The chapter has no source text to work on
    #[error("Chapter {0} has an empty source text")]
    EmptySource(String),

    /// Alignment was requested before a translation was accepted
    #[error("Chapter {0} has no accepted translation to align")]
    MissingTranslation(String),

    /// An attempt handle no longer matches the active claim
    #[error("Stale attempt handle {attempt_id} for chapter {chapter_id} ({stage})")]
    StaleHandle {
        /// Chapter the handle was issued for
        chapter_id: String,
        /// Stage name
        stage: String,
        /// The handle's attempt id
        attempt_id: String,
    },

    /// No retry state exists for the handle
    #[error("No active attempt for chapter {chapter_id} ({stage})")]
    UnknownAttempt {
        /// Chapter id
        chapter_id: String,
        /// Stage name
        stage: String,
    },

    /// The segmenter rejected its parameters
    #[error("Segmentation error: {0}")]
    Segment(#[from] SegmentError),

    /// Persistence collaborator failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration cannot drive an orchestration run
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Main library error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from segmentation
    #[error("Segmentation error: {0}")]
    Segment(#[from] SegmentError),

    /// Error from a chapter store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from orchestration
    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
