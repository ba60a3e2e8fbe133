/*!
 * Error types for the newsdigest application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentState;

/// Errors that can occur when calling an external model or service
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

    /// The service answered but produced nothing
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// The embedding model answered with the wrong number of vectors
    #[error("Expected {expected} embeddings, got {actual}")]
    EmbeddingCountMismatch {
        /// Number of texts sent
        expected: usize,
        /// Number of vectors received
        actual: usize,
    },

    /// The embedding model answered with a vector that cannot be compared
    #[error("Invalid embedding at position {index}: {reason}")]
    InvalidEmbedding {
        /// Position of the vector in the batch
        index: usize,
        /// What is wrong with it
        reason: String,
    },
}

/// Typed reason a pipeline stage produced no usable value for a document.
///
/// The orchestrator stores these next to the empty-string sentinel so that
/// degraded records stay inspectable after the run.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StageFailure {
    /// Input was absent, empty or whitespace-only
    #[error("input text is absent or blank")]
    UnusableInput,

    /// Every chunk exhausted its attempts
    #[error("all {chunks} chunk(s) failed to translate")]
    AllChunksFailed {
        /// Number of chunks that were attempted
        chunks: usize,
    },

    /// The external model failed
    #[error("provider failure: {0}")]
    Provider(String),

    /// The external model answered with nothing usable
    #[error("model returned an empty result")]
    EmptyOutput,

    /// A stage result was recorded against a document in the wrong state
    #[error("cannot record {stage} on a document in state {state:?}")]
    OutOfOrder {
        /// Stage that tried to record
        stage: &'static str,
        /// State the document was in
        state: DocumentState,
    },
}

impl From<ProviderError> for StageFailure {
    fn from(error: ProviderError) -> Self {
        Self::Provider(error.to_string())
    }
}

/// Application-level errors raised before a batch enters the pipeline
#[derive(Error, Debug)]
pub enum AppError {
    /// The ingestion contract was violated (e.g. duplicate links)
    #[error("Ingestion error: {0}")]
    Ingestion(String),
}
