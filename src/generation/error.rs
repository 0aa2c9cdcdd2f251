//! Failure types for generation and for each collaborator it drives.
//!
//! Collaborator errors stay narrow; `GenerationError` is the taxonomy callers
//! see. Client errors (fix the input) and upstream errors (retry later) are
//! kept apart so the HTTP layer can map them to different remedies.

use thiserror::Error;

use crate::models::ValidationError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    ContextNotFound(String),

    #[error("Clinical context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Script synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Render submission rejected: {0}")]
    RenderSubmissionFailure(String),

    #[error("Render job {job_id} still running after {elapsed_secs}s")]
    RenderTimeout { job_id: String, elapsed_secs: u64 },

    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenerationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::InvalidInput(_) => "INVALID_INPUT",
            GenerationError::ContextNotFound(_) => "CONTEXT_NOT_FOUND",
            GenerationError::ContextUnavailable(_) => "CONTEXT_UNAVAILABLE",
            GenerationError::SynthesisFailure(_) => "SYNTHESIS_FAILURE",
            GenerationError::RenderSubmissionFailure(_) => "RENDER_SUBMISSION_FAILURE",
            GenerationError::RenderTimeout { .. } => "RENDER_TIMEOUT",
            GenerationError::RenderFailure(_) => "RENDER_FAILURE",
            GenerationError::StorageFailure(_) => "STORAGE_FAILURE",
            GenerationError::Internal(_) => "INTERNAL",
        }
    }

    /// The caller has to change the request; retrying as-is cannot help.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GenerationError::InvalidInput(_) | GenerationError::ContextNotFound(_)
        )
    }

    /// A later identical request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::ContextUnavailable(_)
                | GenerationError::SynthesisFailure(_)
                | GenerationError::RenderTimeout { .. }
                | GenerationError::StorageFailure(_)
                | GenerationError::Internal(_)
        )
    }
}

impl From<ValidationError> for GenerationError {
    fn from(err: ValidationError) -> Self {
        GenerationError::InvalidInput(err.0)
    }
}

// ═══════════════════════════════════════════════════════════
// Collaborator errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Context source unavailable: {0}")]
    Unavailable(String),
}

impl From<ContextError> for GenerationError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::NotFound { entity, id } => {
                GenerationError::ContextNotFound(format!("{entity} {id} not found"))
            }
            ContextError::Unavailable(detail) => GenerationError::ContextUnavailable(detail),
        }
    }
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Script model is not reachable at {0}")]
    Connection(String),

    #[error("Script model returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Script model returned empty narration")]
    EmptyScript,
}

impl From<SynthesisError> for GenerationError {
    fn from(err: SynthesisError) -> Self {
        GenerationError::SynthesisFailure(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum RenderProviderError {
    #[error("Render provider is not reachable at {0}")]
    Connection(String),

    #[error("Render provider request timed out: {0}")]
    Timeout(String),

    #[error("Render provider returned error (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed render provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt artifact record: {0}")]
    InvalidRecord(String),
}

impl From<StorageError> for GenerationError {
    fn from(err: StorageError) -> Self {
        GenerationError::StorageFailure(err.to_string())
    }
}
