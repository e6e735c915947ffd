//! Chain-advisor error type.

use thiserror::Error;

/// Errors from the advisor call path.  None of these propagate past the
/// dispatch layer; every failure falls back to the agent's original chain.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key available")]
    MissingKey,

    #[error("client build failed: {0}")]
    BuildClient(String),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("unexpected status {code}: {message}")]
    HttpStatus { code: u16, message: String },

    #[error("could not decode completion response: {0}")]
    Decode(String),

    #[error("completion had no choices")]
    EmptyChoice,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;
