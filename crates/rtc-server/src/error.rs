//! Command-parse error type.

use thiserror::Error;

/// Why an inbound command string was rejected.  Rejections are logged by the
/// dispatcher and never interrupt the tick loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("missing argument for {0}")]
    MissingArg(&'static str),

    #[error("invalid duration list {0:?}")]
    BadDurations(String),
}

pub type CommandResult<T> = Result<T, CommandError>;
