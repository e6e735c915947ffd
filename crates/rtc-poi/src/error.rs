//! POI-catalog error type.

use thiserror::Error;

/// Errors produced while loading the POI catalog.
#[derive(Debug, Error)]
pub enum PoiError {
    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PoiResult<T> = Result<T, PoiError>;
