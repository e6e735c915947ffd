//! Itinerary and route-store error type.

use thiserror::Error;

/// Errors produced while loading itineraries or persisting route records.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
