//! Driver error type.
//!
//! Only setup failures and engine-step failures surface here; everything
//! else in the tick loop (per-vehicle queries, viewer I/O, advisor calls)
//! is handled where it happens and never reaches the caller.

use thiserror::Error;

use rtc_engine::EngineError;
use rtc_plan::PlanError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DriverResult<T> = Result<T, DriverError>;
