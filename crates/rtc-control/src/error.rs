//! Control-layer error type.

use thiserror::Error;

use rtc_core::AgentId;
use rtc_engine::EngineError;
use rtc_plan::PlanError;

/// Errors produced by the closure, event, and route managers.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A destination name that is in neither the POI catalog nor the agent's
    /// current chain.  Aborts the whole modification request.
    #[error("unknown POI: {0:?}")]
    UnknownPoi(String),

    #[error("destination list resolved to no stops")]
    EmptyChain,

    #[error("invalid event payload: {0}")]
    BadEvent(String),

    #[error("could not assemble a drivable route for {0}")]
    RouteAssembly(AgentId),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

pub type ControlResult<T> = Result<T, ControlError>;
