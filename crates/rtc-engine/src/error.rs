//! Engine-subsystem error type.

use thiserror::Error;

use rtc_core::{AgentId, EdgeId};

/// Errors produced by a [`TrafficEngine`][crate::TrafficEngine] binding.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vehicle {0} not in simulation")]
    UnknownVehicle(AgentId),

    #[error("edge {0} not in network")]
    UnknownEdge(EdgeId),

    #[error("no route from {from} to {to}")]
    NoRoute { from: EdgeId, to: EdgeId },

    #[error("lane {lane} out of range on edge {edge}")]
    BadLane { edge: EdgeId, lane: usize },

    #[error("engine RPC failed: {0}")]
    Rpc(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
