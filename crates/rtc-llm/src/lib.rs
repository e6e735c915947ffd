//! `rtc-llm` — the chain-advisor collaborator.
//!
//! The simulation asks an advisor to rework an agent's activity chain in
//! response to a closure or event.  This crate holds the advisor trait, the
//! prompt builder, the OpenAI-backed implementation, the reply validator,
//! and a bounded worker pool for fanning requests out per affected agent.

pub mod advisor;
pub mod error;
pub mod openai;
pub mod parse;
pub mod pool;
pub mod prompt;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use advisor::{AdviceRequest, ChainAdvisor, NoopAdvisor, TimedStop};
pub use error::{LlmError, LlmResult};
pub use openai::OpenAiAdvisor;
pub use parse::parse_reply;
pub use pool::{AdviceOutcome, advise_many};
