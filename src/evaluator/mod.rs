//! Multi-channel evaluation layer.
//!
//! This module assembles the orchestration of the engine. The
//! submodules include:
//!
//! - [`scoring`]: the four 0-100 sub-scores and their weighted
//!   composite.
//! - [`decision`]: the score/margin threshold state machine plus
//!   negotiation and sourcing guidance.
//! - [`allocation`]: the capped greedy inventory allocation planner.
//! - [`engine`]: the [`MultiChannelEvaluator`] that composes the
//!   calculators per channel and produces an [`EvaluationResult`].
//!
//! [`EvaluationResult`]: crate::core::types::EvaluationResult
//! [`MultiChannelEvaluator`]: engine::MultiChannelEvaluator

pub mod allocation;
pub mod decision;
pub mod engine;
pub mod scoring;

pub use engine::MultiChannelEvaluator;
