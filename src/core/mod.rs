//! Core data types and numeric helpers shared by every layer of the
//! engine.

pub mod math;
pub mod types;
