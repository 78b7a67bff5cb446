//! dealscope: multi-channel landed-cost and deal-scoring engine.
//!
//! Given a product, a purchase quantity, and per-marketplace price and
//! demand observations, the engine computes the landed cost into each
//! destination, the marketplace fees per channel, a demand estimate
//! with confidence, a weighted 0-100 deal score, a
//! Buy/Renegotiate/Source-Elsewhere/Pass verdict, an inventory
//! allocation plan, and negotiation guidance. Every figure is
//! annotated with its source and methodology; user overrides are
//! validated, merged last-wins, and audited when they change a
//! previously-stored assumption.
//!
//! Entry point: [`evaluator::MultiChannelEvaluator`].

pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod core;
pub mod currency;
pub mod data;
pub mod demand;
pub mod duty;
pub mod error;
pub mod evaluator;
pub mod fees;
pub mod overrides;
pub mod shipping;

pub use error::{DealscopeError, Result};
pub use evaluator::MultiChannelEvaluator;
