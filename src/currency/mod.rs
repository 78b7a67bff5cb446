//! Currency conversion.
//!
//! Submodules:
//!
//! - [`rates`]: the [`RateSource`] collaborator trait, an HTTP
//!   implementation, a deterministic static source for tests, and the
//!   hardcoded fallback table.
//! - [`converter`]: the TTL-cached [`CurrencyConverter`] with
//!   atomic-swap refresh semantics.

pub mod converter;
pub mod rates;

pub use converter::{CacheStatus, CurrencyConverter};
pub use rates::{FailingRateSource, HttpRateSource, RateSource, StaticRateSource};
