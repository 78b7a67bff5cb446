//! External collaborator interfaces.
//!
//! The engine core never talks to marketplaces, tariff services or a
//! database directly; it goes through the traits defined here. Each
//! trait ships with a deterministic in-memory implementation used by
//! tests and by the demo wiring:
//!
//! - [`fetcher`]: per-(channel, marketplace) observation fetching.
//! - [`tariff`]: live HS-code duty-rate lookup.
//! - [`store`]: best-effort persistence of deals and assumption
//!   records.

pub mod fetcher;
pub mod store;
pub mod tariff;

pub use fetcher::{ChannelFetcher, MockChannelFetcher};
pub use store::{Deal, DealStore, FailingDealStore, MemoryDealStore};
pub use tariff::{FailingTariffLookup, HttpTariffLookup, StaticTariffLookup, TariffLookup, TariffRate};
