//! Marketplace observation fetching.
//!
//! One call per (channel, marketplace) pair. Any failure or not-found
//! is reported as `Ok(None)` consumption-side: the engine treats a
//! missing channel as "no data" and proceeds with whatever channels
//! did return observations.

use crate::core::types::{ChannelKind, ChannelObservation};
use anyhow::Result;
use async_trait::async_trait;

/// Collaborator that discovers live channel observations.
#[async_trait]
pub trait ChannelFetcher: Send + Sync {
    /// Stable identifier, used in logs.
    fn id(&self) -> &str;

    /// Fetch the observation for a product on one channel and
    /// marketplace. `Ok(None)` means the channel has no usable data.
    async fn fetch_channel_observation(
        &self,
        ean: &str,
        channel: ChannelKind,
        marketplace: &str,
    ) -> Result<Option<ChannelObservation>>;
}

/// Deterministic fetcher serving a fixed observation list. Used in
/// tests and the demo wiring.
pub struct MockChannelFetcher {
    observations: Vec<ChannelObservation>,
}

impl MockChannelFetcher {
    pub fn new(observations: Vec<ChannelObservation>) -> Self {
        Self { observations }
    }

    pub fn empty() -> Self {
        Self {
            observations: Vec::new(),
        }
    }
}

#[async_trait]
impl ChannelFetcher for MockChannelFetcher {
    fn id(&self) -> &str {
        "mock_fetcher"
    }

    async fn fetch_channel_observation(
        &self,
        _ean: &str,
        channel: ChannelKind,
        marketplace: &str,
    ) -> Result<Option<ChannelObservation>> {
        Ok(self
            .observations
            .iter()
            .find(|o| o.channel == channel && o.marketplace.eq_ignore_ascii_case(marketplace))
            .cloned())
    }
}
