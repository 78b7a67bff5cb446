//! Live HS-code tariff lookup.
//!
//! The duty calculator consults a [`TariffLookup`] when an HS code is
//! available and falls back to its category table on any failure:
//! network error, invalid code, non-2xx response. Failures here never
//! propagate past the duty calculator.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// A resolved duty rate and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffRate {
    /// Duty rate as a fraction.
    pub rate: f64,
    /// Provider-reported source, e.g. "wits" or "static".
    pub source: String,
}

/// Collaborator resolving an HS code to a duty rate for a route.
#[async_trait]
pub trait TariffLookup: Send + Sync {
    fn id(&self) -> &str;

    async fn lookup_duty_rate(
        &self,
        hs_code: &str,
        origin: &str,
        destination: &str,
    ) -> Result<TariffRate>;
}

#[derive(Debug, Deserialize)]
struct TariffResponse {
    rate: f64,
    source: Option<String>,
}

/// HTTP tariff service client
/// (`GET {base_url}/duty?hs={code}&from={origin}&to={destination}`).
pub struct HttpTariffLookup {
    base_url: Url,
    client: Client,
}

impl HttpTariffLookup {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid tariff service URL")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl TariffLookup for HttpTariffLookup {
    fn id(&self) -> &str {
        "http_tariff"
    }

    async fn lookup_duty_rate(
        &self,
        hs_code: &str,
        origin: &str,
        destination: &str,
    ) -> Result<TariffRate> {
        let mut url = self.base_url.join("duty")?;
        url.query_pairs_mut()
            .append_pair("hs", hs_code)
            .append_pair("from", origin)
            .append_pair("to", destination);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("tariff lookup failed")?
            .error_for_status()
            .context("tariff service returned an error status")?;
        let body: TariffResponse = resp.json().await.context("malformed tariff response")?;
        if !(0.0..=1.0).contains(&body.rate) {
            anyhow::bail!("tariff service returned out-of-range rate {}", body.rate);
        }
        Ok(TariffRate {
            rate: body.rate,
            source: body.source.unwrap_or_else(|| "http".to_string()),
        })
    }
}

/// Deterministic lookup keyed by `(hs_code, destination)` with an
/// `hs_code`-only fallback. Used in tests and the demo wiring.
pub struct StaticTariffLookup {
    rates: HashMap<String, f64>,
}

impl StaticTariffLookup {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl TariffLookup for StaticTariffLookup {
    fn id(&self) -> &str {
        "static_tariff"
    }

    async fn lookup_duty_rate(
        &self,
        hs_code: &str,
        _origin: &str,
        destination: &str,
    ) -> Result<TariffRate> {
        let keyed = format!("{}:{}", hs_code, destination.to_uppercase());
        let rate = self
            .rates
            .get(&keyed)
            .or_else(|| self.rates.get(hs_code))
            .copied()
            .with_context(|| format!("no tariff entry for HS code {}", hs_code))?;
        Ok(TariffRate {
            rate,
            source: "static".to_string(),
        })
    }
}

/// Lookup that always fails. Used to test the fallback path.
pub struct FailingTariffLookup;

#[async_trait]
impl TariffLookup for FailingTariffLookup {
    fn id(&self) -> &str {
        "failing_tariff"
    }

    async fn lookup_duty_rate(
        &self,
        _hs_code: &str,
        _origin: &str,
        _destination: &str,
    ) -> Result<TariffRate> {
        anyhow::bail!("tariff service unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_lookup_prefers_destination_keyed_entries() {
        let mut rates = HashMap::new();
        rates.insert("850760".to_string(), 0.027);
        rates.insert("850760:US".to_string(), 0.034);
        let lookup = StaticTariffLookup::new(rates);
        let us = lookup.lookup_duty_rate("850760", "CN", "US").await.unwrap();
        assert_eq!(us.rate, 0.034);
        let de = lookup.lookup_duty_rate("850760", "CN", "DE").await.unwrap();
        assert_eq!(de.rate, 0.027);
    }

    #[tokio::test]
    async fn unknown_code_is_an_error() {
        let lookup = StaticTariffLookup::new(HashMap::new());
        assert!(lookup.lookup_duty_rate("999999", "CN", "US").await.is_err());
    }
}
