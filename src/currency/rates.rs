//! Exchange-rate sources.
//!
//! A [`RateSource`] fetches the latest USD-based rate table from an
//! external service. Implementations may fail; the converter treats
//! any failure as a degradation and keeps serving the last good cache
//! or the hardcoded fallback below.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

lazy_static! {
    /// Hardcoded USD-based fallback rates, used when no live fetch has
    /// ever succeeded. Approximate by design; provenance is annotated
    /// in the audit output whenever they are served.
    pub static ref FALLBACK_RATES: HashMap<String, f64> = {
        let mut m = HashMap::new();
        m.insert("USD".to_string(), 1.0);
        m.insert("EUR".to_string(), 0.92);
        m.insert("GBP".to_string(), 0.79);
        m.insert("JPY".to_string(), 148.0);
        m.insert("CNY".to_string(), 7.20);
        m.insert("CAD".to_string(), 1.36);
        m.insert("AUD".to_string(), 1.52);
        m.insert("MXN".to_string(), 17.10);
        m.insert("PLN".to_string(), 3.95);
        m.insert("SEK".to_string(), 10.40);
        m.insert("CHF".to_string(), 0.88);
        m.insert("INR".to_string(), 83.30);
        m
    };
}

/// Collaborator that returns the latest rate table for a base
/// currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Stable identifier, used in logs and audit annotations.
    fn id(&self) -> &str;
    /// Fetch `code -> rate` quoted against `base`.
    async fn fetch_latest_rates(&self, base: &str) -> Result<HashMap<String, f64>>;
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// HTTP rate source for exchangerate-style JSON APIs
/// (`GET {base_url}/latest?base=USD` returning `{ "rates": {...} }`).
pub struct HttpRateSource {
    base_url: Url,
    client: Client,
}

impl HttpRateSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid rate source URL")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn id(&self) -> &str {
        "http_rates"
    }

    async fn fetch_latest_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let mut url = self.base_url.join("latest")?;
        url.query_pairs_mut().append_pair("base", base);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("rate fetch failed")?
            .error_for_status()
            .context("rate source returned an error status")?;
        let body: RatesResponse = resp.json().await.context("malformed rate response")?;
        if body.rates.is_empty() {
            anyhow::bail!("rate source returned an empty table");
        }
        Ok(body.rates)
    }
}

/// Deterministic source serving a fixed table. Used in tests and as a
/// stand-in when no live endpoint is configured.
pub struct StaticRateSource {
    rates: HashMap<String, f64>,
}

impl StaticRateSource {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    /// A static source pre-loaded with the fallback table.
    pub fn fallback() -> Self {
        Self {
            rates: FALLBACK_RATES.clone(),
        }
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    fn id(&self) -> &str {
        "static_rates"
    }

    async fn fetch_latest_rates(&self, _base: &str) -> Result<HashMap<String, f64>> {
        Ok(self.rates.clone())
    }
}

/// Source that always fails. Used to test degradation paths.
pub struct FailingRateSource;

#[async_trait]
impl RateSource for FailingRateSource {
    fn id(&self) -> &str {
        "failing_rates"
    }

    async fn fetch_latest_rates(&self, _base: &str) -> Result<HashMap<String, f64>> {
        anyhow::bail!("rate source unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_table_covers_majors() {
        for code in ["USD", "EUR", "GBP", "JPY", "CNY"] {
            assert!(FALLBACK_RATES.contains_key(code), "missing {}", code);
        }
        assert_eq!(FALLBACK_RATES["USD"], 1.0);
    }

    #[tokio::test]
    async fn static_source_serves_its_table() {
        let src = StaticRateSource::fallback();
        let rates = src.fetch_latest_rates("USD").await.unwrap();
        assert_eq!(rates["EUR"], 0.92);
    }

    #[tokio::test]
    async fn failing_source_errors() {
        assert!(FailingRateSource.fetch_latest_rates("USD").await.is_err());
    }
}
