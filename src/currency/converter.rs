//! TTL-cached currency conversion.
//!
//! One process-wide rate table, base currency fixed at USD. The table
//! is held behind an `Arc` that is swapped atomically on refresh, so
//! concurrent readers always see a complete table: pre-refresh during
//! a refresh, never half-written. A stale read schedules a
//! fire-and-forget background refresh guarded by a single in-flight
//! flag; a failed refresh degrades confidence (annotated in the audit
//! output) but never blocks or fails a conversion.

use super::rates::{RateSource, FALLBACK_RATES};
use crate::core::math::round2;
use crate::core::types::now_ms;
use crate::error::{DealscopeError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Base currency every rate is quoted against.
pub const BASE_CURRENCY: &str = "USD";

/// An immutable snapshot of the rate table.
#[derive(Debug, Clone)]
struct RateTable {
    rates: HashMap<String, f64>,
    fetched_at_ms: u64,
    /// False while serving the hardcoded fallback.
    live: bool,
}

impl RateTable {
    fn fallback() -> Self {
        Self {
            rates: FALLBACK_RATES.clone(),
            fetched_at_ms: now_ms(),
            live: false,
        }
    }
}

/// Cache-staleness metadata, queryable for audit purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    /// True once at least one live fetch has succeeded.
    pub has_cache: bool,
    pub is_expired: bool,
    /// Age of the current table in milliseconds.
    pub age_ms: u64,
}

struct Inner {
    source: Arc<dyn RateSource>,
    table: RwLock<Arc<RateTable>>,
    ttl: Duration,
    refresh_inflight: AtomicBool,
}

/// Converts amounts between ISO currency codes.
#[derive(Clone)]
pub struct CurrencyConverter {
    inner: Arc<Inner>,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                table: RwLock::new(Arc::new(RateTable::fallback())),
                ttl,
                refresh_inflight: AtomicBool::new(false),
            }),
        }
    }

    fn snapshot(&self) -> Arc<RateTable> {
        self.inner
            .table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn swap(&self, table: RateTable) {
        let mut guard = self.inner.table.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(table);
    }

    /// Convert `amount` from one ISO code to another, rounded to two
    /// decimals. Identity when the codes match. A stale cache still
    /// serves the conversion and schedules a background refresh.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        if from == to {
            return Ok(amount);
        }
        let table = self.snapshot();
        if self.is_expired(&table) {
            self.schedule_refresh();
        }
        let from_rate = *table
            .rates
            .get(&from)
            .ok_or_else(|| DealscopeError::UnknownCurrency(from.clone()))?;
        let to_rate = *table
            .rates
            .get(&to)
            .ok_or_else(|| DealscopeError::UnknownCurrency(to.clone()))?;
        if from_rate <= 0.0 {
            return Err(DealscopeError::UnknownCurrency(from));
        }
        let amount_usd = amount / from_rate;
        Ok(round2(amount_usd * to_rate))
    }

    fn is_expired(&self, table: &RateTable) -> bool {
        now_ms().saturating_sub(table.fetched_at_ms) > self.inner.ttl.as_millis() as u64
    }

    /// Cache-staleness metadata for the audit layer.
    pub fn status(&self) -> CacheStatus {
        let table = self.snapshot();
        CacheStatus {
            has_cache: table.live,
            is_expired: self.is_expired(&table),
            age_ms: now_ms().saturating_sub(table.fetched_at_ms),
        }
    }

    /// Refresh the table from the source, awaited. On success the
    /// snapshot is swapped atomically; on failure the previous table
    /// keeps serving and the error is logged, not surfaced.
    pub async fn refresh(&self) {
        match self.inner.source.fetch_latest_rates(BASE_CURRENCY).await {
            Ok(mut rates) => {
                rates.insert(BASE_CURRENCY.to_string(), 1.0);
                let count = rates.len();
                self.swap(RateTable {
                    rates,
                    fetched_at_ms: now_ms(),
                    live: true,
                });
                debug!(source = self.inner.source.id(), count, "FX rate table refreshed");
            }
            Err(e) => {
                warn!(
                    source = self.inner.source.id(),
                    error = %e,
                    "FX refresh failed, keeping previous table"
                );
            }
        }
        self.inner.refresh_inflight.store(false, Ordering::Release);
    }

    /// Fire-and-forget background refresh. At most one refresh is in
    /// flight per converter; outside a tokio runtime the refresh is
    /// skipped and the current table keeps serving.
    fn schedule_refresh(&self) {
        if self
            .inner
            .refresh_inflight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let this = self.clone();
                handle.spawn(async move {
                    this.refresh().await;
                });
            }
            Err(_) => {
                self.inner.refresh_inflight.store(false, Ordering::Release);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::approx_eq;
    use crate::currency::rates::{FailingRateSource, StaticRateSource};

    fn converter() -> CurrencyConverter {
        CurrencyConverter::new(
            Arc::new(StaticRateSource::fallback()),
            Duration::from_secs(3_600),
        )
    }

    #[test]
    fn identity_conversion_is_unchanged() {
        let c = converter();
        assert_eq!(c.convert(123.456, "USD", "usd").unwrap(), 123.456);
    }

    #[test]
    fn converts_through_usd_base() {
        let c = converter();
        // 100 EUR -> USD at 0.92: 108.70
        let usd = c.convert(100.0, "EUR", "USD").unwrap();
        assert!(approx_eq(usd, 108.70, 0.01));
        // EUR -> GBP: 100 / 0.92 * 0.79
        let gbp = c.convert(100.0, "EUR", "GBP").unwrap();
        assert!(approx_eq(gbp, 85.87, 0.01));
    }

    #[test]
    fn round_trip_within_rounding_tolerance() {
        let c = converter();
        let there = c.convert(250.0, "USD", "JPY").unwrap();
        let back = c.convert(there, "JPY", "USD").unwrap();
        assert!(approx_eq(back, 250.0, 0.05));
    }

    #[test]
    fn unknown_code_is_an_error() {
        let c = converter();
        assert!(matches!(
            c.convert(10.0, "USD", "XXX"),
            Err(DealscopeError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn fallback_table_reports_no_cache() {
        let c = converter();
        let status = c.status();
        assert!(!status.has_cache);
        assert!(!status.is_expired);
    }

    #[tokio::test]
    async fn refresh_swaps_to_live_table() {
        let mut rates = HashMap::new();
        rates.insert("EUR".to_string(), 0.5);
        let c = CurrencyConverter::new(
            Arc::new(StaticRateSource::new(rates)),
            Duration::from_secs(3_600),
        );
        c.refresh().await;
        assert!(c.status().has_cache);
        assert_eq!(c.convert(10.0, "USD", "EUR").unwrap(), 5.0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_table() {
        let c = CurrencyConverter::new(Arc::new(FailingRateSource), Duration::from_secs(3_600));
        c.refresh().await;
        assert!(!c.status().has_cache);
        // Conversion still works off the fallback.
        assert!(c.convert(100.0, "EUR", "USD").is_ok());
    }

    #[test]
    fn expired_read_outside_runtime_still_serves() {
        let c = CurrencyConverter::new(Arc::new(FailingRateSource), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(c.status().is_expired);
        // No tokio runtime here: refresh is skipped, conversion served.
        assert!(c.convert(100.0, "EUR", "USD").is_ok());
        // Guard was released, so a later scheduling attempt is possible.
        assert!(!c.inner.refresh_inflight.load(Ordering::Acquire));
    }
}
