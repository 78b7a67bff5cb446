use crate::config::{load_or_default, EngineSettings};
use crate::core::types::{
    ChannelKind, ChannelObservation, ProductInput, ProductMetadata, Provenance,
};
use crate::currency::{CurrencyConverter, StaticRateSource};
use crate::data::fetcher::{ChannelFetcher, MockChannelFetcher};
use crate::data::store::MemoryDealStore;
use crate::data::tariff::StaticTariffLookup;
use crate::evaluator::MultiChannelEvaluator;
use crate::overrides::{duty_rate_override, OverrideSet};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// End-to-end demo wiring with deterministic collaborators: fetch
/// observations for one product, evaluate it across channels, then
/// apply a duty override and show the recompute.
pub async fn bootstrap() -> anyhow::Result<()> {
    let settings: EngineSettings = load_or_default();

    // 1) Product under consideration
    let input = ProductInput {
        ean: "4006381333931".to_string(),
        quantity: 200,
        buy_price: 8.50,
        buy_currency: "USD".to_string(),
        supplier_region: "CN".to_string(),
        category: "electronics".to_string(),
    };
    let metadata = ProductMetadata {
        title: "Wireless earbuds, charging case".to_string(),
        category: "electronics".to_string(),
        brand: "Generic".to_string(),
        weight_kg: 0.3,
        asin: Some("B0DEMO1234".to_string()),
    };

    // 2) Mock marketplace data for three channels
    let fetcher = MockChannelFetcher::new(vec![
        ChannelObservation {
            channel: ChannelKind::Amazon,
            marketplace: "US".to_string(),
            sell_price: 34.99,
            currency: "USD".to_string(),
            sales_rank: Some(2_400),
            estimated_monthly_sales: None,
            sold_last_90_days: None,
            fba_offers: Some(7),
            active_listings: None,
            price_trend: None,
            provenance: Provenance::Mock,
        },
        ChannelObservation {
            channel: ChannelKind::Amazon,
            marketplace: "DE".to_string(),
            sell_price: 32.90,
            currency: "EUR".to_string(),
            sales_rank: Some(5_100),
            estimated_monthly_sales: None,
            sold_last_90_days: None,
            fba_offers: Some(4),
            active_listings: None,
            price_trend: None,
            provenance: Provenance::Mock,
        },
        ChannelObservation {
            channel: ChannelKind::Ebay,
            marketplace: "US".to_string(),
            sell_price: 29.99,
            currency: "USD".to_string(),
            sales_rank: None,
            estimated_monthly_sales: None,
            sold_last_90_days: Some(66),
            fba_offers: None,
            active_listings: Some(18),
            price_trend: None,
            provenance: Provenance::Mock,
        },
    ]);
    let mut observations = Vec::new();
    for (channel, marketplace) in [
        (ChannelKind::Amazon, "US"),
        (ChannelKind::Amazon, "DE"),
        (ChannelKind::Ebay, "US"),
    ] {
        if let Some(obs) = fetcher
            .fetch_channel_observation(&input.ean, channel, marketplace)
            .await?
        {
            observations.push(obs);
        }
    }

    // 3) Evaluator with deterministic collaborators
    let converter = CurrencyConverter::new(
        Arc::new(StaticRateSource::fallback()),
        Duration::from_secs(settings.currency_ttl_secs),
    );
    let mut hs_rates = HashMap::new();
    hs_rates.insert("851830".to_string(), 0.032);
    let evaluator = MultiChannelEvaluator::with_settings(
        converter,
        Arc::new(StaticTariffLookup::new(hs_rates)),
        Arc::new(MemoryDealStore::new()),
        settings,
    );

    let result = evaluator
        .evaluate_multi_channel(
            input,
            metadata,
            observations,
            OverrideSet::default(),
        )
        .await?;
    info!(
        deal_id = %result.deal_id,
        decision = %result.decision,
        score = result.score.overall,
        channels = result.channels.len(),
        "initial evaluation"
    );
    info!("{}", result.explanation);

    // 4) Negotiated a better duty ruling: override and recompute
    let overrides = OverrideSet {
        duty: vec![duty_rate_override("CN", "US", 0.02)],
        ..Default::default()
    };
    let recomputed = evaluator
        .apply_overrides_and_recompute(&result.deal_id, overrides, "demo")
        .await?;
    info!(
        decision = %recomputed.decision,
        score = recomputed.score.overall,
        rejections = recomputed.override_rejections.len(),
        "recomputed with duty override"
    );
    for entry in &recomputed.allocation.entries {
        info!(
            channel = %entry.channel,
            marketplace = %entry.marketplace,
            units = entry.units,
            "allocation"
        );
    }
    if let Some(rationale) = &recomputed.allocation.hold_rationale {
        info!(hold = recomputed.allocation.hold_units, "{}", rationale);
    }

    Ok(())
}
