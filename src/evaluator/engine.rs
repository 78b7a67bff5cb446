//! Multi-channel evaluation engine.
//!
//! The evaluator composes the calculators per channel: landed cost
//! per destination, fees and demand per observation, a currency
//! conversion into each channel's currency, and a ranked, scored,
//! decision-bearing result. Per-channel computations are independent
//! pure functions; all of them complete before ranking and scoring
//! (fan-out/fan-in, not a pipeline with partial results).
//!
//! Persistence is best effort throughout: a store failure is logged
//! and the evaluation result is still returned to the caller.

use crate::audit::{AssumptionAuditor, AssumptionSnapshot};
use crate::config::EngineSettings;
use crate::core::math::{round2, safe_div};
use crate::core::types::{
    now_ms, ChannelAnalysis, ChannelObservation, ChannelRecommendation, Decision,
    EvaluationResult, LandedCost, MethodologyNote, ProductInput, ProductMetadata,
};
use crate::currency::CurrencyConverter;
use crate::data::store::{Deal, DealStore};
use crate::data::tariff::TariffLookup;
use crate::demand::DemandEstimator;
use crate::duty::{DutyCalculator, HsQuery};
use crate::error::{DealscopeError, Result};
use crate::fees::tables::PackageDims;
use crate::fees::FeeCalculator;
use crate::overrides::OverrideSet;
use crate::shipping::{ShippingCalculator, ShippingMethod};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Orchestrates the per-channel calculators into one scored,
/// decision-bearing evaluation.
pub struct MultiChannelEvaluator {
    currency: CurrencyConverter,
    shipping: ShippingCalculator,
    duty: DutyCalculator,
    fees: FeeCalculator,
    demand: DemandEstimator,
    tariff: Arc<dyn TariffLookup>,
    store: Arc<dyn DealStore>,
    auditor: AssumptionAuditor,
    settings: EngineSettings,
}

impl MultiChannelEvaluator {
    pub fn new(
        currency: CurrencyConverter,
        tariff: Arc<dyn TariffLookup>,
        store: Arc<dyn DealStore>,
    ) -> Self {
        Self::with_settings(currency, tariff, store, EngineSettings::default())
    }

    pub fn with_settings(
        currency: CurrencyConverter,
        tariff: Arc<dyn TariffLookup>,
        store: Arc<dyn DealStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            currency,
            shipping: ShippingCalculator::new(),
            duty: DutyCalculator::new(),
            fees: FeeCalculator::new(),
            demand: DemandEstimator::new(),
            tariff,
            store,
            auditor: AssumptionAuditor::new(),
            settings,
        }
    }

    /// Evaluate a product across every supplied channel observation
    /// and persist the resulting deal (best effort).
    pub async fn evaluate_multi_channel(
        &self,
        input: ProductInput,
        metadata: ProductMetadata,
        observations: Vec<ChannelObservation>,
        overrides: OverrideSet,
    ) -> Result<EvaluationResult> {
        validate_input(&input)?;
        let (overrides, rejections) = overrides.validate_partition();
        let deal_id = Uuid::new_v4().to_string();
        let result = self
            .evaluate_core(&deal_id, &input, &metadata, &observations, &overrides, rejections)
            .await?;

        let deal = Deal {
            deal_id: deal_id.clone(),
            input,
            metadata,
            observations,
            overrides,
            result: result.clone(),
            created_ms: now_ms(),
            updated_ms: now_ms(),
        };
        if let Err(e) = self.store.create_deal(deal).await {
            warn!(deal_id = %deal_id, error = %e, "failed to persist deal, returning result anyway");
        }
        Ok(result)
    }

    /// Re-evaluate a stored deal with additional overrides. Channel
    /// observations come from the stored deal; this is override
    /// application, not re-discovery, so no marketplace data is
    /// re-fetched. Emits one assumption record per audited value the
    /// overrides actually changed.
    pub async fn apply_overrides_and_recompute(
        &self,
        deal_id: &str,
        overrides: OverrideSet,
        changed_by: &str,
    ) -> Result<EvaluationResult> {
        let mut deal = match self.store.find_deal(deal_id).await {
            Ok(Some(deal)) => deal,
            Ok(None) => return Err(DealscopeError::DealNotFound(deal_id.to_string())),
            Err(e) => return Err(DealscopeError::StorageError(e.to_string())),
        };

        let (accepted, rejections) = overrides.validate_partition();
        let merged = deal.overrides.clone().merged_with(accepted);

        let old_snapshot = AssumptionSnapshot::from_result(&deal.result);
        let result = self
            .evaluate_core(
                deal_id,
                &deal.input,
                &deal.metadata,
                &deal.observations,
                &merged,
                rejections,
            )
            .await?;
        let new_snapshot = AssumptionSnapshot::from_result(&result);

        let records = self
            .auditor
            .diff(deal_id, changed_by, &old_snapshot, &new_snapshot);
        if !records.is_empty() {
            info!(deal_id, changed = records.len(), "override changed audited assumptions");
            if let Err(e) = self.store.append_assumptions(&records).await {
                warn!(deal_id, error = %e, "failed to persist assumption records");
            }
        }

        deal.overrides = merged;
        deal.result = result.clone();
        if let Err(e) = self.store.update_deal(deal).await {
            warn!(deal_id, error = %e, "failed to persist recomputed deal");
        }
        Ok(result)
    }

    async fn evaluate_core(
        &self,
        deal_id: &str,
        input: &ProductInput,
        metadata: &ProductMetadata,
        observations: &[ChannelObservation],
        overrides: &OverrideSet,
        override_rejections: Vec<String>,
    ) -> Result<EvaluationResult> {
        let usable: Vec<&ChannelObservation> = observations
            .iter()
            .filter(|o| {
                let ok = o.sell_price > 0.0 && !o.currency.is_empty();
                if !ok {
                    debug!(channel = %o.channel, marketplace = %o.marketplace, "skipping unusable observation");
                }
                ok
            })
            .collect();
        if usable.is_empty() {
            return Ok(self.no_data_result(deal_id, input, override_rejections, Vec::new()));
        }

        let weight_kg = if metadata.weight_kg > 0.0 {
            metadata.weight_kg
        } else {
            0.5
        };
        let dims = PackageDims {
            weight_kg,
            ..PackageDims::default()
        };

        // Landed cost once per distinct destination, in the buy
        // currency.
        let mut landed_by_destination: HashMap<String, LandedCost> = HashMap::new();
        let mut assumptions: Vec<MethodologyNote> = Vec::new();
        for obs in &usable {
            let destination = obs.marketplace.to_uppercase();
            if landed_by_destination.contains_key(&destination) {
                continue;
            }
            let landed = self
                .landed_cost(input, metadata, &destination, &dims, overrides, &mut assumptions)
                .await?;
            landed_by_destination.insert(destination, landed);
        }

        // Fan out per channel; every channel completes before ranking.
        // A channel whose currency cannot be converted is excluded as
        // missing data, not a failure of the evaluation.
        let mut channels: Vec<ChannelAnalysis> = Vec::with_capacity(usable.len());
        for obs in &usable {
            let landed = &landed_by_destination[&obs.marketplace.to_uppercase()];
            match self.analyse_channel(input, obs, landed, &dims, overrides) {
                Ok(analysis) => {
                    assumptions.push(self.auditor.fee_note(&analysis));
                    channels.push(analysis);
                }
                Err(e) => {
                    warn!(
                        channel = %obs.channel,
                        marketplace = %obs.marketplace,
                        currency = %obs.currency,
                        error = %e,
                        "excluding channel: landed cost not convertible into its currency"
                    );
                    assumptions.push(MethodologyNote {
                        figure: format!("channel {} {}", obs.channel, obs.marketplace),
                        source: "excluded".to_string(),
                        confidence: "no data".to_string(),
                        methodology: format!("currency {} not convertible: {}", obs.currency, e),
                    });
                }
            }
        }
        if channels.is_empty() {
            return Ok(self.no_data_result(deal_id, input, override_rejections, assumptions));
        }
        channels.sort_by(|a, b| {
            b.margin_percent
                .partial_cmp(&a.margin_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = channels[0].clone();
        assumptions.push(self.auditor.fx_note(&self.currency.status()));

        // Scoring happens on a USD-normalized basis; margin percent is
        // already scale-free, the absolute figures convert below for
        // the explanation.
        let best_net_margin_usd = self
            .currency
            .convert(best.net_margin, &best.currency, "USD")?;

        let total_absorption: f64 = channels
            .iter()
            .filter(|c| c.recommendation == ChannelRecommendation::Sell)
            .map(|c| c.demand.absorption_capacity)
            .sum();
        let months_all = if total_absorption > 0.0 {
            input.quantity as f64 / total_absorption
        } else {
            f64::MAX
        };

        let score = super::scoring::composite(
            super::scoring::margin_subscore(best.margin_percent),
            best.demand.confidence,
            super::scoring::volume_risk_subscore(months_all),
            super::scoring::data_reliability_subscore(channels.len()),
            &self.settings,
        );
        let decision = super::decision::decide(score.overall, best.margin_percent, &self.settings);

        let negotiation = if matches!(decision, Decision::Renegotiate | Decision::SourceElsewhere) {
            let net_in_buy_ccy =
                self.currency
                    .convert(best.fees.net_proceeds, &best.currency, &input.buy_currency)?;
            Some(super::decision::negotiation_guidance(
                net_in_buy_ccy,
                &input.buy_currency,
            ))
        } else {
            None
        };
        let sourcing = if decision == Decision::SourceElsewhere {
            super::decision::sourcing_suggestions(&input.supplier_region)
        } else {
            Vec::new()
        };

        let allocation = super::allocation::plan(input.quantity, &channels);

        let explanation = format!(
            "{}: best channel {} {} at {:.1}% margin ({:.2} USD/unit), overall score {:.1} \
             (margin {:.1}, demand {:.1}, volume {:.1}, reliability {:.1}); {} usable channel(s)",
            decision,
            best.channel,
            best.marketplace,
            best.margin_percent,
            best_net_margin_usd,
            score.overall,
            score.breakdown.margin,
            score.breakdown.demand,
            score.breakdown.volume_risk,
            score.breakdown.data_reliability,
            channels.len(),
        );

        Ok(EvaluationResult {
            deal_id: deal_id.to_string(),
            ean: input.ean.clone(),
            score,
            decision,
            explanation,
            best_channel: Some(best),
            channels,
            allocation,
            negotiation,
            sourcing,
            assumptions,
            override_rejections,
            insufficient_data: false,
        })
    }

    async fn landed_cost(
        &self,
        input: &ProductInput,
        metadata: &ProductMetadata,
        destination: &str,
        dims: &PackageDims,
        overrides: &OverrideSet,
        assumptions: &mut Vec<MethodologyNote>,
    ) -> Result<LandedCost> {
        let origin = input.supplier_region.as_str();
        let query = HsQuery {
            hs_code: None,
            category: Some(input.category.clone()),
            product_name: Some(metadata.title.clone()),
        };
        let duty = self
            .duty
            .calculate_with_hs_code(
                input.buy_price,
                origin,
                destination,
                &query,
                self.tariff.as_ref(),
                Some(overrides),
            )
            .await;
        assumptions.push(self.auditor.duty_note(origin, destination, &duty));

        let bulk = self.shipping.quote_bulk(
            dims.weight_kg,
            input.quantity,
            origin,
            destination,
            ShippingMethod::Sea,
            Some(overrides),
        );
        assumptions.push(self.auditor.shipping_note(origin, destination, &bulk));
        // Freight tables are USD-denominated; land the per-unit figure
        // in the buy currency.
        let shipping_per_unit = self
            .currency
            .convert(bulk.per_unit, "USD", &input.buy_currency)?;

        Ok(LandedCost {
            destination: destination.to_string(),
            buy_price: input.buy_price,
            duty_rate: duty.duty_rate,
            duty_amount: duty.duty_amount,
            shipping_per_unit,
            total: round2(input.buy_price + duty.duty_amount + shipping_per_unit),
            currency: input.buy_currency.clone(),
        })
    }

    fn analyse_channel(
        &self,
        input: &ProductInput,
        obs: &ChannelObservation,
        landed: &LandedCost,
        dims: &PackageDims,
        overrides: &OverrideSet,
    ) -> Result<ChannelAnalysis> {
        let fees = self.fees.calculate(
            obs.channel,
            &obs.marketplace,
            obs.sell_price,
            &input.category,
            dims,
            &obs.currency,
            Some(overrides),
        );
        let demand = self.demand.estimate(&obs.marketplace, &input.category, obs);

        let landed_converted =
            self.currency
                .convert(landed.total, &landed.currency, &obs.currency)?;
        let net_margin = round2(fees.net_proceeds - landed_converted);
        let margin_percent = round2(safe_div(net_margin, landed_converted) * 100.0);
        let months_to_sell = if demand.absorption_capacity > 0.0 {
            round2(input.quantity as f64 / demand.absorption_capacity)
        } else {
            f64::MAX
        };
        let recommendation = if net_margin > 0.0 {
            ChannelRecommendation::Sell
        } else {
            ChannelRecommendation::Avoid
        };

        Ok(ChannelAnalysis {
            channel: obs.channel,
            marketplace: obs.marketplace.to_uppercase(),
            currency: obs.currency.clone(),
            landed_cost: landed.clone(),
            landed_cost_converted: landed_converted,
            fees,
            demand,
            net_margin,
            margin_percent,
            months_to_sell,
            recommendation,
            provenance: obs.provenance,
        })
    }

    fn no_data_result(
        &self,
        deal_id: &str,
        input: &ProductInput,
        override_rejections: Vec<String>,
        assumptions: Vec<MethodologyNote>,
    ) -> EvaluationResult {
        EvaluationResult {
            deal_id: deal_id.to_string(),
            ean: input.ean.clone(),
            score: super::scoring::zero_score(&self.settings),
            decision: Decision::Pass,
            explanation: "insufficient data: no channel returned a usable observation".to_string(),
            best_channel: None,
            channels: Vec::new(),
            allocation: super::allocation::plan(input.quantity, &[]),
            negotiation: None,
            sourcing: Vec::new(),
            assumptions,
            override_rejections,
            insufficient_data: true,
        }
    }
}

fn validate_input(input: &ProductInput) -> Result<()> {
    if input.ean.trim().is_empty() {
        return Err(DealscopeError::InvalidInput("ean must not be empty".into()));
    }
    if input.quantity == 0 {
        return Err(DealscopeError::InvalidInput(
            "quantity must be positive".into(),
        ));
    }
    if !(input.buy_price > 0.0) {
        return Err(DealscopeError::InvalidInput(
            "buy price must be positive".into(),
        ));
    }
    if input.buy_currency.trim().is_empty() {
        return Err(DealscopeError::InvalidInput(
            "buy currency must not be empty".into(),
        ));
    }
    Ok(())
}
