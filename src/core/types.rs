//! Core data types for the deal-scoring engine.
//!
//! These structures describe the inputs, intermediate results and
//! outputs of the evaluation pipeline. They are serialisable via
//! [`serde`] so callers (HTTP layer, persistence) can move them across
//! process boundaries unchanged. Everything here is recomputed in full
//! on every evaluation call; only [`AssumptionRecord`] has an
//! independent persistence lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch timestamp in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The immutable per-evaluation description of what is being bought.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    /// European Article Number identifying the product.
    pub ean: String,
    /// Units the buyer intends to purchase. Must be positive.
    pub quantity: u32,
    /// Unit buy price in `buy_currency`. Must be positive.
    pub buy_price: f64,
    /// ISO 4217 code of the buy price.
    pub buy_currency: String,
    /// Origin country code of the supplier (e.g. "CN").
    pub supplier_region: String,
    /// Free-text category key used by duty, fee and demand tables.
    pub category: String,
}

/// Catalogue metadata resolved for the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub title: String,
    pub category: String,
    pub brand: String,
    /// Unit weight in kilograms; 0.5 when unknown.
    pub weight_kg: f64,
    pub asin: Option<String>,
}

impl Default for ProductMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: String::new(),
            brand: String::new(),
            weight_kg: 0.5,
            asin: None,
        }
    }
}

/// Sales channel family a marketplace belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Amazon,
    Ebay,
    Retailer,
    Distributor,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Amazon => write!(f, "amazon"),
            ChannelKind::Ebay => write!(f, "ebay"),
            ChannelKind::Retailer => write!(f, "retailer"),
            ChannelKind::Distributor => write!(f, "distributor"),
        }
    }
}

/// Where an observation came from. Degraded sources lower the data
/// reliability annotations in the audit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Live,
    Mock,
    MockFallback,
}

/// Qualitative price movement signal used by the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTrend {
    Stable,
    Rising,
    Falling,
    Volatile,
}

/// One price/demand observation for a (channel, marketplace) pair.
///
/// The demand signal bag is deliberately loose: Amazon-style channels
/// carry `sales_rank`, eBay-style channels carry `sold_last_90_days`
/// or `active_listings`, and any channel may carry a pre-computed
/// `estimated_monthly_sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelObservation {
    pub channel: ChannelKind,
    /// Marketplace country code, e.g. "US" or "DE". Also the
    /// destination the product must be landed into for this channel.
    pub marketplace: String,
    /// Observed sell price in `currency`.
    pub sell_price: f64,
    pub currency: String,
    pub sales_rank: Option<u32>,
    pub estimated_monthly_sales: Option<f64>,
    pub sold_last_90_days: Option<u32>,
    /// Competing FBA offers (Amazon) on the listing.
    pub fba_offers: Option<u32>,
    /// Active competing listings (eBay/retail).
    pub active_listings: Option<u32>,
    pub price_trend: Option<PriceTrend>,
    pub provenance: Provenance,
}

/// True unit cost of getting the product into a destination market,
/// before marketplace fees, in the buyer's source currency.
///
/// Invariant: `total = buy_price + duty_amount + shipping_per_unit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandedCost {
    pub destination: String,
    pub buy_price: f64,
    pub duty_rate: f64,
    pub duty_amount: f64,
    pub shipping_per_unit: f64,
    pub total: f64,
    pub currency: String,
}

/// A single named fee deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeComponent {
    pub name: String,
    pub amount: f64,
    /// Set when an override replaced the table value for this
    /// component.
    pub overridden: bool,
}

/// Channel fee breakdown and what the seller actually receives.
///
/// Invariant: `net_proceeds = sell_price - vat_amount - total_fees`
/// and `total_fees` equals the sum of `breakdown` amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeResult {
    pub sell_price: f64,
    pub vat_amount: f64,
    pub total_fees: f64,
    pub net_proceeds: f64,
    pub breakdown: Vec<FeeComponent>,
    pub currency: String,
}

/// Confidence band for a demand estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            ConfidenceBand::High
        } else if score >= 50.0 {
            ConfidenceBand::Medium
        } else if score >= 25.0 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::VeryLow
        }
    }
}

/// Estimated monthly unit sales for one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandEstimate {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    /// 0-100 confidence in the estimate.
    pub confidence: f64,
    pub band: ConfidenceBand,
    /// Units/month this deal could sell without flooding the market.
    pub absorption_capacity: f64,
}

/// Per-channel verdict on whether to route inventory there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelRecommendation {
    Sell,
    Avoid,
}

/// The per-channel join of landed cost, fees and demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAnalysis {
    pub channel: ChannelKind,
    pub marketplace: String,
    pub currency: String,
    pub landed_cost: LandedCost,
    /// Landed cost converted into the channel's currency.
    pub landed_cost_converted: f64,
    pub fees: FeeResult,
    pub demand: DemandEstimate,
    /// `net_proceeds - landed_cost_converted`, in channel currency.
    pub net_margin: f64,
    /// Margin as a percentage of the converted landed cost.
    pub margin_percent: f64,
    /// Months to clear the full requested quantity through this
    /// channel alone at its absorption capacity.
    pub months_to_sell: f64,
    pub recommendation: ChannelRecommendation,
    pub provenance: Provenance,
}

/// Named 0-100 sub-scores composing the overall deal score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub margin: f64,
    pub demand: f64,
    pub volume_risk: f64,
    pub data_reliability: f64,
}

/// Weights applied to the sub-scores; sums to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub margin: f64,
    pub demand: f64,
    pub volume_risk: f64,
    pub data_reliability: f64,
}

/// The composite deal score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealScore {
    /// Weighted overall score in [0, 100].
    pub overall: f64,
    pub breakdown: ScoreBreakdown,
    pub weights: ScoreWeights,
}

/// Terminal verdict on the deal, recomputed fresh on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Buy,
    Renegotiate,
    SourceElsewhere,
    Pass,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "Buy"),
            Decision::Renegotiate => write!(f, "Renegotiate"),
            Decision::SourceElsewhere => write!(f, "Source Elsewhere"),
            Decision::Pass => write!(f, "Pass"),
        }
    }
}

/// Buy-price guidance emitted on Renegotiate / SourceElsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationGuidance {
    /// Unit price that would yield a 25% margin, in the buy currency.
    pub target_buy_price: f64,
    /// Unit price at the minimum acceptable 15% margin.
    pub walk_away_price: f64,
    pub currency: String,
}

/// Alternative sourcing region with qualitative trade-offs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcingSuggestion {
    pub region: String,
    pub rationale: String,
}

/// Units assigned to one channel by the allocation planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub channel: ChannelKind,
    pub marketplace: String,
    pub units: u32,
    pub monthly_capacity: f64,
}

/// How the requested quantity is phased across channels.
///
/// Invariant: `sum(entries.units) + hold_units == total_quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub entries: Vec<AllocationEntry>,
    pub hold_units: u32,
    pub hold_rationale: Option<String>,
    pub total_quantity: u32,
}

/// One audited figure: where it came from and how it was computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodologyNote {
    /// Which figure this annotates, e.g. "duty CN->US".
    pub figure: String,
    /// Source of the value: table default, override, fallback.
    pub source: String,
    /// Qualitative confidence in the figure.
    pub confidence: String,
    /// Human-readable description of the calculation.
    pub methodology: String,
}

/// Which family of assumption a record tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssumptionType {
    Shipping,
    Duty,
    Fee,
}

impl fmt::Display for AssumptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssumptionType::Shipping => write!(f, "shipping"),
            AssumptionType::Duty => write!(f, "duty"),
            AssumptionType::Fee => write!(f, "fee"),
        }
    }
}

/// Append-only audit entry recording an assumption change. Created
/// only when an override actually changes a stored value, never on
/// first creation of a deal's baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumptionRecord {
    pub deal_id: String,
    pub assumption_type: AssumptionType,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
    pub changed_by: String,
    pub timestamp_ms: u64,
}

/// The full result of one evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub deal_id: String,
    pub ean: String,
    pub score: DealScore,
    pub decision: Decision,
    pub explanation: String,
    /// Best channel by margin percent; `None` only when no channel
    /// returned usable data.
    pub best_channel: Option<ChannelAnalysis>,
    /// All analysed channels, ranked descending by margin percent.
    pub channels: Vec<ChannelAnalysis>,
    pub allocation: AllocationPlan,
    pub negotiation: Option<NegotiationGuidance>,
    pub sourcing: Vec<SourcingSuggestion>,
    /// Per-figure source and methodology annotations.
    pub assumptions: Vec<MethodologyNote>,
    /// Overrides rejected at apply time, with reasons. The defaults
    /// were used in their place.
    pub override_rejections: Vec<String>,
    /// True when zero channels had usable data; the score is 0 and
    /// the decision is Pass.
    pub insufficient_data: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_kind_display() {
        assert_eq!(format!("{}", ChannelKind::Amazon), "amazon");
        assert_eq!(format!("{}", ChannelKind::Distributor), "distributor");
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(format!("{}", Decision::SourceElsewhere), "Source Elsewhere");
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_score(80.0), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(75.0), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(60.0), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(30.0), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_score(10.0), ConfidenceBand::VeryLow);
    }

    #[test]
    fn test_metadata_default_weight() {
        assert_eq!(ProductMetadata::default().weight_kg, 0.5);
    }
}
