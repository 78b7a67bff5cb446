//! Deal scoring.
//!
//! Four 0-100 sub-scores are blended into a weighted composite:
//! margin quality, demand confidence, volume/inventory risk, and data
//! reliability. The weights default to 40/25/20/15 and always sum
//! to 1.0.

use crate::config::EngineSettings;
use crate::core::math::{lerp_segment, round2};
use crate::core::types::{DealScore, ScoreBreakdown, ScoreWeights};

/// Piecewise-linear margin ramp: 0 below 0% margin, 0-30 across
/// 0-15%, 30-60 across 15-30%, 60-85 across 30-50%, 85-100 beyond.
pub fn margin_subscore(margin_pct: f64) -> f64 {
    let score = if margin_pct <= 0.0 {
        0.0
    } else if margin_pct <= 15.0 {
        lerp_segment(margin_pct, 0.0, 15.0, 0.0, 30.0)
    } else if margin_pct <= 30.0 {
        lerp_segment(margin_pct, 15.0, 30.0, 30.0, 60.0)
    } else if margin_pct <= 50.0 {
        lerp_segment(margin_pct, 30.0, 50.0, 60.0, 85.0)
    } else {
        lerp_segment(margin_pct, 50.0, 100.0, 85.0, 100.0)
    };
    round2(score.min(100.0))
}

/// Inventory risk from the months needed to sell the full requested
/// quantity at the total absorption capacity of all Sell channels.
pub fn volume_risk_subscore(months_to_sell: f64) -> f64 {
    if months_to_sell <= 1.0 {
        100.0
    } else if months_to_sell <= 3.0 {
        85.0
    } else if months_to_sell <= 6.0 {
        60.0
    } else if months_to_sell <= 12.0 {
        35.0
    } else {
        10.0
    }
}

/// 20 points per channel that returned usable data, capped at 100.
pub fn data_reliability_subscore(usable_channels: usize) -> f64 {
    ((usable_channels as f64) * 20.0).min(100.0)
}

/// Blend the sub-scores into the composite deal score.
pub fn composite(
    margin: f64,
    demand: f64,
    volume_risk: f64,
    data_reliability: f64,
    settings: &EngineSettings,
) -> DealScore {
    let weights = ScoreWeights {
        margin: settings.margin_weight,
        demand: settings.demand_weight,
        volume_risk: settings.volume_weight,
        data_reliability: settings.reliability_weight,
    };
    let overall = round2(
        margin * weights.margin
            + demand * weights.demand
            + volume_risk * weights.volume_risk
            + data_reliability * weights.data_reliability,
    );
    DealScore {
        overall,
        breakdown: ScoreBreakdown {
            margin,
            demand,
            volume_risk,
            data_reliability,
        },
        weights,
    }
}

/// The score reported when no channel has usable data.
pub fn zero_score(settings: &EngineSettings) -> DealScore {
    composite(0.0, 0.0, 0.0, 0.0, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_ramp_breakpoints() {
        assert_eq!(margin_subscore(-5.0), 0.0);
        assert_eq!(margin_subscore(0.0), 0.0);
        assert_eq!(margin_subscore(7.5), 15.0);
        assert_eq!(margin_subscore(15.0), 30.0);
        assert_eq!(margin_subscore(30.0), 60.0);
        assert_eq!(margin_subscore(50.0), 85.0);
        assert_eq!(margin_subscore(75.0), 92.5);
        assert_eq!(margin_subscore(200.0), 100.0);
    }

    #[test]
    fn volume_risk_bands() {
        assert_eq!(volume_risk_subscore(0.5), 100.0);
        assert_eq!(volume_risk_subscore(1.0), 100.0);
        assert_eq!(volume_risk_subscore(2.9), 85.0);
        assert_eq!(volume_risk_subscore(6.0), 60.0);
        assert_eq!(volume_risk_subscore(11.0), 35.0);
        assert_eq!(volume_risk_subscore(24.0), 10.0);
        assert_eq!(volume_risk_subscore(f64::MAX), 10.0);
    }

    #[test]
    fn reliability_caps_at_five_channels() {
        assert_eq!(data_reliability_subscore(0), 0.0);
        assert_eq!(data_reliability_subscore(1), 20.0);
        assert_eq!(data_reliability_subscore(5), 100.0);
        assert_eq!(data_reliability_subscore(9), 100.0);
    }

    #[test]
    fn composite_applies_weights() {
        let settings = EngineSettings::default();
        let score = composite(80.0, 60.0, 85.0, 20.0, &settings);
        // 80*.40 + 60*.25 + 85*.20 + 20*.15 = 67.0
        assert_eq!(score.overall, 67.0);
        let w = &score.weights;
        assert!((w.margin + w.demand + w.volume_risk + w.data_reliability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_score_is_zero() {
        assert_eq!(zero_score(&EngineSettings::default()).overall, 0.0);
    }
}
