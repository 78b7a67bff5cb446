//! Decision thresholds and guidance.
//!
//! The decision is a pure function of the overall score and the best
//! channel's margin percent: stateless and recomputed on every call,
//! so identical inputs always produce the identical decision.

use crate::config::EngineSettings;
use crate::core::math::round2;
use crate::core::types::{Decision, NegotiationGuidance, SourcingSuggestion};

/// Margin targets backing the negotiation guidance.
const TARGET_MARGIN: f64 = 0.25;
const WALK_AWAY_MARGIN: f64 = 0.15;

/// Map (overall score, best margin percent) to a decision.
pub fn decide(overall_score: f64, best_margin_pct: f64, settings: &EngineSettings) -> Decision {
    if overall_score >= settings.buy_score && best_margin_pct >= settings.buy_margin_pct {
        Decision::Buy
    } else if overall_score >= settings.renegotiate_score
        && best_margin_pct >= settings.renegotiate_margin_pct
    {
        Decision::Renegotiate
    } else if overall_score >= settings.source_elsewhere_score && best_margin_pct > 0.0 {
        Decision::SourceElsewhere
    } else {
        Decision::Pass
    }
}

/// Buy prices that would make the deal work, derived from the best
/// channel's net proceeds expressed in the buy currency.
pub fn negotiation_guidance(net_proceeds_buy_ccy: f64, currency: &str) -> NegotiationGuidance {
    NegotiationGuidance {
        target_buy_price: round2(net_proceeds_buy_ccy / (1.0 + TARGET_MARGIN)),
        walk_away_price: round2(net_proceeds_buy_ccy / (1.0 + WALK_AWAY_MARGIN)),
        currency: currency.to_string(),
    }
}

/// Up to three alternative sourcing regions, excluding the current
/// supplier region.
pub fn sourcing_suggestions(current_region: &str) -> Vec<SourcingSuggestion> {
    let candidates = [
        ("CN", "largest supplier base and lowest unit prices; longest lead times and rising duty exposure"),
        ("VN", "competitive labour costs and growing electronics capacity; smaller supplier pool"),
        ("IN", "strong in textiles and home goods; variable quality control, longer sea transit"),
        ("TR", "short lead times into the EU; unit costs above Asian suppliers"),
        ("MX", "near-shore for North America with short transit; narrower category coverage"),
        ("PL", "intra-EU duty-free into European markets; highest unit costs of the set"),
    ];
    candidates
        .iter()
        .filter(|(region, _)| !region.eq_ignore_ascii_case(current_region))
        .take(3)
        .map(|(region, rationale)| SourcingSuggestion {
            region: region.to_string(),
            rationale: rationale.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EngineSettings {
        EngineSettings::default()
    }

    #[test]
    fn threshold_table() {
        let s = settings();
        assert_eq!(decide(80.0, 20.0, &s), Decision::Buy);
        assert_eq!(decide(75.0, 15.0, &s), Decision::Buy);
        // High score but thin margin drops to Renegotiate.
        assert_eq!(decide(80.0, 12.0, &s), Decision::Renegotiate);
        assert_eq!(decide(60.0, 11.0, &s), Decision::Renegotiate);
        assert_eq!(decide(45.0, 5.0, &s), Decision::SourceElsewhere);
        // Positive-margin requirement is strict.
        assert_eq!(decide(45.0, 0.0, &s), Decision::Pass);
        assert_eq!(decide(30.0, 40.0, &s), Decision::Pass);
    }

    #[test]
    fn decision_is_deterministic() {
        let s = settings();
        for _ in 0..10 {
            assert_eq!(decide(62.5, 11.0, &s), Decision::Renegotiate);
        }
    }

    #[test]
    fn guidance_prices_hit_the_margin_targets() {
        let g = negotiation_guidance(32.05, "USD");
        assert_eq!(g.target_buy_price, 25.64); // 32.05 / 1.25
        assert_eq!(g.walk_away_price, 27.87); // 32.05 / 1.15
        assert!(g.target_buy_price < g.walk_away_price);
    }

    #[test]
    fn sourcing_excludes_current_region_and_caps_at_three() {
        let suggestions = sourcing_suggestions("CN");
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|s| s.region != "CN"));
    }
}
