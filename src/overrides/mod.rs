//! User-supplied overrides for computed defaults.
//!
//! An override replaces one computed value (a shipping rate, a duty
//! rate, a named fee component) for a specific route or marketplace.
//! The calculation method is an explicit tagged union
//! ([`OverrideStrategy`]), so resolvers switch on the tag rather than
//! inferring intent from which optional fields happen to be present.
//!
//! Matching is exact: route origin/destination compare
//! case-insensitively, marketplace codes compare by equality, and when
//! several overrides target the same key the last-applied one wins.

use crate::error::{DealscopeError, Result};
use serde::{Deserialize, Serialize};

/// How an override value is to be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverrideStrategy {
    /// Replace the computed figure with a fixed amount.
    Direct { amount: f64 },
    /// Replace the computed rate (duty rate, per-kg shipping rate,
    /// fee percentage) and recompute the amount from it.
    RateBased { rate: f64 },
    /// Resolve the rate through an HS-code tariff lookup.
    HsCode { code: String },
}

impl OverrideStrategy {
    /// Validate the strategy parameters. Rates are fractions in
    /// [0, 1]; amounts must be non-negative; HS codes non-empty.
    pub fn validate(&self) -> Result<()> {
        match self {
            OverrideStrategy::Direct { amount } => {
                if !amount.is_finite() || *amount < 0.0 {
                    return Err(DealscopeError::InvalidOverride(format!(
                        "direct amount must be a non-negative number, got {}",
                        amount
                    )));
                }
            }
            OverrideStrategy::RateBased { rate } => {
                if !rate.is_finite() || *rate < 0.0 {
                    return Err(DealscopeError::InvalidOverride(format!(
                        "rate must be a non-negative number, got {}",
                        rate
                    )));
                }
            }
            OverrideStrategy::HsCode { code } => {
                if code.trim().is_empty() {
                    return Err(DealscopeError::InvalidOverride(
                        "HS code must not be empty".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// An origin/destination pair, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteKey {
    pub origin: String,
    pub destination: String,
}

impl RouteKey {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_uppercase(),
            destination: destination.to_uppercase(),
        }
    }

    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        self.origin.eq_ignore_ascii_case(origin) && self.destination.eq_ignore_ascii_case(destination)
    }
}

/// Override for the shipping leg of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOverride {
    pub route: RouteKey,
    /// `Direct` replaces the per-unit cost; `RateBased` replaces the
    /// per-kg rate (minimum charge still applies).
    pub strategy: OverrideStrategy,
}

/// Override for the duty assessed on a route. Wins over the
/// zero-duty short-circuits: forcing a rate on a domestic or
/// intra-bloc route reactivates duty there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyOverride {
    pub route: RouteKey,
    pub strategy: OverrideStrategy,
}

/// Override for one named fee component on a marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeOverride {
    pub marketplace: String,
    /// Component name as it appears in the fee breakdown, e.g.
    /// "referral" or "fulfillment".
    pub component: String,
    pub strategy: OverrideStrategy,
}

/// The set of overrides in effect for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideSet {
    pub shipping: Vec<ShippingOverride>,
    pub duty: Vec<DutyOverride>,
    pub fees: Vec<FeeOverride>,
}

impl OverrideSet {
    pub fn is_empty(&self) -> bool {
        self.shipping.is_empty() && self.duty.is_empty() && self.fees.is_empty()
    }

    /// Effective shipping override for a route, if any. Later entries
    /// win over earlier ones.
    pub fn shipping_for(&self, origin: &str, destination: &str) -> Option<&ShippingOverride> {
        self.shipping
            .iter()
            .rev()
            .find(|o| o.route.matches(origin, destination))
    }

    /// Effective duty override for a route, if any.
    pub fn duty_for(&self, origin: &str, destination: &str) -> Option<&DutyOverride> {
        self.duty
            .iter()
            .rev()
            .find(|o| o.route.matches(origin, destination))
    }

    /// Effective override for a named fee component on a marketplace.
    pub fn fee_for(&self, marketplace: &str, component: &str) -> Option<&FeeOverride> {
        self.fees
            .iter()
            .rev()
            .find(|o| o.marketplace.eq_ignore_ascii_case(marketplace) && o.component == component)
    }

    /// Validate every override, partitioning into an accepted set and
    /// a list of descriptive rejection reasons. Rejected overrides
    /// leave the corresponding default computation unaffected.
    ///
    /// Rate semantics differ per family: duty and fee rates are
    /// fractions in [0, 1], a shipping rate is a per-kg charge.
    pub fn validate_partition(self) -> (OverrideSet, Vec<String>) {
        let mut accepted = OverrideSet::default();
        let mut rejections = Vec::new();
        for o in self.shipping {
            if matches!(o.strategy, OverrideStrategy::HsCode { .. }) {
                rejections.push(format!(
                    "shipping override {}->{}: HS-code strategy does not apply to shipping",
                    o.route.origin, o.route.destination
                ));
                continue;
            }
            match o.strategy.validate() {
                Ok(()) => accepted.shipping.push(o),
                Err(e) => rejections.push(format!(
                    "shipping override {}->{}: {}",
                    o.route.origin, o.route.destination, e
                )),
            }
        }
        for o in self.duty {
            // Duty overrides additionally need a non-empty route, and
            // rate-based ones a fractional rate.
            let route_ok = !o.route.origin.is_empty() && !o.route.destination.is_empty();
            if let OverrideStrategy::RateBased { rate } = &o.strategy {
                if *rate > 1.0 {
                    rejections.push(format!(
                        "duty override {}->{}: rate must be a fraction in [0, 1], got {}",
                        o.route.origin, o.route.destination, rate
                    ));
                    continue;
                }
            }
            match o.strategy.validate() {
                Ok(()) if route_ok => accepted.duty.push(o),
                Ok(()) => rejections.push("duty override: route origin and destination are required".into()),
                Err(e) => rejections.push(format!(
                    "duty override {}->{}: {}",
                    o.route.origin, o.route.destination, e
                )),
            }
        }
        for o in self.fees {
            if o.component.trim().is_empty() {
                rejections.push(format!(
                    "fee override on {}: component name is required",
                    o.marketplace
                ));
                continue;
            }
            if matches!(o.strategy, OverrideStrategy::HsCode { .. }) {
                rejections.push(format!(
                    "fee override on {} ({}): HS-code strategy does not apply to fees",
                    o.marketplace, o.component
                ));
                continue;
            }
            if let OverrideStrategy::RateBased { rate } = &o.strategy {
                if *rate > 1.0 {
                    rejections.push(format!(
                        "fee override on {} ({}): rate must be a fraction in [0, 1], got {}",
                        o.marketplace, o.component, rate
                    ));
                    continue;
                }
            }
            match o.strategy.validate() {
                Ok(()) => accepted.fees.push(o),
                Err(e) => rejections.push(format!(
                    "fee override on {} ({}): {}",
                    o.marketplace, o.component, e
                )),
            }
        }
        (accepted, rejections)
    }

    /// Merge `newer` on top of `self`; entries from `newer` are
    /// appended so they win the last-applied-wins resolution.
    pub fn merged_with(mut self, newer: OverrideSet) -> OverrideSet {
        self.shipping.extend(newer.shipping);
        self.duty.extend(newer.duty);
        self.fees.extend(newer.fees);
        self
    }
}

/// Convenience constructor for the common duty-rate override.
pub fn duty_rate_override(origin: &str, destination: &str, rate: f64) -> DutyOverride {
    DutyOverride {
        route: RouteKey::new(origin, destination),
        strategy: OverrideStrategy::RateBased { rate },
    }
}

/// Convenience constructor for a fee component override.
pub fn fee_component_override(
    marketplace: &str,
    component: &str,
    strategy: OverrideStrategy,
) -> FeeOverride {
    FeeOverride {
        marketplace: marketplace.to_string(),
        component: component.to_string(),
        strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_match_is_case_insensitive() {
        let o = duty_rate_override("cn", "us", 0.10);
        let set = OverrideSet {
            duty: vec![o],
            ..Default::default()
        };
        assert!(set.duty_for("CN", "US").is_some());
        assert!(set.duty_for("Cn", "uS").is_some());
        assert!(set.duty_for("CN", "DE").is_none());
    }

    #[test]
    fn last_applied_wins() {
        let set = OverrideSet {
            duty: vec![
                duty_rate_override("CN", "US", 0.05),
                duty_rate_override("CN", "US", 0.12),
            ],
            ..Default::default()
        };
        let eff = set.duty_for("CN", "US").unwrap();
        assert_eq!(eff.strategy, OverrideStrategy::RateBased { rate: 0.12 });
    }

    #[test]
    fn out_of_range_rate_is_rejected_with_reason() {
        let set = OverrideSet {
            duty: vec![duty_rate_override("CN", "US", 1.5)],
            ..Default::default()
        };
        let (accepted, rejections) = set.validate_partition();
        assert!(accepted.duty.is_empty());
        assert_eq!(rejections.len(), 1);
        assert!(rejections[0].contains("fraction in [0, 1]"));
    }

    #[test]
    fn hs_code_strategy_rejected_for_fees() {
        let set = OverrideSet {
            fees: vec![fee_component_override(
                "US",
                "referral",
                OverrideStrategy::HsCode { code: "8517".into() },
            )],
            ..Default::default()
        };
        let (accepted, rejections) = set.validate_partition();
        assert!(accepted.fees.is_empty());
        assert!(rejections[0].contains("does not apply to fees"));
    }

    #[test]
    fn merge_appends_newer_entries() {
        let base = OverrideSet {
            duty: vec![duty_rate_override("CN", "US", 0.05)],
            ..Default::default()
        };
        let newer = OverrideSet {
            duty: vec![duty_rate_override("CN", "US", 0.10)],
            ..Default::default()
        };
        let merged = base.merged_with(newer);
        assert_eq!(merged.duty.len(), 2);
        assert_eq!(
            merged.duty_for("CN", "US").unwrap().strategy,
            OverrideStrategy::RateBased { rate: 0.10 }
        );
    }
}
