//! Channel fee calculation.
//!
//! Each channel family has its own schedule: Amazon-style
//! referral/fulfillment/closing, eBay final-value + per-order,
//! retailer commission + payment processing, and distributors who pay
//! a wholesale fraction with no per-sale fees. Overrides replace
//! individual named components, never the whole result; totals and
//! net proceeds are recomputed from the overridden components.

pub mod tables;

use crate::core::math::round2;
use crate::core::types::{ChannelKind, FeeComponent, FeeResult};
use crate::overrides::{OverrideSet, OverrideStrategy};
use tables::*;

pub struct FeeCalculator;

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the fee breakdown and net proceeds for one channel.
    ///
    /// Invariants: `total_fees` equals the sum of breakdown amounts;
    /// `net_proceeds = sell_price - vat_amount - total_fees`. For
    /// distributors the reported `sell_price` is the wholesale price
    /// itself, so the invariant holds on the figure the seller
    /// actually transacts at.
    pub fn calculate(
        &self,
        channel: ChannelKind,
        marketplace: &str,
        sell_price: f64,
        category: &str,
        dims: &PackageDims,
        currency: &str,
        overrides: Option<&OverrideSet>,
    ) -> FeeResult {
        match channel {
            ChannelKind::Amazon => {
                self.amazon(marketplace, sell_price, category, dims, currency, overrides)
            }
            ChannelKind::Ebay => self.ebay(marketplace, sell_price, currency, overrides),
            ChannelKind::Retailer => self.retailer(marketplace, sell_price, currency, overrides),
            ChannelKind::Distributor => self.distributor(sell_price, currency),
        }
    }

    fn apply_component_override(
        marketplace: &str,
        name: &str,
        table_amount: f64,
        sell_price: f64,
        overrides: Option<&OverrideSet>,
    ) -> FeeComponent {
        if let Some(o) = overrides.and_then(|s| s.fee_for(marketplace, name)) {
            let amount = match &o.strategy {
                OverrideStrategy::Direct { amount } => *amount,
                OverrideStrategy::RateBased { rate } => rate * sell_price,
                // Rejected at validation; unreachable through the engine.
                OverrideStrategy::HsCode { .. } => table_amount,
            };
            return FeeComponent {
                name: name.to_string(),
                amount: round2(amount),
                overridden: true,
            };
        }
        FeeComponent {
            name: name.to_string(),
            amount: round2(table_amount),
            overridden: false,
        }
    }

    fn assemble(
        sell_price: f64,
        vat_amount: f64,
        breakdown: Vec<FeeComponent>,
        currency: &str,
    ) -> FeeResult {
        let total_fees = round2(breakdown.iter().map(|c| c.amount).sum());
        FeeResult {
            sell_price,
            vat_amount,
            total_fees,
            net_proceeds: round2(sell_price - vat_amount - total_fees),
            breakdown,
            currency: currency.to_string(),
        }
    }

    fn amazon(
        &self,
        marketplace: &str,
        sell_price: f64,
        category: &str,
        dims: &PackageDims,
        currency: &str,
        overrides: Option<&OverrideSet>,
    ) -> FeeResult {
        // Listed prices outside the US include VAT; back it out first.
        let vat = vat_rate(marketplace);
        let vat_amount = round2(sell_price - sell_price / (1.0 + vat));

        let referral_rate = referral_for(category).rate_for(sell_price);
        let tier = size_tier_for(dims);

        let mut breakdown = vec![
            Self::apply_component_override(
                marketplace,
                "referral",
                referral_rate * sell_price,
                sell_price,
                overrides,
            ),
            Self::apply_component_override(
                marketplace,
                "fulfillment",
                tier.fee,
                sell_price,
                overrides,
            ),
        ];
        if is_media_category(category) {
            breakdown.push(Self::apply_component_override(
                marketplace,
                "closing",
                MEDIA_CLOSING_FEE,
                sell_price,
                overrides,
            ));
        }
        Self::assemble(sell_price, vat_amount, breakdown, currency)
    }

    fn ebay(
        &self,
        marketplace: &str,
        sell_price: f64,
        currency: &str,
        overrides: Option<&OverrideSet>,
    ) -> FeeResult {
        let vat = vat_rate(marketplace);
        let vat_amount = round2(sell_price - sell_price / (1.0 + vat));
        let breakdown = vec![
            Self::apply_component_override(
                marketplace,
                "final_value",
                EBAY_FINAL_VALUE_RATE * sell_price,
                sell_price,
                overrides,
            ),
            Self::apply_component_override(
                marketplace,
                "per_order",
                EBAY_PER_ORDER_FEE,
                sell_price,
                overrides,
            ),
        ];
        Self::assemble(sell_price, vat_amount, breakdown, currency)
    }

    fn retailer(
        &self,
        marketplace: &str,
        sell_price: f64,
        currency: &str,
        overrides: Option<&OverrideSet>,
    ) -> FeeResult {
        let vat = vat_rate(marketplace);
        let vat_amount = round2(sell_price - sell_price / (1.0 + vat));
        let breakdown = vec![
            Self::apply_component_override(
                marketplace,
                "commission",
                RETAILER_COMMISSION_RATE * sell_price,
                sell_price,
                overrides,
            ),
            Self::apply_component_override(
                marketplace,
                "payment",
                RETAILER_PAYMENT_RATE * sell_price,
                sell_price,
                overrides,
            ),
        ];
        Self::assemble(sell_price, vat_amount, breakdown, currency)
    }

    /// Distributors buy at a wholesale fraction of the reference
    /// retail price and charge no per-sale fees.
    fn distributor(&self, reference_retail: f64, currency: &str) -> FeeResult {
        let wholesale = round2(reference_retail * DISTRIBUTOR_WHOLESALE_FRACTION);
        FeeResult {
            sell_price: wholesale,
            vat_amount: 0.0,
            total_fees: 0.0,
            net_proceeds: wholesale,
            breakdown: Vec::new(),
            currency: currency.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::approx_eq;
    use crate::overrides::fee_component_override;

    fn calc() -> FeeCalculator {
        FeeCalculator::new()
    }

    fn assert_invariants(r: &FeeResult) {
        let sum: f64 = r.breakdown.iter().map(|c| c.amount).sum();
        assert!(approx_eq(r.total_fees, round2(sum), 1e-9));
        assert!(approx_eq(
            r.net_proceeds,
            round2(r.sell_price - r.vat_amount - r.total_fees),
            1e-9
        ));
    }

    #[test]
    fn amazon_us_has_no_vat() {
        let r = calc().calculate(
            ChannelKind::Amazon,
            "US",
            40.0,
            "electronics",
            &PackageDims::default(),
            "USD",
            None,
        );
        assert_eq!(r.vat_amount, 0.0);
        // referral 8% of 40 = 3.20, fulfillment large-standard 4.75.
        assert_eq!(r.breakdown[0].amount, 3.20);
        assert_eq!(r.breakdown[1].amount, 4.75);
        assert_eq!(r.total_fees, 7.95);
        assert_eq!(r.net_proceeds, 32.05);
        assert_invariants(&r);
    }

    #[test]
    fn amazon_de_backs_out_vat() {
        let r = calc().calculate(
            ChannelKind::Amazon,
            "DE",
            47.6,
            "home",
            &PackageDims::default(),
            "EUR",
            None,
        );
        // 47.60 - 47.60/1.19 = 7.60
        assert!(approx_eq(r.vat_amount, 7.60, 0.01));
        assert_invariants(&r);
    }

    #[test]
    fn media_category_adds_closing_fee() {
        let r = calc().calculate(
            ChannelKind::Amazon,
            "US",
            25.0,
            "books",
            &PackageDims::default(),
            "USD",
            None,
        );
        assert!(r.breakdown.iter().any(|c| c.name == "closing" && c.amount == 1.80));
        assert_invariants(&r);
    }

    #[test]
    fn ebay_schedule() {
        let r = calc().calculate(
            ChannelKind::Ebay,
            "US",
            40.0,
            "electronics",
            &PackageDims::default(),
            "USD",
            None,
        );
        assert_eq!(r.breakdown[0].amount, 5.30); // 13.25% of 40
        assert_eq!(r.breakdown[1].amount, 0.30);
        assert_invariants(&r);
    }

    #[test]
    fn distributor_nets_the_wholesale_price() {
        let r = calc().calculate(
            ChannelKind::Distributor,
            "US",
            40.0,
            "electronics",
            &PackageDims::default(),
            "USD",
            None,
        );
        assert_eq!(r.sell_price, 24.0);
        assert_eq!(r.total_fees, 0.0);
        assert_eq!(r.net_proceeds, 24.0);
        assert_invariants(&r);
    }

    #[test]
    fn component_override_recomputes_totals() {
        let set = OverrideSet {
            fees: vec![fee_component_override(
                "US",
                "referral",
                OverrideStrategy::RateBased { rate: 0.05 },
            )],
            ..Default::default()
        };
        let r = calc().calculate(
            ChannelKind::Amazon,
            "US",
            40.0,
            "electronics",
            &PackageDims::default(),
            "USD",
            Some(&set),
        );
        let referral = r.breakdown.iter().find(|c| c.name == "referral").unwrap();
        assert!(referral.overridden);
        assert_eq!(referral.amount, 2.0);
        // Fulfillment untouched, total recomputed from components.
        assert_eq!(r.total_fees, 6.75);
        assert_eq!(r.net_proceeds, 33.25);
        assert_invariants(&r);
    }
}
