//! Freight cost quoting.
//!
//! Rates are looked up by (origin, destination, method) with a
//! generic per-method default when the exact route is absent. Costs
//! follow `max(weight * rate_per_kg, min_charge)`; the bulk variant
//! prices the whole shipment first and then divides by quantity, so
//! minimum charges amortize across units instead of being paid per
//! unit.

use crate::core::math::{round2, safe_div};
use crate::overrides::{OverrideSet, OverrideStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Freight method for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShippingMethod {
    Sea,
    Air,
    Express,
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShippingMethod::Sea => write!(f, "sea"),
            ShippingMethod::Air => write!(f, "air"),
            ShippingMethod::Express => write!(f, "express"),
        }
    }
}

/// Rate entry for one (origin, destination, method).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRate {
    pub rate_per_kg: f64,
    pub min_charge: f64,
    pub transit_days: u32,
}

/// Where the quoted rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateOrigin {
    ExactRoute,
    DefaultTable,
    Override,
}

/// A freight quote for a single shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub method: ShippingMethod,
    pub rate_per_kg: f64,
    pub min_charge: f64,
    pub transit_days: u32,
    /// Total cost of the shipment (USD).
    pub cost: f64,
    pub source: RateOrigin,
    pub overridden: bool,
}

/// A bulk quote amortized over a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkShippingQuote {
    pub quote: ShippingQuote,
    pub quantity: u32,
    pub per_unit: f64,
}

/// Table-driven freight calculator.
pub struct ShippingCalculator {
    routes: HashMap<(String, String, ShippingMethod), RouteRate>,
    defaults: HashMap<ShippingMethod, RouteRate>,
}

impl Default for ShippingCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShippingCalculator {
    pub fn new() -> Self {
        let mut routes = HashMap::new();
        let mut insert = |o: &str, d: &str, m: ShippingMethod, rate: RouteRate| {
            routes.insert((o.to_string(), d.to_string(), m), rate);
        };
        // China export lanes, the dominant sourcing routes.
        insert("CN", "US", ShippingMethod::Sea, RouteRate { rate_per_kg: 2.20, min_charge: 45.0, transit_days: 32 });
        insert("CN", "US", ShippingMethod::Air, RouteRate { rate_per_kg: 5.80, min_charge: 25.0, transit_days: 8 });
        insert("CN", "US", ShippingMethod::Express, RouteRate { rate_per_kg: 11.50, min_charge: 18.0, transit_days: 4 });
        insert("CN", "DE", ShippingMethod::Sea, RouteRate { rate_per_kg: 2.60, min_charge: 50.0, transit_days: 38 });
        insert("CN", "DE", ShippingMethod::Air, RouteRate { rate_per_kg: 6.10, min_charge: 28.0, transit_days: 9 });
        insert("CN", "DE", ShippingMethod::Express, RouteRate { rate_per_kg: 12.20, min_charge: 20.0, transit_days: 5 });
        insert("CN", "GB", ShippingMethod::Sea, RouteRate { rate_per_kg: 2.70, min_charge: 50.0, transit_days: 36 });
        insert("CN", "GB", ShippingMethod::Air, RouteRate { rate_per_kg: 6.30, min_charge: 28.0, transit_days: 9 });
        // Intra-EU and transatlantic lanes.
        insert("DE", "FR", ShippingMethod::Express, RouteRate { rate_per_kg: 4.50, min_charge: 9.0, transit_days: 2 });
        insert("DE", "FR", ShippingMethod::Air, RouteRate { rate_per_kg: 3.20, min_charge: 12.0, transit_days: 2 });
        insert("US", "DE", ShippingMethod::Air, RouteRate { rate_per_kg: 6.80, min_charge: 30.0, transit_days: 6 });
        insert("VN", "US", ShippingMethod::Sea, RouteRate { rate_per_kg: 2.40, min_charge: 48.0, transit_days: 34 });
        insert("IN", "US", ShippingMethod::Sea, RouteRate { rate_per_kg: 2.50, min_charge: 48.0, transit_days: 36 });

        let mut defaults = HashMap::new();
        defaults.insert(ShippingMethod::Sea, RouteRate { rate_per_kg: 2.80, min_charge: 55.0, transit_days: 40 });
        defaults.insert(ShippingMethod::Air, RouteRate { rate_per_kg: 6.50, min_charge: 30.0, transit_days: 10 });
        defaults.insert(ShippingMethod::Express, RouteRate { rate_per_kg: 13.00, min_charge: 22.0, transit_days: 5 });

        Self { routes, defaults }
    }

    fn lookup(&self, origin: &str, destination: &str, method: ShippingMethod) -> (RouteRate, RateOrigin) {
        let key = (
            origin.to_uppercase(),
            destination.to_uppercase(),
            method,
        );
        if let Some(rate) = self.routes.get(&key) {
            (*rate, RateOrigin::ExactRoute)
        } else {
            (self.defaults[&method], RateOrigin::DefaultTable)
        }
    }

    /// Quote a single shipment of `weight_kg` along a route.
    pub fn quote(
        &self,
        weight_kg: f64,
        origin: &str,
        destination: &str,
        method: ShippingMethod,
        overrides: Option<&OverrideSet>,
    ) -> ShippingQuote {
        let (mut rate, mut source) = self.lookup(origin, destination, method);
        let mut overridden = false;
        let mut direct_cost: Option<f64> = None;

        if let Some(o) = overrides.and_then(|s| s.shipping_for(origin, destination)) {
            overridden = true;
            source = RateOrigin::Override;
            match &o.strategy {
                OverrideStrategy::Direct { amount } => direct_cost = Some(*amount),
                OverrideStrategy::RateBased { rate: per_kg } => rate.rate_per_kg = *per_kg,
                // Rejected at validation; unreachable through the engine.
                OverrideStrategy::HsCode { .. } => {}
            }
        }

        let cost = match direct_cost {
            Some(c) => round2(c),
            None => round2((weight_kg * rate.rate_per_kg).max(rate.min_charge)),
        };
        ShippingQuote {
            method,
            rate_per_kg: rate.rate_per_kg,
            min_charge: rate.min_charge,
            transit_days: rate.transit_days,
            cost,
            source,
            overridden,
        }
    }

    /// Quote a bulk shipment and amortize the cost per unit. The full
    /// shipment weight is priced first so the minimum charge spreads
    /// across the quantity.
    ///
    /// A `Direct` shipping override is interpreted as a forced
    /// per-unit cost.
    pub fn quote_bulk(
        &self,
        unit_weight_kg: f64,
        quantity: u32,
        origin: &str,
        destination: &str,
        method: ShippingMethod,
        overrides: Option<&OverrideSet>,
    ) -> BulkShippingQuote {
        let quantity = quantity.max(1);
        if let Some(o) = overrides.and_then(|s| s.shipping_for(origin, destination)) {
            if let OverrideStrategy::Direct { amount } = &o.strategy {
                let (rate, _) = self.lookup(origin, destination, method);
                let per_unit = round2(*amount);
                return BulkShippingQuote {
                    quote: ShippingQuote {
                        method,
                        rate_per_kg: rate.rate_per_kg,
                        min_charge: rate.min_charge,
                        transit_days: rate.transit_days,
                        cost: round2(per_unit * quantity as f64),
                        source: RateOrigin::Override,
                        overridden: true,
                    },
                    quantity,
                    per_unit,
                };
            }
        }
        let total_weight = unit_weight_kg * quantity as f64;
        let quote = self.quote(total_weight, origin, destination, method, overrides);
        let per_unit = round2(safe_div(quote.cost, quantity as f64));
        BulkShippingQuote {
            quote,
            quantity,
            per_unit,
        }
    }
}
