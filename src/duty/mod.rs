//! Import duty assessment.
//!
//! Duty resolution is an ordered chain, evaluated top to bottom:
//!
//! 1. an override exists for the exact route → apply it, skipping the
//!    zero-duty short-circuits (an override can reactivate duty on a
//!    domestic or intra-bloc shipment);
//! 2. origin == destination → 0% domestic;
//! 3. both ends inside the intra-bloc free-trade set → 0%;
//! 4. rate table: (origin, destination, category) →
//!    (origin, category) → origin default → global default 5%.
//!
//! The HS-code path consults a [`TariffLookup`] collaborator and
//! falls back to the chain above on any failure; lookup failures
//! never propagate to the caller.

use crate::core::math::{round2, safe_div};
use crate::data::tariff::TariffLookup;
use crate::overrides::{OverrideSet, OverrideStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Global fallback rate when no table entry matches.
pub const GLOBAL_DEFAULT_RATE: f64 = 0.05;

/// Which rung of the chain produced the rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DutySource {
    Override,
    Domestic,
    IntraBloc,
    SpecificRoute,
    CategoryTable,
    OriginDefault,
    GlobalDefault,
    /// Resolved through a live HS-code lookup; carries the
    /// provider-reported source.
    HsLookup(String),
}

impl DutySource {
    pub fn label(&self) -> String {
        match self {
            DutySource::Override => "override".to_string(),
            DutySource::Domestic => "domestic (0%)".to_string(),
            DutySource::IntraBloc => "intra-bloc (0%)".to_string(),
            DutySource::SpecificRoute => "route table".to_string(),
            DutySource::CategoryTable => "category table".to_string(),
            DutySource::OriginDefault => "origin default".to_string(),
            DutySource::GlobalDefault => "global default".to_string(),
            DutySource::HsLookup(s) => format!("HS lookup ({})", s),
        }
    }
}

/// An assessed duty for one route and product value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyAssessment {
    pub duty_rate: f64,
    pub duty_amount: f64,
    pub source: DutySource,
    pub overridden: bool,
}

/// Optional identifiers for the HS-code path.
#[derive(Debug, Clone, Default)]
pub struct HsQuery {
    pub hs_code: Option<String>,
    pub category: Option<String>,
    pub product_name: Option<String>,
}

/// Table-driven duty calculator. All rates are approximations with an
/// explicit fallback path, never a source of legal truth.
pub struct DutyCalculator {
    route_category: HashMap<(String, String, String), f64>,
    origin_category: HashMap<(String, String), f64>,
    origin_default: HashMap<String, f64>,
    intra_bloc: HashSet<String>,
}

impl Default for DutyCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DutyCalculator {
    pub fn new() -> Self {
        let mut route_category = HashMap::new();
        let mut rc = |o: &str, d: &str, c: &str, r: f64| {
            route_category.insert((o.to_string(), d.to_string(), c.to_string()), r);
        };
        rc("CN", "US", "electronics", 0.075);
        rc("CN", "US", "toys", 0.0);
        rc("CN", "US", "apparel", 0.12);
        rc("CN", "US", "home", 0.045);
        rc("CN", "DE", "electronics", 0.02);
        rc("CN", "DE", "toys", 0.047);
        rc("CN", "GB", "electronics", 0.02);
        rc("VN", "US", "apparel", 0.10);

        let mut origin_category = HashMap::new();
        let mut oc = |o: &str, c: &str, r: f64| {
            origin_category.insert((o.to_string(), c.to_string()), r);
        };
        oc("CN", "electronics", 0.06);
        oc("CN", "toys", 0.025);
        oc("CN", "apparel", 0.11);
        oc("CN", "books", 0.0);
        oc("VN", "apparel", 0.09);
        oc("IN", "home", 0.055);

        let mut origin_default = HashMap::new();
        origin_default.insert("CN".to_string(), 0.065);
        origin_default.insert("VN".to_string(), 0.05);
        origin_default.insert("IN".to_string(), 0.07);
        origin_default.insert("US".to_string(), 0.03);
        origin_default.insert("TR".to_string(), 0.045);

        // EU members. GB left out deliberately.
        let intra_bloc = [
            "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE",
            "IT", "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self {
            route_category,
            origin_category,
            origin_default,
            intra_bloc,
        }
    }

    fn chain_lookup(&self, origin: &str, destination: &str, category: &str) -> (f64, DutySource) {
        let o = origin.to_uppercase();
        let d = destination.to_uppercase();
        let c = category.to_lowercase();
        if let Some(r) = self.route_category.get(&(o.clone(), d, c.clone())) {
            return (*r, DutySource::SpecificRoute);
        }
        if let Some(r) = self.origin_category.get(&(o.clone(), c)) {
            return (*r, DutySource::CategoryTable);
        }
        if let Some(r) = self.origin_default.get(&o) {
            return (*r, DutySource::OriginDefault);
        }
        (GLOBAL_DEFAULT_RATE, DutySource::GlobalDefault)
    }

    fn assess_from_rate(value: f64, rate: f64, source: DutySource, overridden: bool) -> DutyAssessment {
        DutyAssessment {
            duty_rate: rate,
            duty_amount: round2(value * rate),
            source,
            overridden,
        }
    }

    /// Assess duty on `value` for a route, honouring any override for
    /// that exact route. HS-code override strategies are resolved by
    /// [`DutyCalculator::calculate_with_hs_code`]; here they fall
    /// through to the table chain.
    pub fn calculate(
        &self,
        value: f64,
        origin: &str,
        destination: &str,
        category: &str,
        overrides: Option<&OverrideSet>,
    ) -> DutyAssessment {
        if let Some(o) = overrides.and_then(|s| s.duty_for(origin, destination)) {
            match &o.strategy {
                OverrideStrategy::RateBased { rate } => {
                    return Self::assess_from_rate(value, *rate, DutySource::Override, true);
                }
                OverrideStrategy::Direct { amount } => {
                    return DutyAssessment {
                        duty_rate: safe_div(*amount, value),
                        duty_amount: round2(*amount),
                        source: DutySource::Override,
                        overridden: true,
                    };
                }
                OverrideStrategy::HsCode { .. } => {}
            }
        }
        if origin.eq_ignore_ascii_case(destination) {
            return Self::assess_from_rate(value, 0.0, DutySource::Domestic, false);
        }
        if self.intra_bloc.contains(&origin.to_uppercase())
            && self.intra_bloc.contains(&destination.to_uppercase())
        {
            return Self::assess_from_rate(value, 0.0, DutySource::IntraBloc, false);
        }
        let (rate, source) = self.chain_lookup(origin, destination, category);
        Self::assess_from_rate(value, rate, source, false)
    }

    /// Assess duty through a live HS-code lookup, falling back to the
    /// table chain on any failure. HS-code override strategies are
    /// resolved here too, through the same lookup.
    pub async fn calculate_with_hs_code(
        &self,
        value: f64,
        origin: &str,
        destination: &str,
        query: &HsQuery,
        tariff: &dyn TariffLookup,
        overrides: Option<&OverrideSet>,
    ) -> DutyAssessment {
        let category = query.category.as_deref().unwrap_or("");

        // An override with an explicit HS code wins over the query's
        // own code; Direct/RateBased overrides resolve synchronously.
        let override_code = match overrides.and_then(|s| s.duty_for(origin, destination)) {
            Some(o) => match &o.strategy {
                OverrideStrategy::HsCode { code } => Some(code.clone()),
                _ => return self.calculate(value, origin, destination, category, overrides),
            },
            None => None,
        };
        let overridden = override_code.is_some();
        let hs_code = override_code.or_else(|| query.hs_code.clone());

        if let Some(code) = hs_code {
            match tariff.lookup_duty_rate(&code, origin, destination).await {
                Ok(t) => {
                    debug!(hs_code = %code, rate = t.rate, source = %t.source, "HS tariff resolved");
                    return Self::assess_from_rate(
                        value,
                        t.rate,
                        DutySource::HsLookup(t.source),
                        overridden,
                    );
                }
                Err(e) => {
                    warn!(
                        hs_code = %code,
                        error = %e,
                        "HS tariff lookup failed, falling back to category table"
                    );
                }
            }
        }
        // No code available, or the lookup failed: the short-circuits
        // and table chain apply, minus the already-consumed override.
        self.calculate(value, origin, destination, category, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tariff::{FailingTariffLookup, StaticTariffLookup};
    use crate::overrides::{duty_rate_override, DutyOverride, OverrideStrategy, RouteKey};

    #[test]
    fn domestic_route_is_duty_free() {
        let calc = DutyCalculator::new();
        let a = calc.calculate(100.0, "US", "US", "electronics", None);
        assert_eq!(a.duty_rate, 0.0);
        assert_eq!(a.duty_amount, 0.0);
        assert_eq!(a.source, DutySource::Domestic);
    }

    #[test]
    fn intra_bloc_route_is_duty_free() {
        let calc = DutyCalculator::new();
        let a = calc.calculate(100.0, "DE", "FR", "electronics", None);
        assert_eq!(a.duty_rate, 0.0);
        assert_eq!(a.source, DutySource::IntraBloc);
        // GB is not in the bloc anymore.
        let b = calc.calculate(100.0, "DE", "GB", "electronics", None);
        assert!(b.duty_rate > 0.0);
    }

    #[test]
    fn override_reactivates_duty_on_intra_bloc_route() {
        let calc = DutyCalculator::new();
        let set = OverrideSet {
            duty: vec![duty_rate_override("DE", "FR", 0.08)],
            ..Default::default()
        };
        let a = calc.calculate(200.0, "DE", "FR", "electronics", Some(&set));
        assert_eq!(a.duty_rate, 0.08);
        assert_eq!(a.duty_amount, 16.0);
        assert!(a.overridden);
        assert_eq!(a.source, DutySource::Override);
    }

    #[test]
    fn chain_walks_specific_to_global() {
        let calc = DutyCalculator::new();
        let specific = calc.calculate(100.0, "CN", "US", "electronics", None);
        assert_eq!(specific.source, DutySource::SpecificRoute);
        assert_eq!(specific.duty_rate, 0.075);

        let category = calc.calculate(100.0, "CN", "AU", "electronics", None);
        assert_eq!(category.source, DutySource::CategoryTable);
        assert_eq!(category.duty_rate, 0.06);

        let origin = calc.calculate(100.0, "CN", "AU", "garden", None);
        assert_eq!(origin.source, DutySource::OriginDefault);
        assert_eq!(origin.duty_rate, 0.065);

        let global = calc.calculate(100.0, "BR", "AU", "garden", None);
        assert_eq!(global.source, DutySource::GlobalDefault);
        assert_eq!(global.duty_rate, GLOBAL_DEFAULT_RATE);
    }

    #[test]
    fn direct_override_sets_amount() {
        let calc = DutyCalculator::new();
        let set = OverrideSet {
            duty: vec![DutyOverride {
                route: RouteKey::new("CN", "US"),
                strategy: OverrideStrategy::Direct { amount: 3.5 },
            }],
            ..Default::default()
        };
        let a = calc.calculate(70.0, "CN", "US", "toys", Some(&set));
        assert_eq!(a.duty_amount, 3.5);
        assert_eq!(a.duty_rate, 0.05);
        assert!(a.overridden);
    }

    #[tokio::test]
    async fn hs_lookup_failure_falls_back_to_table() {
        let calc = DutyCalculator::new();
        let query = HsQuery {
            hs_code: Some("850760".to_string()),
            category: Some("electronics".to_string()),
            product_name: None,
        };
        let a = calc
            .calculate_with_hs_code(100.0, "CN", "US", &query, &FailingTariffLookup, None)
            .await;
        assert_eq!(a.source, DutySource::SpecificRoute);
        assert_eq!(a.duty_rate, 0.075);
        assert!(!a.overridden);
    }

    #[tokio::test]
    async fn hs_lookup_success_wins() {
        let calc = DutyCalculator::new();
        let mut rates = std::collections::HashMap::new();
        rates.insert("850760".to_string(), 0.027);
        let lookup = StaticTariffLookup::new(rates);
        let query = HsQuery {
            hs_code: Some("850760".to_string()),
            category: Some("electronics".to_string()),
            product_name: None,
        };
        let a = calc
            .calculate_with_hs_code(100.0, "CN", "US", &query, &lookup, None)
            .await;
        assert_eq!(a.duty_rate, 0.027);
        assert!(matches!(a.source, DutySource::HsLookup(_)));
    }

    #[tokio::test]
    async fn hs_code_override_goes_through_lookup() {
        let calc = DutyCalculator::new();
        let mut rates = std::collections::HashMap::new();
        rates.insert("950300".to_string(), 0.01);
        let lookup = StaticTariffLookup::new(rates);
        let set = OverrideSet {
            duty: vec![DutyOverride {
                route: RouteKey::new("CN", "US"),
                strategy: OverrideStrategy::HsCode { code: "950300".to_string() },
            }],
            ..Default::default()
        };
        let a = calc
            .calculate_with_hs_code(100.0, "CN", "US", &HsQuery::default(), &lookup, Some(&set))
            .await;
        assert_eq!(a.duty_rate, 0.01);
        assert!(a.overridden);
    }
}
