//! Assumption auditing.
//!
//! Every number the evaluator produces carries an annotation saying
//! which source or override produced it and how it was computed
//! ([`MethodologyNote`]). When an override application changes a
//! previously-stored value, exactly one [`AssumptionRecord`] is
//! emitted per changed sub-field; shipping, duty and fee are tracked
//! independently, detected by structural deep equality on the JSON
//! representation. No record is emitted when a baseline is first
//! created.

use crate::core::types::{
    now_ms, AssumptionRecord, AssumptionType, ChannelAnalysis, EvaluationResult, MethodologyNote,
};
use crate::currency::CacheStatus;
use crate::duty::DutyAssessment;
use crate::shipping::{BulkShippingQuote, RateOrigin};
use serde_json::{json, Value};

/// The audited shipping/duty/fee values of one evaluation, in a
/// structurally comparable form.
#[derive(Debug, Clone, PartialEq)]
pub struct AssumptionSnapshot {
    pub shipping: Value,
    pub duty: Value,
    pub fee: Value,
}

impl AssumptionSnapshot {
    /// Snapshot the audited values from an evaluation result. Every
    /// analysed channel contributes, keyed by channel and marketplace,
    /// so an override touching a non-best channel is still detected
    /// and a reshuffle of the ranking alone is not. A no-data result
    /// snapshots nulls.
    pub fn from_result(result: &EvaluationResult) -> Self {
        if result.channels.is_empty() {
            return Self {
                shipping: Value::Null,
                duty: Value::Null,
                fee: Value::Null,
            };
        }
        let mut shipping = serde_json::Map::new();
        let mut duty = serde_json::Map::new();
        let mut fee = serde_json::Map::new();
        for analysis in &result.channels {
            let key = channel_key(analysis);
            shipping.insert(
                key.clone(),
                json!({ "per_unit": analysis.landed_cost.shipping_per_unit }),
            );
            duty.insert(
                key.clone(),
                json!({
                    "rate": analysis.landed_cost.duty_rate,
                    "amount": analysis.landed_cost.duty_amount,
                }),
            );
            fee.insert(
                key,
                json!({
                    "total": analysis.fees.total_fees,
                    "net_proceeds": analysis.fees.net_proceeds,
                }),
            );
        }
        Self {
            shipping: Value::Object(shipping),
            duty: Value::Object(duty),
            fee: Value::Object(fee),
        }
    }
}

fn channel_key(analysis: &ChannelAnalysis) -> String {
    format!("{} {}", analysis.channel, analysis.marketplace)
}

pub struct AssumptionAuditor;

impl Default for AssumptionAuditor {
    fn default() -> Self {
        Self::new()
    }
}

impl AssumptionAuditor {
    pub fn new() -> Self {
        Self
    }

    /// Diff two snapshots, emitting one record per changed sub-field.
    /// Equal snapshots produce no records.
    pub fn diff(
        &self,
        deal_id: &str,
        changed_by: &str,
        old: &AssumptionSnapshot,
        new: &AssumptionSnapshot,
    ) -> Vec<AssumptionRecord> {
        let ts = now_ms();
        let mut records = Vec::new();
        let mut push = |assumption_type: AssumptionType, old_value: &Value, new_value: &Value| {
            if old_value != new_value {
                records.push(AssumptionRecord {
                    deal_id: deal_id.to_string(),
                    assumption_type,
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                    changed_by: changed_by.to_string(),
                    timestamp_ms: ts,
                });
            }
        };
        push(AssumptionType::Shipping, &old.shipping, &new.shipping);
        push(AssumptionType::Duty, &old.duty, &new.duty);
        push(AssumptionType::Fee, &old.fee, &new.fee);
        records
    }

    /// Methodology note for an assessed duty.
    pub fn duty_note(&self, origin: &str, destination: &str, duty: &DutyAssessment) -> MethodologyNote {
        MethodologyNote {
            figure: format!("duty {}->{}", origin, destination),
            source: duty.source.label(),
            confidence: if duty.overridden {
                "user-specified".to_string()
            } else {
                "approximate table".to_string()
            },
            methodology: format!(
                "rate {:.2}% applied to unit customs value",
                duty.duty_rate * 100.0
            ),
        }
    }

    /// Methodology note for a bulk shipping quote.
    pub fn shipping_note(
        &self,
        origin: &str,
        destination: &str,
        quote: &BulkShippingQuote,
    ) -> MethodologyNote {
        let source = match quote.quote.source {
            RateOrigin::ExactRoute => "route table",
            RateOrigin::DefaultTable => "generic default table",
            RateOrigin::Override => "override",
        };
        MethodologyNote {
            figure: format!("shipping {}->{}", origin, destination),
            source: source.to_string(),
            confidence: if quote.quote.overridden {
                "user-specified".to_string()
            } else {
                "approximate table".to_string()
            },
            methodology: format!(
                "{} at {:.2}/kg, min charge {:.2}, amortized over {} units",
                quote.quote.method, quote.quote.rate_per_kg, quote.quote.min_charge, quote.quantity
            ),
        }
    }

    /// Methodology note for one channel's fee result.
    pub fn fee_note(&self, analysis: &ChannelAnalysis) -> MethodologyNote {
        let overridden = analysis.fees.breakdown.iter().any(|c| c.overridden);
        let components: Vec<String> = analysis
            .fees
            .breakdown
            .iter()
            .map(|c| format!("{} {:.2}", c.name, c.amount))
            .collect();
        MethodologyNote {
            figure: format!("fees {} {}", analysis.channel, analysis.marketplace),
            source: if overridden {
                "schedule + override".to_string()
            } else {
                "marketplace schedule".to_string()
            },
            confidence: "published schedule approximation".to_string(),
            methodology: if components.is_empty() {
                "no per-sale fees for this channel".to_string()
            } else {
                components.join(", ")
            },
        }
    }

    /// Methodology note for the FX conversions backing the result.
    pub fn fx_note(&self, status: &CacheStatus) -> MethodologyNote {
        let source = if status.has_cache {
            "live rate cache"
        } else {
            "hardcoded fallback table"
        };
        let confidence = if !status.has_cache {
            "degraded"
        } else if status.is_expired {
            "stale, refresh scheduled"
        } else {
            "fresh"
        };
        MethodologyNote {
            figure: "currency conversion".to_string(),
            source: source.to_string(),
            confidence: confidence.to_string(),
            methodology: format!(
                "USD-based cross rates, cache age {}s",
                status.age_ms / 1_000
            ),
        }
    }
}
