//! Inventory allocation planning.
//!
//! Sell-recommended channels are sorted descending by absorption
//! capacity and filled greedily, with each channel capped at three
//! months of its absorption. Any remainder is held with a rationale
//! instead of being dumped into the single best channel.

use crate::core::types::{
    AllocationEntry, AllocationPlan, ChannelAnalysis, ChannelRecommendation,
};

/// Months of absorption a single channel may be loaded with.
const EXPOSURE_MONTHS: f64 = 3.0;

/// Build the allocation plan for the requested quantity.
///
/// Invariant: `sum(entries.units) + hold_units == quantity`, and no
/// entry exceeds `3 x absorption_capacity` for its channel.
pub fn plan(quantity: u32, channels: &[ChannelAnalysis]) -> AllocationPlan {
    let mut sellers: Vec<&ChannelAnalysis> = channels
        .iter()
        .filter(|c| c.recommendation == ChannelRecommendation::Sell)
        .collect();
    sellers.sort_by(|a, b| {
        b.demand
            .absorption_capacity
            .partial_cmp(&a.demand.absorption_capacity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut entries = Vec::new();
    let mut remaining = quantity;
    for channel in sellers {
        if remaining == 0 {
            break;
        }
        let cap = (channel.demand.absorption_capacity * EXPOSURE_MONTHS).floor() as u32;
        let units = cap.min(remaining);
        if units == 0 {
            continue;
        }
        entries.push(AllocationEntry {
            channel: channel.channel,
            marketplace: channel.marketplace.clone(),
            units,
            monthly_capacity: channel.demand.absorption_capacity,
        });
        remaining -= units;
    }

    let hold_rationale = if remaining > 0 {
        Some(if entries.is_empty() {
            "no channel is recommended for selling; holding the full quantity".to_string()
        } else {
            format!(
                "{} units exceed three months of absorption across all sell channels; \
                 hold and re-evaluate after initial sell-through",
                remaining
            )
        })
    } else {
        None
    };

    AllocationPlan {
        entries,
        hold_units: remaining,
        hold_rationale,
        total_quantity: quantity,
    }
}
