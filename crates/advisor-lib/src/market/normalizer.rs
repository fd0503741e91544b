//! Price normalization and ranking
//!
//! Records are deduplicated by crop name keeping the first one seen with
//! a usable price, converted from minor units to major units per kg,
//! sorted by price descending and truncated.

use crate::models::{MarketRecord, RankedPrice};
use crate::predictor::round_to;
use std::collections::HashSet;

/// Maximum number of prices returned for a location
pub const TOP_N: usize = 5;

/// Divisor converting upstream minor units to major units per kg
pub const MINOR_UNITS_PER_MAJOR: f64 = 100.0;

/// Unit marker appended to formatted prices
pub const PRICE_UNIT: &str = "/kg";

/// Format a normalized price for display, e.g. `100.00/kg`
pub fn format_price(price_per_kg: f64) -> String {
    format!("{:.2}{}", round_to(price_per_kg, 2), PRICE_UNIT)
}

/// Deduplicate, normalize and rank raw records, keeping at most `limit`
pub fn normalize_and_rank(records: Vec<MarketRecord>, limit: usize) -> Vec<RankedPrice> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut prices: Vec<RankedPrice> = Vec::new();

    for record in records {
        let Some(modal_price) = record.modal_price else {
            continue;
        };
        let crop = record.crop.trim();
        if crop.is_empty() || !seen.insert(crop.to_string()) {
            continue;
        }

        let price_per_kg = modal_price / MINOR_UNITS_PER_MAJOR;
        prices.push(RankedPrice {
            crop: crop.to_string(),
            market: record.market.trim().to_string(),
            price: format_price(price_per_kg),
            price_per_kg,
        });
    }

    // Stable: equal prices keep the order received from the source
    prices.sort_by(|a, b| b.price_per_kg.total_cmp(&a.price_per_kg));
    prices.truncate(limit);
    prices
}
