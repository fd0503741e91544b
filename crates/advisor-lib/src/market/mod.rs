//! Market price aggregation
//!
//! Fetches raw commodity prices for a location from an external source,
//! then deduplicates, normalizes and ranks them.

mod client;
mod normalizer;

pub use client::{DataGovClient, PriceClientConfig};
pub use normalizer::{
    format_price, normalize_and_rank, MINOR_UNITS_PER_MAJOR, PRICE_UNIT, TOP_N,
};

use crate::error::Result;
use crate::models::MarketRecord;
use async_trait::async_trait;

/// External source of raw market price records
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the raw records for a (state, district) pair
    ///
    /// Returns `NoData` when the source answers with an empty record set
    /// and `SourceUnavailable` when it cannot be reached or fails.
    async fn fetch_records(&self, state: &str, district: &str) -> Result<Vec<MarketRecord>>;
}
