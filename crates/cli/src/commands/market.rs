//! Market price commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, MarketPrices};
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Crop")]
    crop: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Price")]
    price: String,
}

/// Show the top market prices for a state and district
pub async fn show_prices(
    client: &ApiClient,
    state: &str,
    district: &str,
    format: OutputFormat,
) -> Result<()> {
    let prices: MarketPrices = client
        .get_with_query("market_prices", &[("state", state), ("district", district)])
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&prices)?,
        OutputFormat::Table => {
            println!("Top prices in {}, {}", district, state);
            let rows: Vec<PriceRow> = prices
                .prices
                .into_iter()
                .map(|p| PriceRow {
                    crop: p.crop,
                    market: p.market,
                    price: p.price,
                })
                .collect();
            output::print_rows(&rows, "No prices reported");
        }
    }

    Ok(())
}
