//! Crop recommendation commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, CropList, PredictRequest, Recommendation};
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Crop")]
    crop: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

#[derive(Tabled)]
struct CropRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Crop")]
    crop: String,
}

/// Request a crop recommendation for one sample
pub async fn predict(
    client: &ApiClient,
    request: &PredictRequest,
    format: OutputFormat,
) -> Result<()> {
    let recommendation: Recommendation = client.post("predict", request).await?;

    match format {
        OutputFormat::Json => output::print_json(&recommendation)?,
        OutputFormat::Table => {
            output::print_success(&format!(
                "Recommended crop: {} ({})",
                recommendation.recommended_crop.bold(),
                output::color_confidence(recommendation.confidence)
            ));
            println!();

            let rows: Vec<RankingRow> = recommendation
                .ranking
                .iter()
                .enumerate()
                .map(|(i, entry)| RankingRow {
                    rank: i + 1,
                    crop: entry.crop.clone(),
                    probability: output::format_confidence(entry.probability),
                })
                .collect();
            output::print_rows(&rows, "Model returned no ranking");
        }
    }

    Ok(())
}

/// List the crops the model can recommend
pub async fn list_crops(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: CropList = client.get("crops").await?;

    match format {
        OutputFormat::Json => output::print_json(&list)?,
        OutputFormat::Table => {
            let rows: Vec<CropRow> = list
                .crops
                .into_iter()
                .enumerate()
                .map(|(i, crop)| CropRow { index: i + 1, crop })
                .collect();
            output::print_rows(&rows, "No crops known to the model");
        }
    }

    Ok(())
}
