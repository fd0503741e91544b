//! Server status command

use anyhow::Result;
use serde_json::json;
use tabled::Tabled;

use crate::client::{ApiClient, HealthReport, Liveness};
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show liveness and component health of the server
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let liveness: Liveness = client.get("").await?;
    let health: HealthReport = client.get("healthz").await?;

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "message": liveness.message,
            "health": health,
        }))?,
        OutputFormat::Table => {
            output::print_success(&liveness.message);
            println!("Overall: {}", output::color_status(&health.status));
            if health.status != "healthy" {
                output::print_warning("Some components are not healthy");
            }

            let rows: Vec<ComponentRow> = health
                .components
                .into_iter()
                .map(|(name, component)| ComponentRow {
                    name,
                    status: output::color_status(&component.status),
                    message: component.message.unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            output::print_rows(&rows, "No components registered");
        }
    }

    Ok(())
}
