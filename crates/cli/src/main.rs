//! AgriGuru CLI
//!
//! A command-line tool for requesting crop recommendations and
//! market prices from an AgriGuru server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{market, predict, status};

/// AgriGuru CLI
#[derive(Parser)]
#[command(name = "agri")]
#[command(author, version, about = "CLI for the AgriGuru crop advisor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via AGRIGURU_API_URL env var)
    #[arg(long, env = "AGRIGURU_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend a crop for a soil and weather sample
    Predict(SampleArgs),

    /// List the crops the model can recommend
    Crops,

    /// Show top market prices for a district
    Prices {
        /// State name, e.g. "Punjab"
        #[arg(long)]
        state: String,

        /// District name, e.g. "Ludhiana"
        #[arg(long)]
        district: String,
    },

    /// Show server liveness and component health
    Health,
}

#[derive(Args)]
pub struct SampleArgs {
    /// Nitrogen content of the soil
    #[arg(long, short = 'n')]
    pub nitrogen: f64,

    /// Phosphorus content of the soil
    #[arg(long, short = 'p')]
    pub phosphorus: f64,

    /// Potassium content of the soil
    #[arg(long, short = 'k')]
    pub potassium: f64,

    /// Temperature in degrees Celsius
    #[arg(long)]
    pub temperature: f64,

    /// Relative humidity in percent
    #[arg(long)]
    pub humidity: f64,

    /// Soil pH
    #[arg(long)]
    pub ph: f64,

    /// Rainfall in millimetres
    #[arg(long)]
    pub rainfall: f64,
}

impl From<SampleArgs> for client::PredictRequest {
    fn from(args: SampleArgs) -> Self {
        Self {
            nitrogen: args.nitrogen,
            phosphorus: args.phosphorus,
            potassium: args.potassium,
            temperature: args.temperature,
            humidity: args.humidity,
            ph: args.ph,
            rainfall: args.rainfall,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url);
    let format = config.resolve_format(cli.format);

    // Initialize client
    let client = client::ApiClient::new(&api_url)?;

    // Execute command
    match cli.command {
        Commands::Predict(sample) => {
            predict::predict(&client, &sample.into(), format).await?;
        }
        Commands::Crops => {
            predict::list_crops(&client, format).await?;
        }
        Commands::Prices { state, district } => {
            market::show_prices(&client, &state, &district, format).await?;
        }
        Commands::Health => {
            status::show_health(&client, format).await?;
        }
    }

    Ok(())
}
