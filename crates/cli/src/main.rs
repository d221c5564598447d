//! Redshift Idle Analyzer CLI
//!
//! A command-line tool that measures how idle a cluster is from its
//! operational metrics and projects the cost impact of moving to
//! serverless billing.

mod commands;
mod config;
mod output;

use analyzer_lib::pricing::{OfflineCatalog, PricingResolver};
use analyzer_lib::source::{HttpMetricSource, HttpPricingCatalog, PricingCatalog};
use analyzer_lib::Analyzer;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Redshift Idle Analyzer CLI
#[derive(Parser)]
#[command(name = "ria")]
#[command(author, version, about = "Analyze cluster idle time and project serverless savings", long_about = None)]
pub struct Cli {
    /// Metrics gateway URL (can also be set via RIA_METRICS_URL env var)
    #[arg(long, env = "RIA_METRICS_URL")]
    pub metrics_url: Option<String>,

    /// Pricing gateway URL for the standard partition
    #[arg(long, env = "RIA_PRICING_URL")]
    pub pricing_url: Option<String>,

    /// Pricing gateway URL for the China partition
    #[arg(long, env = "RIA_PRICING_CN_URL")]
    pub pricing_cn_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a cluster's idle time and project serverless costs
    Analyze {
        /// Cluster identifier
        #[arg(long)]
        cluster_id: String,

        /// Region the cluster runs in
        #[arg(long)]
        region: String,

        /// Analysis window in days (1-30)
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Resolve hourly prices without running an analysis
    #[command(subcommand)]
    Price(PriceCommands),
}

#[derive(Subcommand)]
pub enum PriceCommands {
    /// Hourly price of one serverless RPU
    Rpu {
        /// Region to price in
        #[arg(long)]
        region: String,
    },

    /// Hourly price of one provisioned node
    Instance {
        /// Node type (e.g. ra3.xlplus)
        #[arg(long)]
        node_type: String,

        /// Region to price in
        #[arg(long)]
        region: String,
    },
}

/// Build the pricing catalog from whichever endpoints are configured.
/// Without any, quotes come from the built-in fallback tables.
fn build_catalog(standard: Option<&str>, china: Option<&str>) -> Result<Arc<dyn PricingCatalog>> {
    match (standard, china) {
        (None, None) => Ok(Arc::new(OfflineCatalog)),
        (std_url, cn_url) => {
            let either = std_url.or(cn_url).unwrap_or_default();
            let catalog = HttpPricingCatalog::new(
                std_url.unwrap_or(either),
                cn_url.unwrap_or(either),
            )?;
            Ok(Arc::new(catalog))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so table/JSON output stays pipeable
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // Flags win over the config file
    let file_config = config::Config::load().unwrap_or_default();
    let metrics_url = cli
        .metrics_url
        .or(file_config.metrics_url)
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let pricing_url = cli.pricing_url.or(file_config.pricing_url);
    let pricing_cn_url = cli.pricing_cn_url.or(file_config.pricing_cn_url);

    let catalog = build_catalog(pricing_url.as_deref(), pricing_cn_url.as_deref())?;

    match cli.command {
        Commands::Analyze {
            cluster_id,
            region,
            days,
        } => {
            let source = Arc::new(HttpMetricSource::new(&metrics_url)?);
            let settings = config::CollectorSettings::load()?;
            let analyzer = Analyzer::new(source, catalog)
                .with_collector_config(settings.to_collector_config());
            commands::analyze::run(&analyzer, &cluster_id, &region, days, cli.format).await?;
        }
        Commands::Price(price_cmd) => {
            let resolver = PricingResolver::new(catalog);
            match price_cmd {
                PriceCommands::Rpu { region } => {
                    commands::price::show_rpu(&resolver, &region, cli.format).await;
                }
                PriceCommands::Instance { node_type, region } => {
                    commands::price::show_instance(&resolver, &node_type, &region, cli.format)
                        .await;
                }
            }
        }
    }

    Ok(())
}
