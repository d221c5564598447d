//! Output formatting utilities

use analyzer_lib::models::{PriceSource, Recommendation};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format currency
pub fn format_currency(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.2}", amount),
        "CNY" => format!("¥{:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        _ => format!("{:.2} {}", amount, currency),
    }
}

/// Format a percentage with one decimal
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a timestamp for display
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Human label for a price provenance
pub fn price_source_label(source: PriceSource) -> &'static str {
    match source {
        PriceSource::Catalog => "live catalog",
        PriceSource::Fallback => "fallback table",
        PriceSource::Default => "default",
    }
}

/// Color a recommendation verdict
pub fn color_recommendation(recommendation: Recommendation) -> String {
    match recommendation {
        Recommendation::Migrate => "Migrate to serverless".green().bold().to_string(),
        Recommendation::Consider => "Consider serverless".yellow().to_string(),
        Recommendation::Keep => "Keep provisioned".red().to_string(),
    }
}
