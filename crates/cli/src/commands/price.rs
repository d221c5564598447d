//! Price resolution commands

use analyzer_lib::models::PriceQuote;
use analyzer_lib::pricing::{location_for_region, Partition, PricingResolver};
use colored::Colorize;
use serde_json::json;

use crate::output::{price_source_label, OutputFormat};

/// Show the hourly RPU price for a region
pub async fn show_rpu(resolver: &PricingResolver, region: &str, format: OutputFormat) {
    let quote = resolver.resolve_rpu_price(region).await;
    render("rpu", region, None, &quote, format);
}

/// Show the hourly instance price for a node type in a region
pub async fn show_instance(
    resolver: &PricingResolver,
    node_type: &str,
    region: &str,
    format: OutputFormat,
) {
    let quote = resolver.resolve_instance_price(node_type, region).await;
    render("instance", region, Some(node_type), &quote, format);
}

fn render(
    kind: &str,
    region: &str,
    node_type: Option<&str>,
    quote: &PriceQuote,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "kind": kind,
                "region": region,
                "node_type": node_type,
                "price": quote,
            });
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        OutputFormat::Table => {
            println!("{}", "Price Quote".bold());
            println!("{}", "=".repeat(50));
            match node_type {
                Some(t) => println!("Resource:               {} node-hour", t.cyan()),
                None => println!("Resource:               {}", "RPU-hour".cyan()),
            }
            println!(
                "Region:                 {} ({})",
                region,
                location_for_region(region)
            );
            println!(
                "Partition:              {:?}",
                Partition::from_region(region)
            );
            println!(
                "Hourly price:           {} {}",
                format!("{}", quote.value).green().bold(),
                quote.currency
            );
            println!(
                "Source:                 {}",
                price_source_label(quote.source).dimmed()
            );
        }
    }
}
