//! Idle-time analysis command

use analyzer_lib::{AnalysisReport, AnalysisRequest, Analyzer};
use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::output::{
    color_recommendation, format_currency, format_percent, format_timestamp, price_source_label,
    print_warning, OutputFormat,
};

/// Row for the per-metric activity table
#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Triggered")]
    triggered: u64,
    #[tabled(rename = "Share")]
    share: String,
}

/// Run the full analysis pipeline and render the report
pub async fn run(
    analyzer: &Analyzer,
    cluster_id: &str,
    region: &str,
    days: u32,
    format: OutputFormat,
) -> Result<()> {
    let request = AnalysisRequest::new(cluster_id, region, days)?;
    let report = analyzer.run(&request).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        OutputFormat::Table => render(&report),
    }

    Ok(())
}

fn render(report: &AnalysisReport) {
    println!("{}", "Idle Time Analysis".bold());
    println!("{}", "=".repeat(50));
    println!("Cluster:                {}", report.cluster_id.cyan());
    println!("Region:                 {}", report.region);
    println!(
        "Nodes:                  {} x {}",
        report.profile.node_type, report.profile.node_count
    );
    println!("Status:                 {}", report.profile.status);
    println!(
        "Window:                 {} ~ {} ({} days)",
        format_timestamp(report.window.start),
        format_timestamp(report.window.end),
        report.days
    );
    println!();

    println!("{}", "Data Quality".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Completeness:           {} ({}/{} points)",
        format_percent(report.quality.completeness_percentage),
        report.quality.total_points,
        report.quality.expected_points
    );
    if !report.quality.missing_metrics.is_empty() {
        println!(
            "Missing metrics:        {}",
            report.quality.missing_metrics.join(", ").yellow()
        );
    }
    if !report.quality.sparse_metrics.is_empty() {
        let sparse: Vec<String> = report
            .quality
            .sparse_metrics
            .iter()
            .map(|s| format!("{} ({} points)", s.metric, s.points))
            .collect();
        println!("Sparse metrics:         {}", sparse.join(", ").yellow());
    }
    if !report.quality.gaps.is_empty() {
        println!(
            "Lost windows:           {}",
            report.quality.gaps.len().to_string().yellow()
        );
    }
    println!();

    println!("{}", "Usage Pattern".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Idle:                   {}",
        format_percent(report.activity.idle_percentage).bold()
    );
    println!(
        "Active:                 {}",
        format_percent(report.active_percentage)
    );
    println!(
        "Points:                 {} total, {} active, {} idle",
        report.activity.total_points, report.activity.active_points, report.activity.idle_points
    );

    if report.activity.total_points > 0 {
        let rows: Vec<BreakdownRow> = report
            .activity
            .breakdown
            .iter()
            .map(|m| BreakdownRow {
                metric: m.metric.clone(),
                triggered: m.triggered,
                share: format_percent(
                    m.triggered as f64 / report.activity.total_points as f64 * 100.0,
                ),
            })
            .collect();
        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{}", table);
    }
    println!();

    println!("{}", "Monthly Costs".bold());
    println!("{}", "-".repeat(50));
    let currency = &report.rpu_price.currency;
    println!(
        "Provisioned baseline:   {} ({}/h per node, {})",
        format_currency(report.projection.baseline_monthly_cost, &report.instance_price.currency),
        report.instance_price.value,
        price_source_label(report.instance_price.source)
    );
    println!(
        "Serverless capacity:    {} RPU ({}/h per RPU, {})",
        report.projection.required_rpu,
        report.rpu_price.value,
        price_source_label(report.rpu_price.source)
    );
    println!(
        "Serverless estimate:    {}",
        format_currency(report.projection.serverless_monthly_cost, currency)
    );

    let savings = format!(
        "{} ({})",
        format_currency(report.projection.potential_savings, currency),
        format_percent(report.projection.savings_percentage)
    );
    if report.projection.potential_savings >= 0.0 {
        println!("{}      {}", "Potential savings:".bold(), savings.green().bold());
    } else {
        println!("{}      {}", "Potential savings:".bold(), savings.red());
    }
    println!(
        "Break-even usage:       {}",
        format_percent(report.projection.break_even_usage_percentage)
    );
    println!();

    println!(
        "{} {}",
        "Recommendation:".bold(),
        color_recommendation(report.recommendation)
    );

    for warning in &report.warnings {
        print_warning(warning);
    }

    if !report.quality.is_sufficient {
        print_warning("metric data is insufficient for a reliable verdict; try a longer analysis window");
    } else if report.quality.completeness_percentage < 80.0 {
        print_warning(&format!(
            "data completeness is low ({}); consider a longer analysis window",
            format_percent(report.quality.completeness_percentage)
        ));
    }
}
