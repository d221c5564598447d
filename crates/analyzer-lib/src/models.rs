//! Core data models for the idle analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of one named metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Ordered sequence of points for one metric, strictly ascending by
/// timestamp with no duplicates. Built by the collector; read-only after.
pub type MetricSeries = Vec<MetricPoint>;

/// Cluster sizing profile as reported by the resource API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub node_type: String,
    pub node_count: u32,
    pub status: String,
}

/// Where a resolved price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Live pricing catalog
    Catalog,
    /// Static per-partition fallback table
    Fallback,
    /// Global default when the region is unknown entirely
    Default,
}

/// A resolved hourly price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub value: f64,
    pub currency: String,
    pub source: PriceSource,
}

/// Cost projection comparing always-on billing against serverless billing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostProjection {
    /// Monthly cost of the provisioned cluster at its current size
    pub baseline_monthly_cost: f64,
    /// RPU capacity a serverless workgroup would need for this cluster
    pub required_rpu: u32,
    /// Projected monthly serverless cost at the observed active percentage
    pub serverless_monthly_cost: f64,
    /// Baseline minus serverless; negative when serverless costs more
    pub potential_savings: f64,
    /// Savings as a percentage of the baseline, 0 when the baseline is 0
    pub savings_percentage: f64,
    /// Active-time percentage at which both billing models cost the same
    pub break_even_usage_percentage: f64,
}

/// Migration verdict derived from the projected savings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Savings above 10%: migration is clearly worthwhile
    Migrate,
    /// Positive but modest savings: worth evaluating
    Consider,
    /// Serverless would cost the same or more at this usage level
    Keep,
}

impl Recommendation {
    /// Derive the verdict from a savings percentage
    pub fn from_savings_percentage(savings_percentage: f64) -> Self {
        if savings_percentage > 10.0 {
            Recommendation::Migrate
        } else if savings_percentage > 0.0 {
            Recommendation::Consider
        } else {
            Recommendation::Keep
        }
    }
}
