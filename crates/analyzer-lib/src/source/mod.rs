//! External data source interfaces
//!
//! The pipeline consumes two upstream services: a metric source holding
//! per-cluster time series and resource profiles, and a pricing catalog.
//! Both are behind traits so tests can substitute in-memory fakes and the
//! binary can wire HTTP-backed implementations.

mod http;

pub use http::{HttpMetricSource, HttpPricingCatalog};

use crate::error::Result;
use crate::models::{ClusterProfile, MetricPoint};
use crate::pricing::Partition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use async_trait::async_trait;

/// Source of cluster operational metrics and resource profiles
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch the averaged points of one metric over `[start, end)` at the
    /// given sampling period. Points may arrive unordered; callers sort.
    async fn get_series(
        &self,
        cluster_id: &str,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period_secs: u32,
    ) -> Result<Vec<MetricPoint>>;

    /// Fetch the sizing profile (node type, node count, status) of a cluster
    async fn get_cluster_profile(&self, cluster_id: &str) -> Result<ClusterProfile>;
}

/// One price entry returned by a catalog lookup, before selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCandidate {
    /// Billing unit, e.g. "Hrs" or "RPU-Hr"
    pub unit: String,
    /// Price per unit
    pub value: f64,
    /// ISO currency code
    pub currency: String,
    /// Payment option attribute; empty for most on-demand entries
    #[serde(default)]
    pub payment_option: String,
    /// Free-text description of the price dimension
    #[serde(default)]
    pub description: String,
}

/// Live pricing catalog, partitioned by regulatory boundary
#[async_trait]
pub trait PricingCatalog: Send + Sync {
    /// Query candidates for a location and product family, optionally
    /// narrowed by attribute filters such as `("instance_type", "ra3.xlplus")`.
    async fn lookup(
        &self,
        partition: Partition,
        location: &str,
        product_family: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<PriceCandidate>>;
}
