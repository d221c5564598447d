//! Cost projection: provisioned baseline versus serverless consumption
//!
//! The serverless model bills RPU-hours only while the cluster is active, so
//! the projection scales the monthly RPU cost by the observed active
//! percentage. Capacity sizing maps every node type onto ra3.xlplus
//! equivalents; one RPU covers half an equivalent, and workgroups allocate
//! in steps of 8 RPU.

use crate::models::{ClusterProfile, CostProjection};
use tracing::debug;

/// Billing month used by the projection
pub const HOURS_PER_MONTH: f64 = 24.0 * 30.0;

/// ra3.xlplus capacity covered by one RPU
const XLPLUS_PER_RPU: f64 = 0.5;

/// RPU allocation granularity and floor
const RPU_STEP: u32 = 8;

/// ra3.xlplus-equivalent capacity factors per node type
const XLPLUS_EQUIVALENTS: &[(&str, f64)] = &[
    ("dc2.large", 0.25),
    ("dc2.8xlarge", 4.0),
    ("ra3.large", 0.5),
    ("ra3.xlplus", 1.0),
    ("ra3.4xlarge", 4.0),
    ("ra3.16xlarge", 16.0),
];

/// Capacity factor for a node type; None when the type is unknown
pub fn xlplus_equivalent(node_type: &str) -> Option<f64> {
    XLPLUS_EQUIVALENTS
        .iter()
        .find(|(t, _)| *t == node_type)
        .map(|(_, factor)| *factor)
}

/// RPU capacity a serverless workgroup needs to replace the cluster.
///
/// Always a positive multiple of 8, minimum 8. Unknown node types are sized
/// as one ra3.xlplus each.
pub fn required_rpu(node_type: &str, node_count: u32) -> u32 {
    let equivalents = xlplus_equivalent(node_type).unwrap_or(1.0) * node_count as f64;
    let raw_rpu = equivalents / XLPLUS_PER_RPU;
    let steps = (raw_rpu / RPU_STEP as f64).ceil() as u32;
    steps.max(1) * RPU_STEP
}

/// Build the cost projection from the cluster profile, resolved hourly
/// prices, and the observed idle percentage.
pub fn project_costs(
    profile: &ClusterProfile,
    instance_hourly_price: f64,
    rpu_hourly_price: f64,
    idle_percentage: f64,
) -> CostProjection {
    let baseline_monthly_cost =
        instance_hourly_price * profile.node_count as f64 * HOURS_PER_MONTH;

    let required_rpu = required_rpu(&profile.node_type, profile.node_count);
    let active_percentage = 100.0 - idle_percentage;

    let serverless_hourly_cost = required_rpu as f64 * rpu_hourly_price;
    let serverless_monthly_cost =
        serverless_hourly_cost * HOURS_PER_MONTH * (active_percentage / 100.0);

    let potential_savings = baseline_monthly_cost - serverless_monthly_cost;
    let savings_percentage = if baseline_monthly_cost > 0.0 {
        potential_savings / baseline_monthly_cost * 100.0
    } else {
        0.0
    };

    let always_on_serverless_cost = serverless_hourly_cost * HOURS_PER_MONTH;
    let break_even_usage_percentage = if always_on_serverless_cost > 0.0 {
        baseline_monthly_cost / always_on_serverless_cost * 100.0
    } else {
        0.0
    };

    debug!(
        baseline_monthly_cost,
        required_rpu,
        serverless_monthly_cost,
        potential_savings,
        "cost projection complete"
    );

    CostProjection {
        baseline_monthly_cost,
        required_rpu,
        serverless_monthly_cost,
        potential_savings,
        savings_percentage,
        break_even_usage_percentage,
    }
}
