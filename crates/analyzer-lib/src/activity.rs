//! Idle/active classification over the aligned timeline
//!
//! A timeline point is active when any configured rule fires for its metric
//! value at that instant. Only direct workload metrics participate; network
//! throughput is excluded because maintenance and monitoring traffic keep it
//! nonzero on otherwise idle clusters.

use crate::models::MetricSeries;
use crate::timeline::{value_at, Timeline};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Metrics consulted for the idle/active verdict
pub const ACTIVITY_METRICS: [&str; 3] = ["ReadIOPS", "WriteIOPS", "DatabaseConnections"];

/// One activity predicate: fires when the metric value exceeds the threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRule {
    pub metric: String,
    pub min_exclusive: f64,
}

impl ActivityRule {
    pub fn fires(&self, value: f64) -> bool {
        value > self.min_exclusive
    }
}

/// The default rule set: any nonzero reading on a workload metric counts
pub fn default_rules() -> Vec<ActivityRule> {
    ACTIVITY_METRICS
        .iter()
        .map(|metric| ActivityRule {
            metric: metric.to_string(),
            min_exclusive: 0.0,
        })
        .collect()
}

/// Per-metric trigger count, in rule order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricActivity {
    pub metric: String,
    pub triggered: u64,
}

/// Aggregate classification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub total_points: u64,
    pub active_points: u64,
    pub idle_points: u64,
    /// Percentage of points where no rule fired; 0 for an empty timeline
    pub idle_percentage: f64,
    pub breakdown: Vec<MetricActivity>,
    /// First and last timestamp of the analyzed timeline
    pub bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl ActivitySummary {
    pub fn active_percentage(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            100.0 - self.idle_percentage
        }
    }
}

/// Applies the rule set across the timeline
pub struct ActivityClassifier {
    rules: Vec<ActivityRule>,
}

impl ActivityClassifier {
    pub fn new(rules: Vec<ActivityRule>) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(default_rules())
    }

    /// Classify every timeline point. A point is active when at least one
    /// rule fires; metrics absent from the mapping never trigger.
    pub fn classify(
        &self,
        timeline: &Timeline,
        series: &BTreeMap<String, MetricSeries>,
    ) -> ActivitySummary {
        let mut triggered = vec![0u64; self.rules.len()];
        let mut active_points = 0u64;

        for timestamp in timeline.iter() {
            let mut is_active = false;
            for (i, rule) in self.rules.iter().enumerate() {
                let Some(metric_series) = series.get(&rule.metric) else {
                    continue;
                };
                if rule.fires(value_at(metric_series, timestamp)) {
                    is_active = true;
                    triggered[i] += 1;
                }
            }
            if is_active {
                active_points += 1;
            }
        }

        let total_points = timeline.len() as u64;
        let idle_points = total_points - active_points;
        let idle_percentage = if total_points == 0 {
            0.0
        } else {
            idle_points as f64 / total_points as f64 * 100.0
        };

        debug!(
            total_points,
            active_points, idle_points, idle_percentage, "classification complete"
        );

        ActivitySummary {
            total_points,
            active_points,
            idle_points,
            idle_percentage,
            breakdown: self
                .rules
                .iter()
                .zip(triggered)
                .map(|(rule, count)| MetricActivity {
                    metric: rule.metric.clone(),
                    triggered: count,
                })
                .collect(),
            bounds: timeline.bounds(),
        }
    }
}
