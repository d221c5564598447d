//! Data quality audit for a collected timeline
//!
//! Completeness compares the points actually retrieved against the density
//! expected from the observed span at the sampling period. Low completeness
//! never aborts an analysis; the caller decides what to do with it.

use crate::collector::{CollectedSeries, WindowGap};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metrics with fewer points than this are flagged as sparse
const SPARSE_THRESHOLD: usize = 10;

/// A metric that returned suspiciously few points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseMetric {
    pub metric: String,
    pub points: usize,
}

/// Quality report for one collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_points: u64,
    pub expected_points: u64,
    /// Retrieved ÷ expected × 100; 0 when nothing was expected
    pub completeness_percentage: f64,
    /// Metrics that returned no points at all
    pub missing_metrics: Vec<String>,
    pub sparse_metrics: Vec<SparseMetric>,
    /// Sub-windows lost to throttle-retry exhaustion
    pub gaps: Vec<WindowGap>,
    /// Whether the data can support a meaningful verdict
    pub is_sufficient: bool,
}

/// Audit the collected series against the expected sampling density
pub fn audit(collected: &CollectedSeries, period_secs: u32) -> DataQualityReport {
    let total_points = collected.total_points() as u64;

    let mut missing_metrics = Vec::new();
    let mut sparse_metrics = Vec::new();
    for (metric, series) in &collected.series {
        if series.is_empty() {
            missing_metrics.push(metric.clone());
        } else if series.len() < SPARSE_THRESHOLD {
            sparse_metrics.push(SparseMetric {
                metric: metric.clone(),
                points: series.len(),
            });
        }
    }

    // Expected density derives from the observed span of the first metric
    // that returned data, applied uniformly across all requested metrics.
    let expected_points = collected
        .series
        .values()
        .find(|s| !s.is_empty())
        .map(|series| {
            let span_secs = (series[series.len() - 1].timestamp - series[0].timestamp)
                .num_seconds()
                .max(0) as u64;
            let per_metric = span_secs / period_secs as u64 + 1;
            per_metric * collected.series.len() as u64
        })
        .unwrap_or(0);

    let completeness_percentage = if expected_points > 0 {
        total_points as f64 / expected_points as f64 * 100.0
    } else {
        0.0
    };

    let is_sufficient = total_points > 0 && missing_metrics.len() < collected.series.len();

    debug!(
        total_points,
        expected_points, completeness_percentage, "data quality audit complete"
    );

    DataQualityReport {
        total_points,
        expected_points,
        completeness_percentage,
        missing_metrics,
        sparse_metrics,
        gaps: collected.gaps.clone(),
        is_sufficient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricPoint, MetricSeries};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn ts(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(min)
    }

    fn full_series(minutes: i64) -> MetricSeries {
        (0..=minutes)
            .map(|m| MetricPoint {
                timestamp: ts(m),
                value: 1.0,
            })
            .collect()
    }

    fn collected(entries: Vec<(&str, MetricSeries)>) -> CollectedSeries {
        CollectedSeries {
            series: entries
                .into_iter()
                .map(|(name, s)| (name.to_string(), s))
                .collect::<BTreeMap<_, _>>(),
            gaps: Vec::new(),
        }
    }

    #[test]
    fn test_complete_data_is_one_hundred_percent() {
        let data = collected(vec![
            ("ReadIOPS", full_series(59)),
            ("WriteIOPS", full_series(59)),
        ]);
        let report = audit(&data, 60);

        assert_eq!(report.total_points, 120);
        assert_eq!(report.expected_points, 120);
        assert!((report.completeness_percentage - 100.0).abs() < 1e-9);
        assert!(report.is_sufficient);
        assert!(report.missing_metrics.is_empty());
    }

    #[test]
    fn test_missing_metric_detected() {
        let data = collected(vec![
            ("ReadIOPS", full_series(59)),
            ("WriteIOPS", Vec::new()),
        ]);
        let report = audit(&data, 60);

        assert_eq!(report.missing_metrics, vec!["WriteIOPS".to_string()]);
        assert!(report.completeness_percentage < 100.0);
        assert!(report.is_sufficient);
    }

    #[test]
    fn test_sparse_metric_detected() {
        let data = collected(vec![
            ("ReadIOPS", full_series(59)),
            ("WriteIOPS", full_series(3)),
        ]);
        let report = audit(&data, 60);

        assert_eq!(report.sparse_metrics.len(), 1);
        assert_eq!(report.sparse_metrics[0].metric, "WriteIOPS");
        assert_eq!(report.sparse_metrics[0].points, 4);
    }

    #[test]
    fn test_empty_collection_is_insufficient_not_nan() {
        let data = collected(vec![("ReadIOPS", Vec::new()), ("WriteIOPS", Vec::new())]);
        let report = audit(&data, 60);

        assert_eq!(report.total_points, 0);
        assert_eq!(report.expected_points, 0);
        assert_eq!(report.completeness_percentage, 0.0);
        assert!(!report.is_sufficient);
    }

    #[test]
    fn test_gaps_carried_into_report() {
        let mut data = collected(vec![("ReadIOPS", full_series(10))]);
        data.gaps.push(WindowGap {
            metric: "ReadIOPS".to_string(),
            start: ts(0),
            end: ts(1440),
            attempts: 5,
        });
        let report = audit(&data, 60);

        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].attempts, 5);
    }
}
