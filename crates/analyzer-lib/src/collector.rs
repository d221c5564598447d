//! Windowed metric series collection
//!
//! Fetches each requested metric over the analysis span in day-sized
//! sub-windows, so a 60-second sampling period stays under the upstream
//! per-call result cap. Throttled sub-windows are retried with bounded
//! exponential backoff; a sub-window that keeps throttling past the attempt
//! ceiling is recorded as a gap instead of failing the fetch. Transient
//! faults bubble up to an outer bounded retry around the whole per-metric
//! fetch; exhausting that one is fatal.

use crate::error::{AnalyzerError, Result};
use crate::models::{MetricPoint, MetricSeries};
use crate::source::MetricSource;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Fixed sampling period, aligned with the serverless billing granularity
pub const SAMPLING_PERIOD_SECS: u32 = 60;

/// Collector tuning knobs
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum span covered by a single upstream request
    pub window_span: Duration,
    /// Attempt ceiling for a throttled sub-window before it becomes a gap
    pub max_window_attempts: u32,
    /// Base backoff for throttled sub-windows, doubled per attempt
    pub window_backoff: std::time::Duration,
    /// Attempt ceiling for the whole per-metric fetch on transient faults
    pub max_fetch_attempts: u32,
    /// Sampling period requested from the metric source
    pub period_secs: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            window_span: Duration::days(1),
            max_window_attempts: 5,
            window_backoff: std::time::Duration::from_secs(2),
            max_fetch_attempts: 3,
            period_secs: SAMPLING_PERIOD_SECS,
        }
    }
}

/// A sub-window that still throttled after the attempt ceiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowGap {
    pub metric: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attempts: u32,
}

/// Everything retrieved for one analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedSeries {
    /// Per-metric series, strictly ascending, deduplicated across batches
    pub series: BTreeMap<String, MetricSeries>,
    /// Sub-windows lost to retry exhaustion
    pub gaps: Vec<WindowGap>,
}

impl CollectedSeries {
    /// Total point count across all metrics
    pub fn total_points(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

enum WindowFetch {
    Points(Vec<MetricPoint>),
    Gap { attempts: u32 },
}

/// Fetches metric series from an injected source
pub struct SeriesCollector {
    source: Arc<dyn MetricSource>,
    config: CollectorConfig,
}

impl SeriesCollector {
    pub fn new(source: Arc<dyn MetricSource>, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    /// Collect every named metric over `[start, end)`
    pub async fn collect(
        &self,
        cluster_id: &str,
        metrics: &[&str],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CollectedSeries> {
        let mut collected = CollectedSeries::default();

        for metric in metrics {
            let (points, gaps) = self
                .fetch_metric_with_retry(cluster_id, metric, start, end)
                .await?;
            debug!(
                metric,
                points = points.len(),
                gaps = gaps.len(),
                "metric fetch complete"
            );
            collected.gaps.extend(gaps);
            collected.series.insert(metric.to_string(), points);
        }

        Ok(collected)
    }

    /// Outer retry: absorbs transient non-throttling faults across the whole
    /// per-metric fetch. Exhaustion terminates the analysis.
    async fn fetch_metric_with_retry(
        &self,
        cluster_id: &str,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(MetricSeries, Vec<WindowGap>)> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_metric(cluster_id, metric, start, end).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    if attempt >= self.config.max_fetch_attempts {
                        return Err(e.into_fatal(attempt));
                    }
                    let backoff = std::time::Duration::from_secs(1u64 << attempt);
                    warn!(
                        metric,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        error = %e,
                        "metric fetch failed, retrying"
                    );
                    sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_metric(
        &self,
        cluster_id: &str,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(MetricSeries, Vec<WindowGap>)> {
        let mut all_points: Vec<MetricPoint> = Vec::new();
        let mut gaps = Vec::new();
        let mut cursor = start;

        while cursor < end {
            let window_end = std::cmp::min(cursor + self.config.window_span, end);

            match self
                .fetch_window(cluster_id, metric, cursor, window_end)
                .await?
            {
                WindowFetch::Points(points) => {
                    debug!(
                        metric,
                        window_start = %cursor,
                        window_end = %window_end,
                        points = points.len(),
                        "sub-window fetched"
                    );
                    all_points.extend(points);
                }
                WindowFetch::Gap { attempts } => {
                    warn!(
                        metric,
                        window_start = %cursor,
                        window_end = %window_end,
                        attempts,
                        "sub-window abandoned after throttle retries"
                    );
                    gaps.push(WindowGap {
                        metric: metric.to_string(),
                        start: cursor,
                        end: window_end,
                        attempts,
                    });
                }
            }

            cursor = window_end;
        }

        all_points.sort_by_key(|p| p.timestamp);
        all_points.dedup_by_key(|p| p.timestamp);
        Ok((all_points, gaps))
    }

    /// Inner retry: throttling only. Exhaustion turns the window into a gap.
    async fn fetch_window(
        &self,
        cluster_id: &str,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WindowFetch> {
        let mut attempt: u32 = 0;
        loop {
            match self
                .source
                .get_series(cluster_id, metric, start, end, self.config.period_secs)
                .await
            {
                Ok(points) => return Ok(WindowFetch::Points(points)),
                Err(AnalyzerError::Throttled { .. }) => {
                    attempt += 1;
                    if attempt >= self.config.max_window_attempts {
                        return Ok(WindowFetch::Gap { attempts: attempt });
                    }
                    let backoff = self.config.window_backoff * (1u32 << (attempt - 1));
                    debug!(
                        metric,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        "throttled, backing off"
                    );
                    sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn ts(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(min)
    }

    /// Source that replies to each window with one point at the window start,
    /// optionally failing according to a script keyed by call index.
    struct ScriptedSource {
        calls: AtomicU32,
        script: Mutex<Vec<Option<AnalyzerError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Option<AnalyzerError>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                script: Mutex::new(script),
            }
        }

        fn succeeding() -> Self {
            Self::new(Vec::new())
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricSource for ScriptedSource {
        async fn get_series(
            &self,
            _cluster_id: &str,
            _metric: &str,
            start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _period_secs: u32,
        ) -> Result<Vec<MetricPoint>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let mut script = self.script.lock().unwrap();
            if call < script.len() {
                if let Some(err) = script[call].take() {
                    return Err(err);
                }
            }
            Ok(vec![MetricPoint {
                timestamp: start,
                value: 1.0,
            }])
        }

        async fn get_cluster_profile(&self, _cluster_id: &str) -> Result<crate::models::ClusterProfile> {
            unimplemented!("not used by the collector")
        }
    }

    fn throttled() -> Option<AnalyzerError> {
        Some(AnalyzerError::Throttled {
            operation: "get_series".into(),
        })
    }

    fn transient() -> Option<AnalyzerError> {
        Some(AnalyzerError::Transient {
            message: "connection reset".into(),
        })
    }

    #[tokio::test]
    async fn test_splits_span_into_day_windows() {
        let source = Arc::new(ScriptedSource::succeeding());
        let collector = SeriesCollector::new(source.clone(), CollectorConfig::default());

        let collected = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(3 * 24 * 60))
            .await
            .unwrap();

        assert_eq!(source.call_count(), 3);
        assert_eq!(collected.series["ReadIOPS"].len(), 3);
        assert!(collected.gaps.is_empty());
    }

    #[tokio::test]
    async fn test_series_sorted_and_deduplicated() {
        struct OverlappingSource;

        #[async_trait]
        impl MetricSource for OverlappingSource {
            async fn get_series(
                &self,
                _cluster_id: &str,
                _metric: &str,
                _start: DateTime<Utc>,
                _end: DateTime<Utc>,
                _period_secs: u32,
            ) -> Result<Vec<MetricPoint>> {
                // Unordered, with one timestamp repeated across batches
                Ok(vec![
                    MetricPoint {
                        timestamp: ts(2),
                        value: 3.0,
                    },
                    MetricPoint {
                        timestamp: ts(0),
                        value: 1.0,
                    },
                    MetricPoint {
                        timestamp: ts(2),
                        value: 3.0,
                    },
                ])
            }

            async fn get_cluster_profile(
                &self,
                _cluster_id: &str,
            ) -> Result<crate::models::ClusterProfile> {
                unimplemented!()
            }
        }

        let collector =
            SeriesCollector::new(Arc::new(OverlappingSource), CollectorConfig::default());
        let collected = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(60))
            .await
            .unwrap();

        let series = &collected.series["ReadIOPS"];
        assert_eq!(series.len(), 2);
        assert!(series[0].timestamp < series[1].timestamp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_window_retried_then_succeeds() {
        let source = Arc::new(ScriptedSource::new(vec![throttled(), throttled()]));
        let collector = SeriesCollector::new(source.clone(), CollectorConfig::default());

        let collected = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(60))
            .await
            .unwrap();

        assert_eq!(source.call_count(), 3);
        assert_eq!(collected.series["ReadIOPS"].len(), 1);
        assert!(collected.gaps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_exhaustion_becomes_gap_not_error() {
        // First window throttles forever; second window succeeds
        let script: Vec<Option<AnalyzerError>> = (0..5).map(|_| throttled()).collect();
        let source = Arc::new(ScriptedSource::new(script));
        let collector = SeriesCollector::new(source.clone(), CollectorConfig::default());

        let collected = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(2 * 24 * 60))
            .await
            .unwrap();

        assert_eq!(collected.gaps.len(), 1);
        assert_eq!(collected.gaps[0].metric, "ReadIOPS");
        assert_eq!(collected.gaps[0].attempts, 5);
        // Second window still contributed its point
        assert_eq!(collected.series["ReadIOPS"].len(), 1);
    }

    #[tokio::test]
    async fn test_permission_error_propagates_immediately() {
        let source = Arc::new(ScriptedSource::new(vec![Some(AnalyzerError::Permission {
            action: "get_series".into(),
        })]));
        let collector = SeriesCollector::new(source.clone(), CollectorConfig::default());

        let err = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(60))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzerError::Permission { .. }));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_fault_absorbed_by_outer_retry() {
        let source = Arc::new(ScriptedSource::new(vec![transient(), transient()]));
        let collector = SeriesCollector::new(source.clone(), CollectorConfig::default());

        let collected = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(60))
            .await
            .unwrap();

        assert_eq!(source.call_count(), 3);
        assert_eq!(collected.series["ReadIOPS"].len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhaustion_is_fatal() {
        let script: Vec<Option<AnalyzerError>> = (0..3).map(|_| transient()).collect();
        let source = Arc::new(ScriptedSource::new(script));
        let collector = SeriesCollector::new(source, CollectorConfig::default());

        let err = collector
            .collect("demo", &["ReadIOPS"], ts(0), ts(60))
            .await
            .unwrap_err();

        match err {
            AnalyzerError::FatalApi { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected FatalApi, got {other:?}"),
        }
    }
}
