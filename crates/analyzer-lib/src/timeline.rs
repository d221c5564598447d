//! Timeline alignment across heterogeneous metric series
//!
//! Different metrics rarely publish on exactly the same instants. The
//! analysis timeline is the ascending, deduplicated union of every timestamp
//! seen across all collected series; per-metric values are then looked up
//! with a tolerance of one sampling period in either direction.

use crate::collector::SAMPLING_PERIOD_SECS;
use crate::models::MetricSeries;
use chrono::{DateTime, Duration, Utc};

/// Lookup tolerance, one sampling period in each direction
const TOLERANCE_MS: i64 = SAMPLING_PERIOD_SECS as i64 * 1000;

/// Ascending, distinct union of all timestamps across all series
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    timestamps: Vec<DateTime<Utc>>,
}

impl Timeline {
    /// Build the timeline from collected series. Empty input yields an
    /// empty timeline.
    pub fn build<'a, I>(series: I) -> Self
    where
        I: IntoIterator<Item = &'a MetricSeries>,
    {
        let mut timestamps: Vec<DateTime<Utc>> = series
            .into_iter()
            .flat_map(|s| s.iter().map(|p| p.timestamp))
            .collect();
        timestamps.sort_unstable();
        timestamps.dedup();
        Self { timestamps }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.timestamps.iter().copied()
    }

    /// First and last timestamp, None when empty
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }
}

/// Value of a series at a timestamp, within ± one sampling period.
///
/// When several points fall inside the tolerance window the earliest one
/// wins, keeping the result deterministic. Series with no qualifying point
/// contribute the defined default of 0.
pub fn value_at(series: &MetricSeries, target: DateTime<Utc>) -> f64 {
    let window_start = target - Duration::milliseconds(TOLERANCE_MS);
    let idx = series.partition_point(|p| p.timestamp < window_start);
    match series.get(idx) {
        Some(p) if (p.timestamp - target).num_milliseconds().abs() <= TOLERANCE_MS => p.value,
        _ => 0.0,
    }
}
