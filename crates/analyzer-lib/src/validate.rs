//! Input validation for analysis requests

use crate::error::{AnalyzerError, Result};

/// Maximum cluster identifier length accepted by the resource API
const MAX_CLUSTER_ID_LEN: usize = 63;

/// Longest analysis window the metric source retains at full resolution
pub const MAX_ANALYSIS_DAYS: u32 = 30;

/// Region codes known to be valid; anything else only triggers a warning
const KNOWN_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "cn-north-1",
    "cn-northwest-1",
    "ca-central-1",
    "sa-east-1",
];

/// Validated analysis request
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub cluster_id: String,
    pub region: String,
    pub days: u32,
}

impl AnalysisRequest {
    /// Validate raw caller inputs into a request.
    ///
    /// Returns `Validation` errors for a cluster id outside 1-63 characters,
    /// an empty region, or a day count outside 1-30.
    pub fn new(cluster_id: &str, region: &str, days: u32) -> Result<Self> {
        let cluster_id = cluster_id.trim();
        if cluster_id.is_empty() {
            return Err(AnalyzerError::Validation {
                field: "cluster_id",
                reason: "must not be empty".into(),
            });
        }
        if cluster_id.len() > MAX_CLUSTER_ID_LEN {
            return Err(AnalyzerError::Validation {
                field: "cluster_id",
                reason: format!(
                    "must be at most {MAX_CLUSTER_ID_LEN} characters, got {}",
                    cluster_id.len()
                ),
            });
        }

        let region = region.trim();
        if region.is_empty() {
            return Err(AnalyzerError::Validation {
                field: "region",
                reason: "must not be empty".into(),
            });
        }

        if days == 0 {
            return Err(AnalyzerError::Validation {
                field: "days",
                reason: "must be at least 1".into(),
            });
        }
        if days > MAX_ANALYSIS_DAYS {
            return Err(AnalyzerError::Validation {
                field: "days",
                reason: format!(
                    "must be at most {MAX_ANALYSIS_DAYS} (metric retention limit), got {days}"
                ),
            });
        }

        Ok(Self {
            cluster_id: cluster_id.to_string(),
            region: region.to_string(),
            days,
        })
    }

    /// Whether the region looks like a real region code.
    ///
    /// Unknown regions are allowed through (private partitions exist), so a
    /// failed check surfaces as a report warning rather than an error.
    pub fn region_looks_valid(&self) -> bool {
        if KNOWN_REGIONS.contains(&self.region.as_str()) {
            return true;
        }
        let segments: Vec<&str> = self.region.split('-').collect();
        segments.len() >= 3
            && segments
                .iter()
                .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}
