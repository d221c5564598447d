//! End-to-end analysis pipeline
//!
//! One invocation owns its whole world: collect the metric series, audit
//! completeness, align and classify the timeline, resolve prices, project
//! costs. Nothing is shared across runs and nothing is persisted.

use crate::activity::{ActivityClassifier, ActivitySummary, ACTIVITY_METRICS};
use crate::collector::{CollectorConfig, SeriesCollector};
use crate::cost::{project_costs, xlplus_equivalent};
use crate::error::Result;
use crate::models::{ClusterProfile, CostProjection, PriceQuote, Recommendation};
use crate::pricing::PricingResolver;
use crate::quality::{self, DataQualityReport};
use crate::source::{MetricSource, PricingCatalog};
use crate::timeline::Timeline;
use crate::validate::AnalysisRequest;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// The analyzed time span
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Structured result of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub cluster_id: String,
    pub region: String,
    pub days: u32,
    pub window: AnalysisWindow,
    pub profile: ClusterProfile,
    pub activity: ActivitySummary,
    pub active_percentage: f64,
    pub quality: DataQualityReport,
    pub instance_price: PriceQuote,
    pub rpu_price: PriceQuote,
    pub projection: CostProjection,
    pub recommendation: Recommendation,
    /// Non-fatal observations surfaced to the caller
    pub warnings: Vec<String>,
}

/// Runs the sequential analysis pipeline against injected sources
pub struct Analyzer {
    source: Arc<dyn MetricSource>,
    resolver: PricingResolver,
    collector_config: CollectorConfig,
}

impl Analyzer {
    pub fn new(source: Arc<dyn MetricSource>, catalog: Arc<dyn PricingCatalog>) -> Self {
        Self {
            source,
            resolver: PricingResolver::new(catalog),
            collector_config: CollectorConfig::default(),
        }
    }

    /// Override collector tuning (attempt ceilings, backoff)
    pub fn with_collector_config(mut self, config: CollectorConfig) -> Self {
        self.collector_config = config;
        self
    }

    /// Analyze the trailing `request.days` days ending now
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(request.days));
        self.run_window(request, start, end).await
    }

    /// Analyze an explicit window; exposed for deterministic callers
    pub async fn run_window(
        &self,
        request: &AnalysisRequest,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AnalysisReport> {
        let mut warnings = Vec::new();
        if !request.region_looks_valid() {
            warnings.push(format!(
                "region '{}' does not look like a known region code",
                request.region
            ));
        }

        let profile = self.source.get_cluster_profile(&request.cluster_id).await?;
        info!(
            cluster_id = %request.cluster_id,
            node_type = %profile.node_type,
            node_count = profile.node_count,
            status = %profile.status,
            "cluster profile resolved"
        );
        if profile.status != "available" {
            warnings.push(format!(
                "cluster status is '{}'; metric coverage may be incomplete",
                profile.status
            ));
        }
        if xlplus_equivalent(&profile.node_type).is_none() {
            warnings.push(format!(
                "unknown node type '{}'; sizing and pricing use the ra3.xlplus reference",
                profile.node_type
            ));
        }

        let collector = SeriesCollector::new(self.source.clone(), self.collector_config.clone());
        let collected = collector
            .collect(&request.cluster_id, &ACTIVITY_METRICS, start, end)
            .await?;
        info!(
            points = collected.total_points(),
            gaps = collected.gaps.len(),
            "metric collection complete"
        );

        let quality = quality::audit(&collected, self.collector_config.period_secs);

        let timeline = Timeline::build(collected.series.values());
        let activity = ActivityClassifier::with_default_rules().classify(&timeline, &collected.series);

        let instance_price = self
            .resolver
            .resolve_instance_price(&profile.node_type, &request.region)
            .await;
        let rpu_price = self.resolver.resolve_rpu_price(&request.region).await;
        if instance_price.currency != rpu_price.currency {
            warnings.push(format!(
                "instance and RPU quotes resolved in different currencies ({} vs {})",
                instance_price.currency, rpu_price.currency
            ));
        }

        let projection = project_costs(
            &profile,
            instance_price.value,
            rpu_price.value,
            activity.idle_percentage,
        );
        let recommendation = Recommendation::from_savings_percentage(projection.savings_percentage);

        info!(
            idle_percentage = activity.idle_percentage,
            savings_percentage = projection.savings_percentage,
            ?recommendation,
            "analysis complete"
        );

        Ok(AnalysisReport {
            cluster_id: request.cluster_id.clone(),
            region: request.region.clone(),
            days: request.days,
            window: AnalysisWindow { start, end },
            active_percentage: activity.active_percentage(),
            profile,
            activity,
            quality,
            instance_price,
            rpu_price,
            projection,
            recommendation,
            warnings,
        })
    }
}
