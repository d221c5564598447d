//! Price resolution for provisioned nodes and serverless RPU capacity
//!
//! Quotes resolve through a cascade: the live pricing catalog first, then a
//! static per-partition fallback table, then a global default. The resolver
//! never fails an analysis over pricing; a failed or empty catalog lookup is
//! logged and the cascade continues.

use crate::models::{PriceQuote, PriceSource};
use crate::source::{async_trait, PriceCandidate, PricingCatalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Regulatory partition a region belongs to, decided by prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Standard,
    China,
}

impl Partition {
    pub fn from_region(region: &str) -> Self {
        if region.starts_with("cn-") {
            Partition::China
        } else {
            Partition::Standard
        }
    }

    /// Currency used by fallback quotes in this partition
    pub fn currency(&self) -> &'static str {
        match self {
            Partition::China => "CNY",
            Partition::Standard => "USD",
        }
    }
}

/// Billing unit of serverless capacity entries
const RPU_UNIT: &str = "RPU-Hr";
/// Billing unit of provisioned instance entries
const INSTANCE_UNIT: &str = "Hrs";

/// Product family names understood by the catalog
const SERVERLESS_FAMILY: &str = "Serverless";
const INSTANCE_FAMILY: &str = "Compute Instance";

/// Node type every unknown type is priced and sized against
pub const REFERENCE_NODE_TYPE: &str = "ra3.xlplus";

/// Catalog location names for known region codes; unknown codes pass through
pub fn location_for_region(region: &str) -> &str {
    match region {
        "us-east-1" => "US East (N. Virginia)",
        "us-west-2" => "US West (Oregon)",
        "eu-west-1" => "Europe (Ireland)",
        "ap-southeast-1" => "Asia Pacific (Singapore)",
        "cn-north-1" => "China (Beijing)",
        "cn-northwest-1" => "China (Ningxia)",
        other => other,
    }
}

/// Per-region serverless fallback prices
const RPU_FALLBACK: &[(&str, f64, &str)] = &[
    ("cn-north-1", 2.692, "CNY"),
    ("cn-northwest-1", 2.093, "CNY"),
    ("us-east-1", 0.375, "USD"),
    ("us-west-2", 0.375, "USD"),
    ("eu-west-1", 0.375, "USD"),
    ("ap-southeast-1", 0.45, "USD"),
];

/// Global default when the region is unknown entirely
const DEFAULT_RPU_PRICE: f64 = 0.375;
const DEFAULT_RPU_CURRENCY: &str = "USD";

/// Hourly instance prices, China partition (CNY)
const CHINA_INSTANCE_FALLBACK: &[(&str, f64)] = &[
    ("dc2.large", 2.145),
    ("dc2.8xlarge", 41.60),
    ("ra3.large", 3.475),
    ("ra3.xlplus", 6.950),
    ("ra3.4xlarge", 20.864),
    ("ra3.16xlarge", 83.456),
];

/// Hourly instance prices, standard partition (USD)
const STANDARD_INSTANCE_FALLBACK: &[(&str, f64)] = &[
    ("dc2.large", 0.25),
    ("dc2.8xlarge", 4.80),
    ("ra3.large", 0.48),
    ("ra3.xlplus", 1.086),
    ("ra3.4xlarge", 3.26),
    ("ra3.16xlarge", 13.04),
];

/// Whether a catalog entry represents on-demand pricing.
///
/// On-demand entries either carry no payment option, say so explicitly, or
/// describe metered usage without reservation or commitment wording.
pub fn is_on_demand(candidate: &PriceCandidate) -> bool {
    if candidate.payment_option.is_empty() || candidate.payment_option == "On Demand" {
        return true;
    }
    let description = candidate.description.to_lowercase();
    description.contains("usage")
        && !description.contains("reserv")
        && !description.contains("commit")
}

fn select_candidate<'a>(
    candidates: &'a [PriceCandidate],
    unit: &str,
) -> Option<&'a PriceCandidate> {
    candidates
        .iter()
        .find(|c| c.unit == unit && c.value > 0.0 && is_on_demand(c))
}

/// Catalog used when no pricing endpoint is configured. Every lookup comes
/// back empty, so all quotes resolve from the static tables.
pub struct OfflineCatalog;

#[async_trait]
impl PricingCatalog for OfflineCatalog {
    async fn lookup(
        &self,
        _partition: Partition,
        _location: &str,
        _product_family: &str,
        _filters: &[(String, String)],
    ) -> crate::error::Result<Vec<PriceCandidate>> {
        Ok(Vec::new())
    }
}

/// Resolves hourly prices through the catalog → fallback → default cascade
pub struct PricingResolver {
    catalog: Arc<dyn PricingCatalog>,
}

impl PricingResolver {
    pub fn new(catalog: Arc<dyn PricingCatalog>) -> Self {
        Self { catalog }
    }

    /// Hourly price of one RPU of serverless capacity in a region
    pub async fn resolve_rpu_price(&self, region: &str) -> PriceQuote {
        let partition = Partition::from_region(region);
        match self
            .catalog
            .lookup(partition, location_for_region(region), SERVERLESS_FAMILY, &[])
            .await
        {
            Ok(candidates) => {
                if let Some(c) = select_candidate(&candidates, RPU_UNIT) {
                    return PriceQuote {
                        value: c.value,
                        currency: c.currency.clone(),
                        source: PriceSource::Catalog,
                    };
                }
                debug!(region, "no qualifying serverless catalog entry");
            }
            Err(e) => warn!(region, error = %e, "serverless catalog lookup failed"),
        }
        Self::rpu_fallback(region)
    }

    fn rpu_fallback(region: &str) -> PriceQuote {
        match RPU_FALLBACK.iter().find(|(r, _, _)| *r == region) {
            Some((_, value, currency)) => PriceQuote {
                value: *value,
                currency: currency.to_string(),
                source: PriceSource::Fallback,
            },
            None => PriceQuote {
                value: DEFAULT_RPU_PRICE,
                currency: DEFAULT_RPU_CURRENCY.to_string(),
                source: PriceSource::Default,
            },
        }
    }

    /// Hourly price of one provisioned node of the given type in a region
    pub async fn resolve_instance_price(&self, node_type: &str, region: &str) -> PriceQuote {
        let partition = Partition::from_region(region);
        let filters = [("instance_type".to_string(), node_type.to_string())];
        match self
            .catalog
            .lookup(
                partition,
                location_for_region(region),
                INSTANCE_FAMILY,
                &filters,
            )
            .await
        {
            Ok(candidates) => {
                if let Some(c) = select_candidate(&candidates, INSTANCE_UNIT) {
                    return PriceQuote {
                        value: c.value,
                        currency: c.currency.clone(),
                        source: PriceSource::Catalog,
                    };
                }
                debug!(region, node_type, "no qualifying instance catalog entry");
            }
            Err(e) => warn!(region, node_type, error = %e, "instance catalog lookup failed"),
        }
        Self::instance_fallback(node_type, partition)
    }

    fn instance_fallback(node_type: &str, partition: Partition) -> PriceQuote {
        let table = match partition {
            Partition::China => CHINA_INSTANCE_FALLBACK,
            Partition::Standard => STANDARD_INSTANCE_FALLBACK,
        };
        let value = table
            .iter()
            .find(|(t, _)| *t == node_type)
            .or_else(|| table.iter().find(|(t, _)| *t == REFERENCE_NODE_TYPE))
            .map(|(_, v)| *v)
            .unwrap_or(DEFAULT_RPU_PRICE);
        PriceQuote {
            value,
            currency: partition.currency().to_string(),
            source: PriceSource::Fallback,
        }
    }
}
