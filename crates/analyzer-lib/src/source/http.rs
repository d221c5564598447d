//! HTTP-backed implementations of the source traits
//!
//! Both clients speak plain JSON to a gateway endpoint. Transport and
//! protocol failures are mapped onto the analyzer error kinds here so the
//! rest of the pipeline never sees an HTTP status code.

use crate::error::{AnalyzerError, Result};
use crate::models::{ClusterProfile, MetricPoint};
use crate::pricing::Partition;
use crate::source::{async_trait, MetricSource, PriceCandidate, PricingCatalog};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Per-request timeout, matching the upstream gateway's own limit
const REQUEST_TIMEOUT_SECS: u64 = 30;

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| AnalyzerError::Transient {
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| AnalyzerError::Validation {
        field: "endpoint",
        reason: format!("{raw}: {e}"),
    })
}

/// Map an unsuccessful HTTP status onto an error kind
fn error_for_status(
    status: StatusCode,
    operation: &str,
    resource_id: &str,
    body: String,
) -> AnalyzerError {
    match status {
        StatusCode::UNAUTHORIZED => AnalyzerError::Auth(body),
        StatusCode::FORBIDDEN => AnalyzerError::Permission {
            action: operation.to_string(),
        },
        StatusCode::NOT_FOUND => AnalyzerError::NotFound {
            resource_id: resource_id.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => AnalyzerError::Throttled {
            operation: operation.to_string(),
        },
        s if s == StatusCode::REQUEST_TIMEOUT || s.is_server_error() => AnalyzerError::Transient {
            message: format!("{operation}: HTTP {s}: {body}"),
        },
        s => AnalyzerError::FatalApi {
            message: format!("{operation}: HTTP {s}: {body}"),
            attempts: 1,
        },
    }
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    query: &[(String, String)],
    operation: &str,
    resource_id: &str,
) -> Result<T> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| AnalyzerError::Transient {
            message: format!("{operation}: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_for_status(status, operation, resource_id, body));
    }

    response.json().await.map_err(|e| AnalyzerError::FatalApi {
        message: format!("{operation}: malformed response body: {e}"),
        attempts: 1,
    })
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    points: Vec<MetricPoint>,
}

/// Metric source talking to a metrics gateway over HTTP
pub struct HttpMetricSource {
    client: Client,
    base_url: Url,
}

impl HttpMetricSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: parse_endpoint(base_url)?,
        })
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn get_series(
        &self,
        cluster_id: &str,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period_secs: u32,
    ) -> Result<Vec<MetricPoint>> {
        let url = self
            .base_url
            .join(&format!("v1/clusters/{cluster_id}/metrics/{metric}"))
            .map_err(|e| AnalyzerError::Validation {
                field: "cluster_id",
                reason: e.to_string(),
            })?;
        let query = [
            ("start".to_string(), start.to_rfc3339()),
            ("end".to_string(), end.to_rfc3339()),
            ("period".to_string(), period_secs.to_string()),
        ];

        let response: SeriesResponse =
            get_json(&self.client, url, &query, "get_series", cluster_id).await?;
        Ok(response.points)
    }

    async fn get_cluster_profile(&self, cluster_id: &str) -> Result<ClusterProfile> {
        let url = self
            .base_url
            .join(&format!("v1/clusters/{cluster_id}"))
            .map_err(|e| AnalyzerError::Validation {
                field: "cluster_id",
                reason: e.to_string(),
            })?;

        get_json(&self.client, url, &[], "get_cluster_profile", cluster_id).await
    }
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<PriceCandidate>,
}

/// Pricing catalog client with one gateway endpoint per partition
pub struct HttpPricingCatalog {
    client: Client,
    standard_url: Url,
    china_url: Url,
}

impl HttpPricingCatalog {
    pub fn new(standard_url: &str, china_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            standard_url: parse_endpoint(standard_url)?,
            china_url: parse_endpoint(china_url)?,
        })
    }
}

#[async_trait]
impl PricingCatalog for HttpPricingCatalog {
    async fn lookup(
        &self,
        partition: Partition,
        location: &str,
        product_family: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<PriceCandidate>> {
        let base = match partition {
            Partition::China => &self.china_url,
            Partition::Standard => &self.standard_url,
        };
        let url = base.join("v1/products").map_err(|e| AnalyzerError::Validation {
            field: "endpoint",
            reason: e.to_string(),
        })?;

        let mut query = vec![
            ("location".to_string(), location.to_string()),
            ("family".to_string(), product_family.to_string()),
        ];
        query.extend_from_slice(filters);

        let response: ProductsResponse =
            get_json(&self.client, url, &query, "pricing_lookup", location).await?;
        Ok(response.products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_get_cluster_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/clusters/demo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"node_type":"ra3.xlplus","node_count":4,"status":"available"}"#)
            .create_async()
            .await;

        let source = HttpMetricSource::new(&server.url()).unwrap();
        let profile = source.get_cluster_profile("demo").await.unwrap();

        assert_eq!(profile.node_type, "ra3.xlplus");
        assert_eq!(profile.node_count, 4);
        assert_eq!(profile.status, "available");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_series_parses_points() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/clusters/demo/metrics/ReadIOPS")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"points":[{"timestamp":"2024-05-01T00:00:00Z","value":12.5},
                             {"timestamp":"2024-05-01T00:01:00Z","value":0.0}]}"#,
            )
            .create_async()
            .await;

        let source = HttpMetricSource::new(&server.url()).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let points = source
            .get_series("demo", "ReadIOPS", start, end, 60)
            .await
            .unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 12.5);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        for (status, check) in [
            (403, "permission"),
            (404, "not_found"),
            (429, "throttled"),
            (500, "transient"),
        ] {
            let _mock = server
                .mock("GET", "/v1/clusters/demo")
                .with_status(status)
                .create_async()
                .await;

            let source = HttpMetricSource::new(&server.url()).unwrap();
            let err = source.get_cluster_profile("demo").await.unwrap_err();
            match check {
                "permission" => assert!(matches!(err, AnalyzerError::Permission { .. })),
                "not_found" => assert!(matches!(err, AnalyzerError::NotFound { .. })),
                "throttled" => {
                    assert!(matches!(err, AnalyzerError::Throttled { .. }));
                    assert!(err.is_retryable());
                }
                "transient" => assert!(err.is_retryable()),
                _ => unreachable!(),
            }
        }
    }

    #[tokio::test]
    async fn test_pricing_lookup_routes_by_partition() {
        let mut standard = mockito::Server::new_async().await;
        let mut china = mockito::Server::new_async().await;

        let standard_mock = standard
            .mock("GET", "/v1/products")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"products":[{"unit":"RPU-Hr","value":0.375,"currency":"USD",
                    "payment_option":"","description":"Redshift Serverless usage"}]}"#,
            )
            .create_async()
            .await;
        let china_mock = china
            .mock("GET", "/v1/products")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"products":[]}"#)
            .create_async()
            .await;

        let catalog = HttpPricingCatalog::new(&standard.url(), &china.url()).unwrap();

        let products = catalog
            .lookup(Partition::Standard, "US East (N. Virginia)", "Serverless", &[])
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].unit, "RPU-Hr");

        let products = catalog
            .lookup(Partition::China, "China (Beijing)", "Serverless", &[])
            .await
            .unwrap();
        assert!(products.is_empty());

        standard_mock.assert_async().await;
        china_mock.assert_async().await;
    }
}
