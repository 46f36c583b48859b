//! Search Console search-analytics fetch adapter.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use searchdeck_core::analytics::{QueryStats, SearchAnalyticsSource};
use searchdeck_core::timerange::ResolvedRange;

/// HTTP client for the Search Console search-analytics endpoint.
///
/// One outbound `searchAnalytics/query` call per resolved window,
/// dimensioned by query text only. Token acquisition and refresh are the
/// caller's concern; this client sends whatever bearer token it was
/// configured with and surfaces upstream rejections as errors.
#[derive(Clone)]
pub struct SearchConsoleClient {
    client: Client,
    endpoint: String,
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsQueryRequest {
    start_date: String,
    end_date: String,
    dimensions: [&'static str; 1],
    row_limit: u32,
}

#[derive(Debug, Deserialize)]
struct AnalyticsQueryResponse {
    #[serde(default)]
    rows: Vec<ApiRow>,
}

#[derive(Debug, Deserialize)]
struct ApiRow {
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    clicks: f64,
    #[serde(default)]
    impressions: f64,
    #[serde(default)]
    ctr: f64,
    #[serde(default)]
    position: f64,
}

/// Normalise one API row to the canonical shape. Missing fields default to
/// empty/zero rather than failing the whole response.
fn normalise(row: ApiRow) -> QueryStats {
    QueryStats {
        query: row.keys.into_iter().next().unwrap_or_default(),
        clicks: row.clicks.max(0.0) as u64,
        impressions: row.impressions.max(0.0) as u64,
        ctr: row.ctr,
        position: row.position,
    }
}

impl SearchConsoleClient {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn query_url(&self, property: &str) -> String {
        // Site URLs carry `:` and `/` (e.g. `sc-domain:example.com`,
        // `https://example.com/`) and must be encoded as one path segment.
        let encoded: String = url::form_urlencoded::byte_serialize(property.as_bytes()).collect();
        format!(
            "{}/webmasters/v3/sites/{}/searchAnalytics/query",
            self.endpoint, encoded
        )
    }
}

#[async_trait::async_trait]
impl SearchAnalyticsSource for SearchConsoleClient {
    async fn fetch_query_stats(
        &self,
        property: &str,
        range: &ResolvedRange,
        row_limit: u32,
    ) -> Result<Vec<QueryStats>> {
        let request = AnalyticsQueryRequest {
            start_date: range.start_date.to_string(),
            end_date: range.end_date.to_string(),
            dimensions: ["query"],
            row_limit,
        };

        let resp = self
            .client
            .post(self.query_url(property))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .context("Search Console request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Search Console error {status}: {body}");
        }

        let parsed: AnalyticsQueryResponse = resp
            .json()
            .await
            .context("Search Console response parse failed")?;

        debug!(
            property,
            start = %range.start_date,
            end = %range.end_date,
            rows = parsed.rows.len(),
            "Search analytics fetched"
        );

        Ok(parsed.rows.into_iter().map(normalise).collect())
    }
}
