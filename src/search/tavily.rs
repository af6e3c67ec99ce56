//! Tavily搜索API客户端

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::SearchGateway;
use crate::config::SearchConfig;
use crate::error::GatewayError;
use crate::generator::state::SearchDocument;

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchDocument>,
}

/// Tavily搜索客户端
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl TavilyClient {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.config.api_base_url.trim_end_matches('/'))
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout)
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait]
impl SearchGateway for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<SearchDocument>, GatewayError> {
        let request = TavilyRequest {
            query,
            max_results,
            search_depth: &self.config.search_depth,
            include_answer: false,
            include_raw_content: false,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        debug!(query, results = parsed.results.len(), "tavily search finished");

        let mut results = parsed.results;
        results.truncate(max_results);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = TavilyClient::new(SearchConfig {
            api_base_url: "https://api.tavily.com/".to_string(),
            ..Default::default()
        });
        assert_eq!(client.endpoint(), "https://api.tavily.com/search");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "query": "ev subsidies",
            "results": [
                {"title": "A", "url": "https://a.example", "content": "alpha", "score": 0.8, "raw_content": null},
                {"title": "B", "url": "https://b.example", "content": "beta", "score": 0.5}
            ]
        }"#;
        let parsed: TavilyResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].snippet, "alpha");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_gateway_error() {
        let client = TavilyClient::new(SearchConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        });
        let result = client
            .search("anything", 3, Duration::from_millis(500))
            .await;
        assert!(result.is_err());
    }
}
