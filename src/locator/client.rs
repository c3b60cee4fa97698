//! REST client for the frame discovery ("datafind") service.
//!
//! The [`LocatorClient`] asks the service named in a locator which file URLs
//! cover a GPS interval. The service speaks the LIGO datafind REST API:
//!
//! ```text
//! GET http://{endpoint}/services/data/v1/gwf/{observatory}/{type}/{start},{end}/file.json
//! ```
//!
//! and answers with a JSON array of URL strings, ordered by GPS start time.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::user_agent::plugin_user_agent;

use super::error::LocatorError;
use super::query::DataQuery;

/// Connect timeout for discovery requests, in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Total timeout for a discovery request, in seconds. Responses are small
/// JSON lists, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// HTTP client for discovery queries.
#[derive(Debug, Clone)]
pub struct LocatorClient {
    client: Client,
}

impl LocatorClient {
    /// Creates a client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which only
    /// happens when the TLS backend fails to initialize.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed with the
    /// supplied timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, request_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .gzip(true)
            .user_agent(plugin_user_agent())
            .build()
            .expect("failed to build discovery HTTP client with static configuration");
        Self { client }
    }

    /// Asks the discovery service for the file URLs covering `query`.
    ///
    /// The returned list preserves server order. An empty list is a valid
    /// answer meaning no data matches the interval.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Query`] when the request cannot be completed,
    /// [`LocatorError::HttpStatus`] on a non-success response, and
    /// [`LocatorError::Decode`] when the body is not a JSON list of strings.
    pub async fn find_urls(&self, query: &DataQuery) -> Result<Vec<String>, LocatorError> {
        let request_url = format!(
            "http://{}/services/data/v1/gwf/{}/{}/{},{}/file.json",
            query.endpoint,
            urlencoding::encode(&query.observatory),
            urlencoding::encode(&query.frame_type),
            query.start,
            query.end,
        );
        debug!(url = %request_url, "querying discovery service");

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| LocatorError::query(&request_url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %request_url, "discovery service error");
            return Err(LocatorError::http_status(&request_url, status.as_u16()));
        }

        let urls: Vec<String> = response
            .json()
            .await
            .map_err(|e| LocatorError::decode(&request_url, e))?;
        debug!(count = urls.len(), "discovery service answered");
        Ok(urls)
    }
}

impl Default for LocatorClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query_for(server: &MockServer) -> DataQuery {
        let endpoint = server
            .uri()
            .strip_prefix("http://")
            .unwrap()
            .to_string();
        DataQuery {
            endpoint,
            observatory: "H".to_string(),
            frame_type: "H1_HOFT_C00".to_string(),
            start: 0,
            end: 64,
            cache: None,
            metadata_file: "metadata.txt".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_urls_preserves_server_order() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v1/gwf/H/H1_HOFT_C00/0,64/file.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "http://data.example.org/frames/H-H1_HOFT_C00-0-32.gwf",
                "http://data.example.org/frames/H-H1_HOFT_C00-32-32.gwf"
            ])))
            .mount(&mock_server)
            .await;

        let client = LocatorClient::new();
        let urls = client.find_urls(&query_for(&mock_server)).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "http://data.example.org/frames/H-H1_HOFT_C00-0-32.gwf",
                "http://data.example.org/frames/H-H1_HOFT_C00-32-32.gwf"
            ]
        );
    }

    #[tokio::test]
    async fn test_find_urls_empty_answer_is_ok() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v1/gwf/H/H1_HOFT_C00/0,64/file.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let client = LocatorClient::new();
        let urls = client.find_urls(&query_for(&mock_server)).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_find_urls_http_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = LocatorClient::new_with_timeouts(5, 5);
        let err = client.find_urls(&query_for(&mock_server)).await.unwrap_err();
        assert!(
            matches!(err, LocatorError::HttpStatus { status: 503, .. }),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn test_find_urls_rejects_non_list_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})),
            )
            .mount(&mock_server)
            .await;

        let client = LocatorClient::new();
        let err = client.find_urls(&query_for(&mock_server)).await.unwrap_err();
        assert!(matches!(err, LocatorError::Decode { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_find_urls_encodes_path_segments() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v1/gwf/H/H1%20HOFT/0,64/file.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let client = LocatorClient::new();
        let mut query = query_for(&mock_server);
        query.frame_type = "H1 HOFT".to_string();
        let urls = client.find_urls(&query).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_find_urls_sends_plugin_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = LocatorClient::new();
        client.find_urls(&query_for(&mock_server)).await.unwrap();
    }
}
