//! HTTP transport abstraction for testability

use crate::{CatalogueError, EngineConfig, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Asynchronous HTTP operations needed by the catalogue client.
///
/// Paths are relative to the API base URL (e.g. `/geojson`). Implementations
/// return the raw response body of successful (2xx) responses and map every
/// other outcome to [`CatalogueError::Network`].
pub trait HttpTransport: Send + Sync {
    /// Performs a GET request with the given query pairs.
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Performs a POST request with a JSON body.
    fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Base URL every path is resolved against.
    fn base_url(&self) -> &str;
}

/// Default User-Agent string for catalogue requests.
const DEFAULT_USER_AGENT: &str = concat!("monument-lib/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| CatalogueError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(CatalogueError::Network(format!("HTTP {} from {}", status, url)));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| CatalogueError::Network(format!("Failed to read response: {}", e)))
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Vec<u8>> {
        let url = self.url(path);
        trace!(url = %url, params = query.len(), "HTTP GET request starting");

        let response = match self.client.get(&url).query(query).send().await {
            Ok(resp) => {
                debug!(url = %url, status = resp.status().as_u16(), "HTTP response received");
                resp
            }
            Err(e) => {
                warn!(
                    url = %url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(CatalogueError::Network(format!("Request failed: {}", e)));
            }
        };

        Self::read_body(&url, response).await
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        let url = self.url(path);
        trace!(url = %url, "HTTP POST request starting");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP POST failed");
                CatalogueError::Network(format!("POST request failed: {}", e))
            })?;

        Self::read_body(&url, response).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let transport =
            ReqwestTransport::new("https://example.org/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "https://example.org/api");
        assert_eq!(transport.url("/geojson"), "https://example.org/api/geojson");
        assert_eq!(transport.url("rutas"), "https://example.org/api/rutas");
    }

    #[test]
    fn test_from_config() {
        let transport = ReqwestTransport::from_config(&EngineConfig::default()).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:3000/api");
    }
}
