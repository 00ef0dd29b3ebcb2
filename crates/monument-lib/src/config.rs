//! Engine configuration

use crate::{ClusterConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Radius searches returning fewer results than this fall back to a broad search
pub const MIN_NEARBY_RESULTS: usize = 3;

/// Configuration shared by the catalogue client and the map session
///
/// Missing fields in a JSON file take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the catalogue API, without trailing slash
    /// Default: http://localhost:3000/api
    pub api_base_url: String,
    /// Timeout applied to every catalogue request, in seconds
    pub request_timeout_secs: u64,
    /// Marker clustering parameters
    pub cluster: ClusterConfig,
    /// Minimum radius-search results before the broad search fallback kicks in
    pub min_nearby_results: usize,
    /// Page size used for list searches
    pub search_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 15,
            cluster: ClusterConfig::default(),
            min_nearby_results: MIN_NEARBY_RESULTS,
            search_page_size: 20,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.min_nearby_results, 3);
        assert_eq!(config.cluster.radius_px, 80.0);
        assert!(!config.api_base_url.ends_with('/'));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"api_base_url": "https://example.org/api", "cluster": {"radius_px": 60.0}}"#)
                .unwrap();
        assert_eq!(config.api_base_url, "https://example.org/api");
        assert_eq!(config.cluster.radius_px, 60.0);
        assert_eq!(config.cluster.disable_at_zoom, 17);
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfig::from_json_file("/nonexistent/monument-config.json");
        assert!(matches!(result, Err(crate::CatalogueError::Io(_))));
    }
}
