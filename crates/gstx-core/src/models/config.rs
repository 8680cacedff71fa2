//! Configuration structures for the extraction client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Image MIME types the extraction engine accepts.
pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/bmp",
    "image/tiff",
    "image/webp",
];

/// Main configuration for gstx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GstxConfig {
    /// Remote API configuration.
    pub api: ApiConfig,

    /// Upload validation limits.
    pub upload: UploadConfig,

    /// Local output configuration.
    pub output: OutputConfig,
}

/// Remote extraction API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto.
    pub base_url: String,

    /// Request timeout in seconds, covering slow uploads and model latency.
    pub timeout_secs: u64,

    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            user_agent: concat!("gstx/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Upload validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum file size in bytes (inclusive).
    pub max_file_size: u64,

    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Local output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory downloads are saved into.
    pub download_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
        }
    }
}

impl GstxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GstxConfig::default();
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.upload.max_file_size, 10_485_760);
        assert_eq!(config.upload.allowed_mime_types.len(), 6);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: GstxConfig =
            serde_json::from_str(r#"{"api": {"base_url": "http://invoices.local/api"}}"#).unwrap();
        assert_eq!(config.api.base_url, "http://invoices.local/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.output.download_dir, PathBuf::from("."));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GstxConfig::default();
        config.api.timeout_secs = 45;
        config.save(&path).unwrap();

        let loaded = GstxConfig::from_file(&path).unwrap();
        assert_eq!(loaded.api.timeout_secs, 45);
    }
}
