//! Subcommands of the `gstx` binary.

pub mod batch;
pub mod config;
pub mod extract;
pub mod history;
pub mod show;
pub mod stats;

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use gstx_core::models::config::GstxConfig;
use gstx_core::ApiClient;

/// Where the configuration comes from, as given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSource<'a> {
    /// `-c/--config`.
    pub path: Option<&'a Path>,
    /// `--api-url` or `GSTX_API_URL`.
    pub api_url: Option<&'a str>,
}

impl ConfigSource<'_> {
    /// Resolve the effective configuration.
    ///
    /// An explicit `--config` file must exist. Otherwise the default file is
    /// used when present, then built-in defaults. `--api-url` wins over both.
    pub fn load(&self) -> anyhow::Result<GstxConfig> {
        let mut config = match self.path {
            Some(path) => GstxConfig::from_file(path).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e)
            })?,
            None => {
                let default_path = config::default_config_path();
                if default_path.exists() {
                    debug!("Using config file {}", default_path.display());
                    GstxConfig::from_file(&default_path)?
                } else {
                    GstxConfig::default()
                }
            }
        };

        if let Some(url) = self.api_url {
            config.api.base_url = url.to_string();
        }

        debug!("API base URL: {}", config.api.base_url);
        Ok(config)
    }

    /// Load the configuration and build an HTTP client from it.
    pub fn client(&self) -> anyhow::Result<(GstxConfig, ApiClient)> {
        let config = self.load()?;
        let client = ApiClient::from_config(&config.api)?;
        Ok((config, client))
    }
}

/// Spinner shown on stderr while a request is in flight.
pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
