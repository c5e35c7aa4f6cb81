//! Client configuration loading.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use ogc_common::SpatialReference;
use ogc_protocol::InfoFormat;

/// Settings shared by the WMS and WFS clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Display SRS used when the caller has no view of its own
    pub default_srs: String,
    /// MIME type requested from GetFeatureInfo
    pub info_format: String,
    /// Features per page when loading a feature table
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("ogc-client/{}", env!("CARGO_PKG_VERSION")),
            default_srs: "EPSG:3857".to_string(),
            info_format: InfoFormat::default().to_mime().to_string(),
            page_size: 20,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply `OGC_*` environment overrides.
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Ok(v) = std::env::var("OGC_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v.parse().context("OGC_REQUEST_TIMEOUT_SECS")?;
        }
        if let Ok(v) = std::env::var("OGC_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = v.parse().context("OGC_CONNECT_TIMEOUT_SECS")?;
        }
        if let Ok(v) = std::env::var("OGC_USER_AGENT") {
            self.user_agent = v;
        }
        if let Ok(v) = std::env::var("OGC_DEFAULT_SRS") {
            self.default_srs = v;
        }
        if let Ok(v) = std::env::var("OGC_INFO_FORMAT") {
            self.info_format = v;
        }
        if let Ok(v) = std::env::var("OGC_PAGE_SIZE") {
            self.page_size = v.parse().context("OGC_PAGE_SIZE")?;
        }
        Ok(self)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be > 0");
        }
        if self.connect_timeout_secs == 0 {
            bail!("connect_timeout_secs must be > 0");
        }
        if self.page_size == 0 {
            bail!("page_size must be > 0");
        }
        if InfoFormat::from_mime(&self.info_format).is_none() {
            bail!("unsupported info_format '{}'", self.info_format);
        }
        self.display_srs()?;
        Ok(())
    }

    pub fn display_srs(&self) -> anyhow::Result<SpatialReference> {
        SpatialReference::parse(&self.default_srs)
            .with_context(|| format!("invalid default_srs '{}'", self.default_srs))
    }

    pub fn feature_info_format(&self) -> InfoFormat {
        InfoFormat::from_mime(&self.info_format).unwrap_or_default()
    }
}
