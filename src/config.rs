//! TOML configuration.
//!
//! Every section and key is optional; an empty file yields the defaults that
//! match the recommender service's own layout:
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8000"
//! upload_path = "/upload/"
//!
//! [catalog]
//! path = "/static/fashion.csv"
//! cache = true
//!
//! [render]
//! policy = "graceful"
//! max_results = 6
//! local_image_prefix = "static/images"
//!
//! [http]
//! timeout_secs = 30
//! user_agent = "lookbook/0.1.0"
//! ```
//!
//! `timeout_secs` is unset by default. `user_agent` defaults to
//! `lookbook/<crate version>`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::render::RenderPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_path: default_upload_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_upload_path() -> String {
    "/upload/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
    /// Fetch the catalog once and reuse it across submissions.
    #[serde(default = "default_cache")]
    pub cache: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            cache: default_cache(),
        }
    }
}

fn default_catalog_path() -> String {
    "/static/fashion.csv".to_string()
}
fn default_cache() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default)]
    pub policy: RenderPolicy,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_local_image_prefix")]
    pub local_image_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            policy: RenderPolicy::default(),
            max_results: default_max_results(),
            local_image_prefix: default_local_image_prefix(),
        }
    }
}

fn default_max_results() -> usize {
    6
}
fn default_local_image_prefix() -> String {
    "static/images".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout. Unset leaves reqwest's default (none).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("lookbook/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    pub fn upload_url(&self) -> String {
        join_url(&self.server.base_url, &self.server.upload_path)
    }

    pub fn catalog_url(&self) -> String {
        join_url(&self.server.base_url, &self.catalog.path)
    }

    /// Check invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<()> {
        let base = &self.server.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!(
                "server.base_url must start with http:// or https:// (got '{}')",
                base
            );
        }
        if !self.server.upload_path.starts_with('/') {
            anyhow::bail!("server.upload_path must start with '/'");
        }
        if !self.catalog.path.starts_with('/') {
            anyhow::bail!("catalog.path must start with '/'");
        }
        if self.render.max_results == 0 {
            anyhow::bail!("render.max_results must be >= 1");
        }
        if self.http.timeout_secs == Some(0) {
            anyhow::bail!("http.timeout_secs must be > 0 when set");
        }
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load `path`, or fall back to the defaults when `path` is the implicit
/// default location and does not exist.
pub fn load_config_or_default(path: &Path, explicit: bool) -> Result<Config> {
    if !explicit && !path.exists() {
        return Ok(Config::default());
    }
    load_config(path)
}
