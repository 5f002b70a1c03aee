//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub url: String,

    // Content store
    #[serde(default)]
    pub store: StoreConfig,

    // Regeneration
    /// Seconds a generated page stays fresh before it is regenerated
    pub revalidate_secs: u64,
    /// Shared secret for on-demand revalidation requests
    pub revalidate_secret: Option<String>,

    // Build
    pub public_dir: String,
    pub build_concurrency: usize,

    // Date format (Moment.js style)
    pub date_format: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Medium Blog".to_string(),
            description: "Stories from the content store".to_string(),
            url: "http://localhost:3000".to_string(),

            store: StoreConfig::default(),

            revalidate_secs: 60,
            revalidate_secret: None,

            public_dir: "public".to_string(),
            build_concurrency: 8,

            date_format: "MM/DD/YYYY".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides on top of the file values
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project_id) = var("SANITY_PROJECT_ID") {
            self.store.project_id = project_id;
        }
        if let Some(dataset) = var("SANITY_DATASET") {
            self.store.dataset = dataset;
        }
        if let Some(version) = var("SANITY_API_VERSION") {
            self.store.api_version = version;
        }
        if let Some(token) = var("SANITY_API_TOKEN") {
            self.store.token = Some(token);
        }
        if let Some(host) = var("SANITY_API_HOST") {
            self.store.api_host = Some(host);
        }
        if let Some(fixtures) = var("SANITY_FIXTURES") {
            self.store.fixtures = Some(fixtures);
        }
        if let Some(secret) = var("REVALIDATE_SECRET") {
            self.revalidate_secret = Some(secret);
        }
    }

    /// Reject configurations the content store cannot be queried with
    pub fn validate(&self) -> Result<()> {
        if self.store.project_id.trim().is_empty() {
            bail!("store.project_id is not set (use _config.yml or SANITY_PROJECT_ID)");
        }
        if self.store.dataset.trim().is_empty() {
            bail!("store.dataset is not set (use _config.yml or SANITY_DATASET)");
        }
        if self.build_concurrency == 0 {
            bail!("build_concurrency must be at least 1");
        }
        Ok(())
    }

    /// Revalidation window as a duration
    pub fn revalidate_window(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.revalidate_secs)
    }
}

/// Content store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Write token, required for creating comments
    pub token: Option<String>,
    pub use_cdn: bool,
    /// Overrides the derived API base URL
    pub api_host: Option<String>,
    pub request_timeout_secs: u64,
    /// JSON fixture file served instead of the HTTP API
    pub fixtures: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: "production".to_string(),
            api_version: "2021-10-21".to_string(),
            token: None,
            use_cdn: false,
            api_host: None,
            request_timeout_secs: 30,
            fixtures: None,
        }
    }
}

impl StoreConfig {
    /// Base URL of the HTTP API, without the version segment
    pub fn api_base(&self) -> String {
        if let Some(host) = &self.api_host {
            return host.trim_end_matches('/').to_string();
        }
        let domain = if self.use_cdn {
            "apicdn.sanity.io"
        } else {
            "api.sanity.io"
        };
        format!("https://{}.{}", self.project_id, domain)
    }
}
