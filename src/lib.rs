//! sanity-press: a server-rendered blog on top of a Sanity content store
//!
//! Posts, authors and moderated comments are fetched from the content store
//! and rendered with embedded Tera templates. Pages are either written out by
//! a static build or served with incremental regeneration, and readers can
//! submit comments that only appear once approved.

pub mod cache;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod store;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use generator::{IncrementalSite, PageBuilder};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a blog from a directory
    ///
    /// Reads `.env` and `_config.yml` from the directory when present, then
    /// applies environment overrides.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)?;
            tracing::debug!("Loaded environment from {:?}", env_path);
        }

        let config_path = base_dir.join("_config.yml");
        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
        })
    }

    /// Content store selected by the configuration
    pub fn store(&self) -> Result<store::SharedStore> {
        store::from_config(&self.config, &self.base_dir)
    }

    /// Route-cached site for serving
    pub fn site(&self) -> Result<IncrementalSite> {
        let builder = PageBuilder::new(&self.config, self.store()?)?;
        Ok(IncrementalSite::new(
            Arc::new(builder),
            self.config.revalidate_window(),
        ))
    }

    /// Generate the static site
    pub async fn build(&self) -> Result<generator::BuildReport> {
        commands::build::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Serve the site
    pub async fn serve(&self, ip: &str, port: u16, warm: bool) -> Result<()> {
        commands::serve::run(self, ip, port, warm).await
    }
}
