//! Content store access
//!
//! [`ContentStore`] is the seam between page generation and the headless
//! CMS. [`SanityClient`] talks to the real HTTP API; [`MemoryStore`] keeps
//! everything in process for fixtures and tests.

mod error;
pub mod groq;
pub(crate) mod memory;
mod sanity;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sanity::SanityClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{NewComment, Post, PostPath, PostSummary};

/// Read and comment-creation operations against the content store
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Id and slug of every post
    async fn post_paths(&self) -> Result<Vec<PostPath>, StoreError>;

    /// One post by exact slug match, with approved comments embedded
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError>;

    /// Cards for the home page, newest first
    async fn post_summaries(&self) -> Result<Vec<PostSummary>, StoreError>;

    /// Create a pending (unapproved) comment
    async fn create_comment(&self, comment: &NewComment) -> Result<(), StoreError>;
}

/// Shared handle to a content store
pub type SharedStore = Arc<dyn ContentStore>;

/// Build the store selected by the configuration
pub fn from_config(config: &SiteConfig, base_dir: &std::path::Path) -> anyhow::Result<SharedStore> {
    if let Some(fixtures) = &config.store.fixtures {
        let path = base_dir.join(fixtures);
        tracing::info!("Using fixture content store {:?}", path);
        return Ok(Arc::new(MemoryStore::load(path)?));
    }

    config.validate()?;
    tracing::info!(
        "Using content store {} (dataset {})",
        config.store.api_base(),
        config.store.dataset
    );
    Ok(Arc::new(SanityClient::new(&config.store)?))
}
