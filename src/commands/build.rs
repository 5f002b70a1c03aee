//! Generate static files from the content store

use anyhow::Result;
use std::sync::Arc;

use crate::generator::{BuildReport, PageBuilder, StaticBuilder};
use crate::Blog;

/// Render every known route into the public directory
pub async fn run(blog: &Blog) -> Result<BuildReport> {
    let store = blog.store()?;
    let builder = Arc::new(PageBuilder::new(&blog.config, store)?);
    StaticBuilder::new(builder, &blog.public_dir, blog.config.build_concurrency)
        .run()
        .await
}
