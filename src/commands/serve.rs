//! Serve pages with incremental regeneration

use anyhow::Result;

use crate::server::{self, AppState};
use crate::Blog;

/// Start the server for a blog
pub async fn run(blog: &Blog, ip: &str, port: u16, warm: bool) -> Result<()> {
    let state = AppState::new(blog.site()?, blog.config.clone(), &blog.public_dir);
    server::start(state, ip, port, warm).await
}
