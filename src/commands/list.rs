//! List site content

use anyhow::Result;

use crate::cache::BuildManifest;
use crate::generator::{enumerate_paths, Route};
use crate::Blog;

/// One listed route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRoute {
    pub path: String,
    /// Written by the last static build; otherwise generated on first request
    pub built: bool,
}

/// Routes known to the content store, marked against the last build
pub async fn routes(blog: &Blog) -> Result<Vec<ListedRoute>> {
    let store = blog.store()?;
    let manifest = BuildManifest::load(&blog.public_dir);

    let mut routes = vec![Route::Home];
    routes.extend(enumerate_paths(&store).await?.into_iter().map(Route::Post));

    Ok(routes
        .into_iter()
        .map(|route| {
            let path = route.path();
            ListedRoute {
                built: manifest.contains(&path),
                path,
            }
        })
        .collect())
}

/// Print every route
pub async fn run(blog: &Blog) -> Result<()> {
    let routes = routes(blog).await?;
    let manifest = BuildManifest::load(&blog.public_dir);

    println!("Routes ({}):", routes.len());
    for route in &routes {
        let mark = if route.built { "built" } else { "on-demand" };
        println!("  {} [{}]", route.path, mark);
    }
    match manifest.built_at {
        Some(at) => println!("Last build: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("No build yet"),
    }

    Ok(())
}
