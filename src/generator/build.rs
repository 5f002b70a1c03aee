//! Full static build into the public directory

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{enumerate_paths, is_routable_slug, PageBuilder, Route};
use crate::cache::{BuildManifest, ManifestEntry};

/// Summary of a static build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Routes written to disk, sorted
    pub written: Vec<String>,
    /// Enumerated slugs whose post was gone by the time it was fetched
    pub skipped: Vec<String>,
    pub elapsed_ms: u128,
}

impl BuildReport {
    pub fn pages_written(&self) -> usize {
        self.written.len()
    }
}

/// Writes the home page and every enumerated post page to disk
pub struct StaticBuilder {
    builder: Arc<PageBuilder>,
    public_dir: PathBuf,
    concurrency: usize,
}

impl StaticBuilder {
    pub fn new(builder: Arc<PageBuilder>, public_dir: impl Into<PathBuf>, concurrency: usize) -> Self {
        Self {
            builder,
            public_dir: public_dir.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Generate every route
    ///
    /// Store and render failures abort the build. A post that disappears
    /// between enumeration and fetch is skipped with a warning.
    pub async fn run(&self) -> Result<BuildReport> {
        let start = std::time::Instant::now();
        tokio::fs::create_dir_all(&self.public_dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;

        let slugs = enumerate_paths(self.builder.store()).await?;
        let mut routes = vec![Route::Home];
        routes.extend(slugs.into_iter().map(Route::Post));

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for route in routes {
            let builder = self.builder.clone();
            let public_dir = self.public_dir.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await?;
                generate_route(&builder, &public_dir, route).await
            });
        }

        let mut report = BuildReport::default();
        let mut manifest = BuildManifest::new();
        while let Some(joined) = tasks.join_next().await {
            match joined.context("Build task panicked")?? {
                Written::Page(entry) => {
                    report.written.push(entry.route.clone());
                    manifest.routes.push(entry);
                }
                Written::Skipped(slug) => report.skipped.push(slug),
            }
        }

        report.written.sort();
        report.skipped.sort();
        manifest.routes.sort_by(|a, b| a.route.cmp(&b.route));
        manifest.built_at = Some(Utc::now());
        manifest.save(&self.public_dir)?;

        report.elapsed_ms = start.elapsed().as_millis();
        tracing::info!(
            "Generated {} pages in {} ms ({} skipped)",
            report.pages_written(),
            report.elapsed_ms,
            report.skipped.len()
        );
        Ok(report)
    }
}

enum Written {
    Page(ManifestEntry),
    Skipped(String),
}

async fn generate_route(builder: &PageBuilder, public_dir: &Path, route: Route) -> Result<Written> {
    if let Route::Post(slug) = &route {
        if !is_routable_slug(slug) {
            tracing::warn!("Refusing to write unroutable slug {:?}", slug);
            return Ok(Written::Skipped(slug.clone()));
        }
    }

    let Some(page) = builder.build(&route).await? else {
        let slug = match &route {
            Route::Post(slug) => slug.clone(),
            Route::Home => String::new(),
        };
        tracing::warn!("Post {} vanished during the build, skipping it", slug);
        return Ok(Written::Skipped(slug));
    };

    let relative = route.output_path();
    let output_path = public_dir.join(&relative);
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    tokio::fs::write(&output_path, &page.html)
        .await
        .with_context(|| format!("Failed to write {:?}", output_path))?;
    tracing::debug!("Wrote {:?}", output_path);

    Ok(Written::Page(ManifestEntry {
        route: route.path(),
        output_path: relative.to_string_lossy().replace('\\', "/"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::{seeded_store, test_config};
    use crate::store::memory::tests::sample_post;

    #[tokio::test]
    async fn test_build_writes_every_route() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let builder = Arc::new(PageBuilder::new(&test_config(), store).unwrap());

        let report = StaticBuilder::new(builder, dir.path(), 2).run().await.unwrap();
        assert_eq!(report.written, vec!["/", "/post/hello-world", "/post/second"]);
        assert!(report.skipped.is_empty());

        let home = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(home.contains("/post/hello-world"));
        let post =
            std::fs::read_to_string(dir.path().join("post/hello-world/index.html")).unwrap();
        assert!(post.contains("Hello World"));
        assert!(post.contains("text-c1"));
        assert!(!post.contains("text-c2"));

        let manifest = BuildManifest::load(dir.path());
        assert!(manifest.built_at.is_some());
        assert!(manifest.contains("/post/second"));
        assert_eq!(manifest.routes.len(), 3);
    }

    #[tokio::test]
    async fn test_build_never_writes_outside_public_dir() {
        let root = tempfile::tempdir().unwrap();
        let public_dir = root.path().join("site").join("public");
        let store = seeded_store();
        store.insert_post(sample_post("p3", "../../escaped"));
        store.insert_post(sample_post("p4", "/abs"));
        let builder = Arc::new(PageBuilder::new(&test_config(), store).unwrap());

        let report = StaticBuilder::new(builder.clone(), &public_dir, 2).run().await.unwrap();
        assert_eq!(report.written, vec!["/", "/post/hello-world", "/post/second"]);
        assert!(!root.path().join("escaped").exists());
        assert!(!root.path().join("site").join("escaped").exists());

        // Routes that bypass enumeration are rejected as well
        let written = generate_route(&builder, &public_dir, Route::Post("../../escaped".to_string()))
            .await
            .unwrap();
        assert!(matches!(written, Written::Skipped(_)));
        assert!(!root.path().join("escaped").exists());
    }

    #[tokio::test]
    async fn test_build_with_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(crate::store::MemoryStore::new());
        let builder = Arc::new(PageBuilder::new(&test_config(), store).unwrap());

        let report = StaticBuilder::new(builder, dir.path(), 8).run().await.unwrap();
        assert_eq!(report.written, vec!["/"]);
        let home = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(home.contains("No posts yet."));
    }

    #[tokio::test]
    async fn test_build_aborts_when_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        store.set_failing(true);
        let builder = Arc::new(PageBuilder::new(&test_config(), store).unwrap());

        assert!(StaticBuilder::new(builder, dir.path(), 4).run().await.is_err());
        assert!(!dir.path().join(".sanity-press/manifest.json").exists());
    }
}
