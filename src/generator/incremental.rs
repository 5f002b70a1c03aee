//! Incremental regeneration of cached routes

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{enumerate_paths, GenerateError, PageBuilder, RenderedPage, Route};
use crate::cache::{Lookup, RouteCache};

/// Serves routes from the cache, regenerating them when they go stale
///
/// Fresh routes are served as cached. Stale routes are served as cached while
/// one background task regenerates them. Routes that were never generated are
/// generated in the request path.
#[derive(Clone)]
pub struct IncrementalSite {
    builder: Arc<PageBuilder>,
    cache: Arc<RouteCache<RenderedPage>>,
}

impl IncrementalSite {
    pub fn new(builder: Arc<PageBuilder>, window: Duration) -> Self {
        Self {
            builder,
            cache: Arc::new(RouteCache::new(window)),
        }
    }

    pub fn builder(&self) -> &Arc<PageBuilder> {
        &self.builder
    }

    pub fn cache(&self) -> &Arc<RouteCache<RenderedPage>> {
        &self.cache
    }

    /// Page for a route right now; `None` means not found
    pub async fn page(&self, route: &Route) -> Result<Option<Arc<RenderedPage>>, GenerateError> {
        self.page_at(route, Instant::now()).await
    }

    /// Page for a route as of `now`
    pub async fn page_at(
        &self,
        route: &Route,
        now: Instant,
    ) -> Result<Option<Arc<RenderedPage>>, GenerateError> {
        match self.cache.lookup(&route.path(), now).await {
            Lookup::Fresh(page) => Ok(Some(page)),
            Lookup::Stale(page) => {
                self.spawn_regeneration(route.clone(), now);
                Ok(Some(page))
            }
            Lookup::Missing => {
                tracing::debug!("Generating {} on demand", route.path());
                self.regenerate(route, now).await
            }
        }
    }

    /// Generate a route now and replace its cache entry
    ///
    /// A route that no longer exists is dropped from the cache.
    pub async fn regenerate(
        &self,
        route: &Route,
        now: Instant,
    ) -> Result<Option<Arc<RenderedPage>>, GenerateError> {
        let key = route.path();
        match self.builder.build(route).await? {
            Some(page) => Ok(Some(self.cache.store(&key, page, now).await)),
            None => {
                self.cache.invalidate(&key).await;
                Ok(None)
            }
        }
    }

    /// On-demand revalidation: drop the cached route and generate it again
    pub async fn revalidate(&self, route: &Route) -> Result<bool, GenerateError> {
        self.cache.invalidate(&route.path()).await;
        let found = self.regenerate(route, Instant::now()).await?.is_some();
        tracing::info!("Revalidated {} (found: {})", route.path(), found);
        Ok(found)
    }

    /// Pre-generate the home page and every enumerated post
    pub async fn warm(&self, concurrency: usize) -> Result<usize, GenerateError> {
        let slugs = enumerate_paths(self.builder.store()).await?;
        let mut routes = vec![Route::Home];
        routes.extend(slugs.into_iter().map(Route::Post));

        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for route in routes {
            let site = self.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                site.regenerate(&route, Instant::now()).await
            });
        }

        let mut generated = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some(_))) => generated += 1,
                Ok(Ok(None)) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => tracing::error!("Warm-up task failed: {}", e),
            }
        }

        tracing::info!("Warmed {} routes", generated);
        Ok(generated)
    }

    fn spawn_regeneration(&self, route: Route, now: Instant) {
        let key = route.path();
        let Some(slot) = self.cache.claim_regeneration(&key) else {
            tracing::debug!("Regeneration of {} already running", key);
            return;
        };

        let site = self.clone();
        tokio::spawn(async move {
            let _slot = slot;
            match site.regenerate(&route, now).await {
                Ok(Some(_)) => tracing::debug!("Regenerated stale route {}", key),
                Ok(None) => tracing::info!("Route {} no longer exists", key),
                // The stale page stays in place until a later attempt succeeds
                Err(e) => tracing::warn!("Background regeneration of {} failed: {}", key, e),
            }
        });
    }
}
