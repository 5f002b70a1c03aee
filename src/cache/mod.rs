//! Route cache for incremental regeneration
//!
//! Generated pages are kept per route together with the instant they were
//! generated. Within the revalidation window a page is fresh; after it the
//! page is stale and still served while a single background regeneration
//! replaces it. The build manifest records what a static build wrote to disk.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Manifest location relative to the public dir
const MANIFEST_FILE: &str = ".sanity-press/manifest.json";

/// A cached value and when it was generated
#[derive(Debug)]
struct CacheEntry<T> {
    value: Arc<T>,
    generated_at: Instant,
}

/// Result of a cache lookup
#[derive(Debug)]
pub enum Lookup<T> {
    /// Generated less than one window ago
    Fresh(Arc<T>),
    /// Older than the window; serve it and regenerate
    Stale(Arc<T>),
    /// Never generated (or invalidated)
    Missing,
}

/// Stale-while-revalidate cache keyed by route path
pub struct RouteCache<T> {
    window: Duration,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    in_flight: Mutex<HashSet<String>>,
}

impl<T> RouteCache<T> {
    /// Create a cache with the given revalidation window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Look up a route as of `now`
    pub async fn lookup(&self, route: &str, now: Instant) -> Lookup<T> {
        let entries = self.entries.read().await;
        match entries.get(route) {
            Some(entry) if now.saturating_duration_since(entry.generated_at) < self.window => {
                Lookup::Fresh(entry.value.clone())
            }
            Some(entry) => Lookup::Stale(entry.value.clone()),
            None => Lookup::Missing,
        }
    }

    /// Store a freshly generated value
    pub async fn store(&self, route: &str, value: T, now: Instant) -> Arc<T> {
        let value = Arc::new(value);
        self.entries.write().await.insert(
            route.to_string(),
            CacheEntry {
                value: value.clone(),
                generated_at: now,
            },
        );
        tracing::debug!("Cached route {}", route);
        value
    }

    /// Drop a route so the next request regenerates it
    pub async fn invalidate(&self, route: &str) -> bool {
        let removed = self.entries.write().await.remove(route).is_some();
        if removed {
            tracing::debug!("Invalidated route {}", route);
        }
        removed
    }

    /// All cached routes, sorted
    pub async fn routes(&self) -> Vec<String> {
        let mut routes: Vec<_> = self.entries.read().await.keys().cloned().collect();
        routes.sort();
        routes
    }

    /// Claim the regeneration slot for a route
    ///
    /// Returns `false` when a regeneration for the route is already running.
    pub fn begin_regeneration(&self, route: &str) -> bool {
        self.in_flight_set().insert(route.to_string())
    }

    /// Release the regeneration slot for a route
    pub fn end_regeneration(&self, route: &str) {
        self.in_flight_set().remove(route);
    }

    /// Claim the regeneration slot for a route, released when the guard drops
    ///
    /// The slot is freed even if the task holding the guard panics.
    pub fn claim_regeneration(self: &Arc<Self>, route: &str) -> Option<RegenerationGuard<T>> {
        if !self.begin_regeneration(route) {
            return None;
        }
        Some(RegenerationGuard {
            cache: self.clone(),
            route: route.to_string(),
        })
    }

    fn in_flight_set(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Holds a route's regeneration slot
pub struct RegenerationGuard<T> {
    cache: Arc<RouteCache<T>>,
    route: String,
}

impl<T> Drop for RegenerationGuard<T> {
    fn drop(&mut self) {
        self.cache.end_regeneration(&self.route);
    }
}

/// One page written by a static build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Route path, e.g. `/post/hello`
    pub route: String,
    /// Output file relative to the public dir
    pub output_path: String,
}

/// Record of the last static build
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildManifest {
    /// Version of the manifest format
    pub version: u32,
    /// When the build finished
    pub built_at: Option<DateTime<Utc>>,
    /// Pages written by the build
    pub routes: Vec<ManifestEntry>,
}

impl BuildManifest {
    /// Current manifest format version
    const VERSION: u32 = 1;

    /// Create a new manifest with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            built_at: None,
            routes: Vec::new(),
        }
    }

    /// Load the manifest from a public dir, or an empty one
    pub fn load(public_dir: &Path) -> Self {
        let path = public_dir.join(MANIFEST_FILE);
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(manifest) = serde_json::from_str::<BuildManifest>(&content) {
                if manifest.version == Self::VERSION {
                    return manifest;
                }
                tracing::info!("Build manifest version mismatch, ignoring it");
            }
        }
        Self::new()
    }

    /// Save the manifest into a public dir
    pub fn save(&self, public_dir: &Path) -> Result<()> {
        let path = public_dir.join(MANIFEST_FILE);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Whether a route was written by the last build
    pub fn contains(&self, route: &str) -> bool {
        self.routes.iter().any(|e| e.route == route)
    }
}
