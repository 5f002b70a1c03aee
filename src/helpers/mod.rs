//! Helper functions for templates
//!
//! Formatting, escaping and URL building shared by the page renderer and
//! the Portable Text serializer.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::ImageRef;

/// Collection of helpers bound to a site configuration
#[derive(Clone)]
pub struct Helpers {
    config: SiteConfig,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// Get full_url_for helper
    pub fn full_url_for(&self, path: &str) -> String {
        full_url_for(&self.config, path)
    }

    /// Resolve an image to its CDN URL
    pub fn image_url(&self, image: Option<&ImageRef>) -> Option<String> {
        image.and_then(|img| image_url(&self.config.store, img))
    }

    /// Format a date with the configured format
    pub fn date(&self, date: &DateTime<Utc>) -> String {
        format_date(date, &self.config.date_format)
    }
}
