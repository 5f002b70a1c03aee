//! URL helper functions

use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::config::{SiteConfig, StoreConfig};
use crate::content::ImageRef;

lazy_static! {
    /// `image-<assetId>-<width>x<height>-<format>`
    static ref IMAGE_REF: Regex =
        Regex::new(r"^image-([A-Za-z0-9]+)-(\d+x\d+)-([a-z0-9]+)$").expect("valid image ref pattern");
}

const IMAGE_CDN: &str = "https://cdn.sanity.io/images";

/// Characters escaped in a path segment (RFC 3986 unreserved ones stay)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Route path of a post page
///
/// # Examples
/// ```ignore
/// post_path("my-first-post") // -> "/post/my-first-post"
/// post_path("what?now")      // -> "/post/what%3Fnow"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/post/{}", encode_segment(slug))
}

/// Percent-encode one URL path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/post/hello") // -> "https://example.com/post/hello"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Resolve an image reference to a CDN URL
///
/// An already resolved `asset.url` wins; otherwise the asset id is turned
/// into a CDN path for the configured project and dataset. Malformed
/// references resolve to `None`.
pub fn image_url(store: &StoreConfig, image: &ImageRef) -> Option<String> {
    let asset = image.asset.as_ref()?;

    if let Some(url) = asset.url.as_deref().filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }

    let reference = asset.reference.as_deref()?;
    let caps = IMAGE_REF.captures(reference)?;
    Some(format!(
        "{}/{}/{}/{}-{}.{}",
        IMAGE_CDN, store.project_id, store.dataset, &caps[1], &caps[2], &caps[3]
    ))
}
