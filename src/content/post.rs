//! Post, Author and Comment models as projected by the content store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::portable_text::Block;

/// Treat an explicit `null` the same as a missing field
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A blog post with its author and approved comments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(default, deserialize_with = "null_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    pub slug: Slug,

    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,

    /// Portable Text body
    #[serde(default, deserialize_with = "null_default")]
    pub body: Vec<Block>,

    /// Dereferenced author document
    #[serde(default)]
    pub author: Option<Author>,

    /// Approved comments only
    #[serde(default, deserialize_with = "null_default")]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Routing key of this post
    pub fn slug(&self) -> &str {
        &self.slug.current
    }

    /// Drop every comment that has not passed moderation
    pub fn retain_approved_comments(&mut self) {
        let before = self.comments.len();
        self.comments.retain(|c| c.approved);
        let dropped = before - self.comments.len();
        if dropped > 0 {
            tracing::warn!(
                "Dropped {} unapproved comment(s) from post {}",
                dropped,
                self.slug()
            );
        }
    }
}

/// Slug object (`slug.current`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default, deserialize_with = "null_default")]
    pub current: String,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
        }
    }
}

/// Post author, embedded by value at query time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// Reference to an image asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub asset: Option<AssetRef>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl ImageRef {
    /// Image pointing at an asset document id
    pub fn from_ref(asset_ref: impl Into<String>) -> Self {
        Self {
            asset: Some(AssetRef {
                reference: Some(asset_ref.into()),
                url: None,
            }),
            alt: None,
        }
    }
}

/// Asset pointer: either a document reference or an already resolved URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Reference to another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// A reader comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Moderation gate
    #[serde(default, deserialize_with = "null_default")]
    pub approved: bool,

    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub email: String,

    #[serde(default, deserialize_with = "null_default")]
    pub comment: String,

    #[serde(default)]
    pub post: Option<Reference>,
}

/// Path enumeration projection: `{ _id, slug { current } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPath {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub slug: Option<Slug>,
}

/// Home page projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,
}

/// Payload of a comment creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    /// Id of the post being commented on
    #[serde(rename = "_id")]
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
}
