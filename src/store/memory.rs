//! In-process content store
//!
//! Holds posts and a single comment collection. Approval is applied when a
//! post is read, so moderation only ever flips the flag on a stored comment.
//! Used for offline fixtures and tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{ContentStore, StoreError};
use crate::content::{Comment, NewComment, Post, PostPath, PostSummary, Reference};

/// Fixture file layout: `{ "posts": [...], "comments": [...] }`
#[derive(Debug, Default, Deserialize)]
struct Fixtures {
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// Content store kept in memory
#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
    failing: AtomicBool,
    post_reads: AtomicUsize,
    next_comment: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load posts and comments from a JSON fixture file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures {:?}", path))?;
        let fixtures: Fixtures = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures {:?}", path))?;

        let store = Self::new();
        for post in fixtures.posts {
            store.insert_post(post);
        }
        for comment in fixtures.comments {
            store.insert_comment(comment);
        }
        tracing::info!(
            "Loaded {} posts and {} comments from {:?}",
            store.read_posts().len(),
            store.read_comments().len(),
            path
        );
        Ok(store)
    }

    /// Add or replace a post (matched by id)
    pub fn insert_post(&self, mut post: Post) {
        // Comments live in the comment collection, never on the stored post
        let embedded = std::mem::take(&mut post.comments);
        for mut comment in embedded {
            if comment.post.is_none() {
                comment.post = Some(Reference {
                    reference: post.id.clone(),
                });
            }
            self.insert_comment(comment);
        }

        let mut posts = self.write_posts();
        posts.retain(|p| p.id != post.id);
        posts.push(post);
    }

    /// Add a comment as-is
    pub fn insert_comment(&self, comment: Comment) {
        self.write_comments().push(comment);
    }

    /// Moderation action: mark a comment approved
    pub fn approve_comment(&self, id: &str) -> bool {
        let mut comments = self.write_comments();
        match comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => {
                comment.approved = true;
                comment.updated_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Snapshot of every stored comment, approved or not
    pub fn comments(&self) -> Vec<Comment> {
        self.read_comments().clone()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of single-post reads served so far
    pub fn post_reads(&self) -> usize {
        self.post_reads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store marked as failing".to_string()));
        }
        Ok(())
    }

    // A poisoned lock only means another thread panicked mid-write; the
    // collections are still structurally valid.
    fn read_posts(&self) -> std::sync::RwLockReadGuard<'_, Vec<Post>> {
        self.posts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_posts(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Post>> {
        self.posts.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_comments(&self) -> std::sync::RwLockReadGuard<'_, Vec<Comment>> {
        self.comments.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_comments(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Comment>> {
        self.comments.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn post_paths(&self) -> Result<Vec<PostPath>, StoreError> {
        self.check_available()?;
        Ok(self
            .read_posts()
            .iter()
            .map(|p| PostPath {
                id: p.id.clone(),
                slug: Some(p.slug.clone()),
            })
            .collect())
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        self.check_available()?;
        self.post_reads.fetch_add(1, Ordering::SeqCst);

        let Some(mut post) = self
            .read_posts()
            .iter()
            .find(|p| p.slug.current == slug)
            .cloned()
        else {
            return Ok(None);
        };

        post.comments = self
            .read_comments()
            .iter()
            .filter(|c| c.approved)
            .filter(|c| c.post.as_ref().map(|r| r.reference == post.id).unwrap_or(false))
            .cloned()
            .collect();

        Ok(Some(post))
    }

    async fn post_summaries(&self) -> Result<Vec<PostSummary>, StoreError> {
        self.check_available()?;
        let mut posts: Vec<_> = self.read_posts().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts
            .into_iter()
            .map(|p| PostSummary {
                id: p.id,
                title: p.title,
                description: p.description,
                slug: Some(p.slug),
                author: p.author,
                main_image: p.main_image,
            })
            .collect())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<(), StoreError> {
        self.check_available()?;
        let n = self.next_comment.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        self.insert_comment(Comment {
            id: format!("comment-{}", n),
            created_at: Some(now),
            updated_at: Some(now),
            approved: false,
            name: comment.name.clone(),
            email: comment.email.clone(),
            comment: comment.comment.clone(),
            post: Some(Reference {
                reference: comment.post_id.clone(),
            }),
        });
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::Slug;
    use chrono::TimeZone;

    pub(crate) fn sample_post(id: &str, slug: &str) -> Post {
        Post {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap(),
            title: format!("Title of {}", slug),
            description: "A description".to_string(),
            slug: Slug::new(slug),
            main_image: None,
            body: Vec::new(),
            author: None,
            comments: Vec::new(),
        }
    }

    pub(crate) fn comment(id: &str, post_id: &str, approved: bool) -> Comment {
        Comment {
            id: id.to_string(),
            created_at: None,
            updated_at: None,
            approved,
            name: format!("name-{}", id),
            email: "x@example.com".to_string(),
            comment: format!("text-{}", id),
            post: Some(Reference {
                reference: post_id.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_post_by_slug_only_includes_approved_comments() {
        let store = MemoryStore::new();
        store.insert_post(sample_post("p1", "one"));
        store.insert_post(sample_post("p2", "two"));
        store.insert_comment(comment("c1", "p1", true));
        store.insert_comment(comment("c2", "p1", false));
        store.insert_comment(comment("c3", "p2", true));

        let post = store.post_by_slug("one").await.unwrap().unwrap();
        let ids: Vec<_> = post.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1"]);
    }

    #[tokio::test]
    async fn test_missing_slug() {
        let store = MemoryStore::new();
        assert!(store.post_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_created_comment_is_pending_until_approved() {
        let store = MemoryStore::new();
        store.insert_post(sample_post("p1", "one"));
        store
            .create_comment(&NewComment {
                post_id: "p1".to_string(),
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                comment: "Great post!".to_string(),
            })
            .await
            .unwrap();

        let stored = store.comments();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].approved);
        assert!(store.post_by_slug("one").await.unwrap().unwrap().comments.is_empty());

        assert!(store.approve_comment(&stored[0].id));
        let post = store.post_by_slug("one").await.unwrap().unwrap();
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].comment, "Great post!");
    }

    #[tokio::test]
    async fn test_embedded_comments_move_to_comment_store() {
        let store = MemoryStore::new();
        let mut post = sample_post("p1", "one");
        let mut pending = comment("c1", "p1", false);
        pending.post = None;
        post.comments.push(pending);
        store.insert_post(post);

        assert_eq!(store.comments().len(), 1);
        assert!(store.post_by_slug("one").await.unwrap().unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(matches!(
            store.post_paths().await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_load_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"{
                "posts": [{ "_id": "p1", "_createdAt": "2022-01-01T00:00:00Z", "slug": { "current": "one" } }],
                "comments": [{ "_id": "c1", "approved": true, "name": "A", "comment": "hi", "post": { "_ref": "p1" } }]
            }"#,
        )
        .unwrap();

        let store = MemoryStore::load(&path).unwrap();
        assert_eq!(store.comments().len(), 1);
    }
}
