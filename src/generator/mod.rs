//! Generator module - turns content store records into HTML pages
//!
//! [`enumerate_paths`] lists the routes known at build time,
//! [`PageBuilder`] fetches and renders one route, [`IncrementalSite`] keeps
//! rendered routes fresh, and [`StaticBuilder`] writes a full build to disk.

mod build;
mod incremental;

pub use build::{BuildReport, StaticBuilder};
pub use incremental::IncrementalSite;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::Context;

use crate::comments::{CommentForm, FormState};
use crate::config::SiteConfig;
use crate::content::{PortableTextRenderer, Post};
use crate::helpers::{self, Helpers};
use crate::store::{SharedStore, StoreError};
use crate::templates::{
    CommentView, FormView, PostView, SiteData, SummaryView, TemplateRenderer,
};

/// Errors while generating a page
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Fetching from the content store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A template failed to render
    #[error("template error: {0}")]
    Render(#[from] tera::Error),
}

/// A routable page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    /// The home page listing all posts
    Home,
    /// A post page, keyed by slug
    Post(String),
}

impl Route {
    /// URL path of the route
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Post(slug) => helpers::post_path(slug),
        }
    }

    /// Output file relative to the public dir
    pub fn output_path(&self) -> PathBuf {
        match self {
            Route::Home => PathBuf::from("index.html"),
            Route::Post(slug) => Path::new("post").join(slug).join("index.html"),
        }
    }
}

/// Outcome of fetching a post
#[derive(Debug)]
pub enum PageOutcome {
    Found(Post),
    NotFound,
}

/// A rendered route, with the post it was rendered from
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub route: Route,
    pub html: String,
    pub post: Option<Arc<Post>>,
}

/// Whether a slug can be used as a single path segment
///
/// Slugs become directories under the public dir, so separators and parent
/// references are rejected.
pub fn is_routable_slug(slug: &str) -> bool {
    !slug.trim().is_empty() && !slug.contains(['/', '\\']) && !slug.contains("..")
}

/// Fetch every post slug from the content store
///
/// The result is de-duplicated and sorted. Posts without a usable slug are
/// skipped. Store failures propagate.
pub async fn enumerate_paths(store: &SharedStore) -> Result<Vec<String>, StoreError> {
    let paths = store.post_paths().await?;

    let mut slugs = BTreeSet::new();
    for path in paths {
        match path.slug.map(|s| s.current).filter(|s| !s.trim().is_empty()) {
            Some(slug) if !is_routable_slug(&slug) => {
                tracing::warn!("Skipping post {} with unroutable slug {:?}", path.id, slug)
            }
            Some(slug) => {
                if !slugs.insert(slug.clone()) {
                    tracing::warn!("Duplicate slug {} (post {})", slug, path.id);
                }
            }
            None => tracing::warn!("Skipping post {} without a slug", path.id),
        }
    }

    tracing::info!("Enumerated {} post routes", slugs.len());
    Ok(slugs.into_iter().collect())
}

/// Fetches a route's content and renders it
pub struct PageBuilder {
    config: SiteConfig,
    store: SharedStore,
    renderer: TemplateRenderer,
    text: PortableTextRenderer,
    helpers: Helpers,
}

impl PageBuilder {
    /// Create a new page builder
    pub fn new(config: &SiteConfig, store: SharedStore) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.clone(),
            store,
            renderer: TemplateRenderer::new()?,
            text: PortableTextRenderer::new(config.store.clone()),
            helpers: Helpers::new(config.clone()),
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Fetch one post by slug; comments that are not approved are dropped
    pub async fn fetch_post(&self, slug: &str) -> Result<PageOutcome, StoreError> {
        match self.store.post_by_slug(slug).await? {
            Some(mut post) => {
                post.retain_approved_comments();
                Ok(PageOutcome::Found(post))
            }
            None => {
                tracing::debug!("No post for slug {}", slug);
                Ok(PageOutcome::NotFound)
            }
        }
    }

    /// Generate a route with a fresh comment form; `None` means not found
    pub async fn build(&self, route: &Route) -> Result<Option<RenderedPage>, GenerateError> {
        match route {
            Route::Home => self.build_home().await.map(Some),
            Route::Post(slug) => match self.fetch_post(slug).await? {
                PageOutcome::Found(post) => {
                    let form = CommentForm::new(post.id.clone());
                    let html = self.render_post(&post, &form)?;
                    tracing::debug!("Generated {}", route.path());
                    Ok(Some(RenderedPage {
                        route: route.clone(),
                        html,
                        post: Some(Arc::new(post)),
                    }))
                }
                PageOutcome::NotFound => Ok(None),
            },
        }
    }

    /// Generate the home page
    pub async fn build_home(&self) -> Result<RenderedPage, GenerateError> {
        let summaries = self.store.post_summaries().await?;
        let posts: Vec<SummaryView> = summaries
            .into_iter()
            .filter_map(|s| {
                let slug = s.slug.map(|slug| slug.current).filter(|c| is_routable_slug(c))?;
                let author = s.author.unwrap_or_default();
                Some(SummaryView {
                    title: s.title,
                    description: s.description,
                    path: helpers::post_path(&slug),
                    image: self.helpers.image_url(s.main_image.as_ref()),
                    author_name: author.name,
                    author_image: self.helpers.image_url(author.image.as_ref()),
                })
            })
            .collect();

        let mut context = self.base_context(
            &self.config.title,
            &self.config.description,
            "/",
            None,
        );
        context.insert("posts", &posts);

        let html = self.renderer.render("index.html", &context)?;
        Ok(RenderedPage {
            route: Route::Home,
            html,
            post: None,
        })
    }

    /// Render a post page with the comment form in the given state
    pub fn render_post(&self, post: &Post, form: &CommentForm) -> Result<String, GenerateError> {
        let author = post.author.clone().unwrap_or_default();
        let path = helpers::post_path(post.slug());
        let hero_image = self.helpers.image_url(post.main_image.as_ref());

        let view = PostView {
            id: post.id.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            slug: post.slug().to_string(),
            path: path.clone(),
            hero_image: hero_image.clone(),
            author_name: author.name,
            author_image: self.helpers.image_url(author.image.as_ref()),
            created_at: self.helpers.date(&post.created_at),
            created_at_iso: helpers::date_xml(&post.created_at),
            body_html: self.text.render(&post.body),
            // Approval is re-checked here so no render path can leak a pending comment
            comments: post
                .comments
                .iter()
                .filter(|c| c.approved)
                .map(|c| CommentView {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    comment: c.comment.clone(),
                })
                .collect(),
        };

        let mut context =
            self.base_context(&post.title, &post.description, &path, hero_image.as_deref());
        context.insert("post", &view);
        context.insert("form", &form_view(&path, form));

        Ok(self.renderer.render("post.html", &context)?)
    }

    /// Render the not-found page
    pub fn render_not_found(&self) -> Result<String, GenerateError> {
        let context = self.base_context(&self.config.title, "", "/", None);
        Ok(self.renderer.render("not_found.html", &context)?)
    }

    /// Create a base context with common variables
    fn base_context(
        &self,
        title: &str,
        description: &str,
        path: &str,
        image: Option<&str>,
    ) -> Context {
        let site = SiteData {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            url: self.config.url.clone(),
        };
        let meta = format!(
            "{}\n{}",
            helpers::meta_generator(),
            helpers::open_graph(
                title,
                description,
                &self.helpers.full_url_for(path),
                image,
                &self.config.title,
            )
        );

        let mut context = Context::new();
        context.insert("site", &site);
        context.insert("meta", &meta);
        context
    }
}

/// Project the form state into template data
fn form_view(action: &str, form: &CommentForm) -> FormView {
    let mut view = FormView {
        action: action.to_string(),
        post_id: form.post_id().to_string(),
        submitted: false,
        name: String::new(),
        email: String::new(),
        comment: String::new(),
        errors: Vec::new(),
        failure: None,
    };

    match form.state() {
        FormState::Editing {
            values,
            errors,
            failure,
        } => {
            view.name = values.name.clone();
            view.email = values.email.clone();
            view.comment = values.comment.clone();
            view.errors = errors.clone();
            view.failure = failure.clone();
        }
        FormState::Submitting { comment } => {
            view.name = comment.name.clone();
            view.email = comment.email.clone();
            view.comment = comment.comment.clone();
        }
        FormState::Submitted => view.submitted = true,
    }

    view
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::comments::CommentInput;
    use crate::content::{Author, Block, ImageRef};
    use crate::store::memory::tests::{comment, sample_post};
    use crate::store::MemoryStore;

    pub(crate) fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.title = "Test Blog".to_string();
        config.store.project_id = "proj".to_string();
        config
    }

    pub(crate) fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut post = sample_post("p1", "hello-world");
        post.title = "Hello World".to_string();
        post.author = Some(Author {
            name: "Jane Writer".to_string(),
            image: Some(ImageRef::from_ref("image-abc-100x100-png")),
        });
        post.main_image = Some(ImageRef::from_ref("image-hero-1600x900-jpg"));
        post.body = serde_json::from_str::<Vec<Block>>(
            r#"[{ "_type": "block", "style": "h1", "children": [{ "text": "Intro" }] }]"#,
        )
        .unwrap();
        store.insert_post(post);
        store.insert_post(sample_post("p2", "second"));
        store.insert_comment(comment("c1", "p1", true));
        store.insert_comment(comment("c2", "p1", false));
        store
    }

    fn builder(store: Arc<MemoryStore>) -> PageBuilder {
        PageBuilder::new(&test_config(), store).unwrap()
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Post("a".to_string()).path(), "/post/a");
        assert_eq!(Route::Post("what?now".to_string()).path(), "/post/what%3Fnow");
        assert_eq!(
            Route::Post("a".to_string()).output_path(),
            Path::new("post/a/index.html")
        );
    }

    #[tokio::test]
    async fn test_enumerate_paths_sorted_and_deduplicated() {
        let store = Arc::new(MemoryStore::new());
        store.insert_post(sample_post("p1", "zeta"));
        store.insert_post(sample_post("p2", "alpha"));
        store.insert_post(sample_post("p3", "zeta"));
        store.insert_post(sample_post("p4", ""));
        let shared: SharedStore = store;

        assert_eq!(enumerate_paths(&shared).await.unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_routable_slugs() {
        assert!(is_routable_slug("hello-world"));
        assert!(is_routable_slug("what?now"));
        assert!(!is_routable_slug(""));
        assert!(!is_routable_slug("../../escaped"));
        assert!(!is_routable_slug("/etc/x"));
        assert!(!is_routable_slug("a\\b"));
        assert!(!is_routable_slug(".."));
    }

    #[tokio::test]
    async fn test_enumerate_paths_skips_unroutable_slugs() {
        let store = Arc::new(MemoryStore::new());
        store.insert_post(sample_post("p1", "ok"));
        store.insert_post(sample_post("p2", "../../escaped"));
        store.insert_post(sample_post("p3", "/etc/x"));
        let shared: SharedStore = store;

        assert_eq!(enumerate_paths(&shared).await.unwrap(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_enumerate_paths_empty_and_failing() {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        assert!(enumerate_paths(&shared).await.unwrap().is_empty());

        store.set_failing(true);
        assert!(enumerate_paths(&shared).await.is_err());
    }

    #[tokio::test]
    async fn test_every_enumerated_slug_builds_or_is_not_found() {
        let store = seeded_store();
        let shared: SharedStore = store.clone();
        let builder = builder(store);

        for slug in enumerate_paths(&shared).await.unwrap() {
            let page = builder.build(&Route::Post(slug.clone())).await.unwrap();
            assert!(page.is_some(), "slug {} should build", slug);
        }
        assert!(builder
            .build(&Route::Post("unknown".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_post_page_content() {
        let builder = builder(seeded_store());
        let page = builder
            .build(&Route::Post("hello-world".to_string()))
            .await
            .unwrap()
            .unwrap();

        assert!(page.html.contains("<h1>Hello World</h1>"));
        assert!(page.html.contains("Jane Writer"));
        assert!(page.html.contains("Published at"));
        assert!(page.html.contains("03/01/2022"));
        assert!(page
            .html
            .contains("https://cdn.sanity.io/images/proj/production/hero-1600x900.jpg"));
        assert!(page.html.contains(r#"<h1 class="my-5 text-2xl font-bold">Intro</h1>"#));
        assert!(page.html.contains("text-c1"));
        assert!(!page.html.contains("text-c2"));
        assert!(page.html.contains(r#"<form class="comment-form""#));
        assert!(!page.html.contains("Thank you for submitting"));
    }

    #[tokio::test]
    async fn test_unapproved_comments_never_rendered() {
        let builder = builder(seeded_store());
        let mut post = sample_post("p9", "mixed");
        post.comments = vec![
            comment("ok-1", "p9", true),
            comment("pending-1", "p9", false),
            comment("ok-2", "p9", true),
            comment("pending-2", "p9", false),
        ];

        let html = builder
            .render_post(&post, &CommentForm::new("p9"))
            .unwrap();
        assert!(html.contains("text-ok-1"));
        assert!(html.contains("text-ok-2"));
        assert!(!html.contains("pending"));
    }

    #[tokio::test]
    async fn test_comment_text_is_escaped() {
        let builder = builder(seeded_store());
        let mut post = sample_post("p9", "x");
        let mut evil = comment("c9", "p9", true);
        evil.comment = "<script>alert(1)</script>".to_string();
        post.comments = vec![evil];

        let html = builder.render_post(&post, &CommentForm::new("p9")).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_form_states_render() {
        let builder = builder(seeded_store());
        let post = sample_post("p9", "x");

        let mut form = CommentForm::new("p9");
        form.submit(&CommentInput::default());
        let html = builder.render_post(&post, &form).unwrap();
        assert!(html.contains("The Name Field is required"));
        assert!(html.contains("The Email Field is required"));
        assert!(html.contains("The Comment Field is required"));

        let mut form = CommentForm::new("p9");
        form.submit(&CommentInput {
            post_id: String::new(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            comment: "Great post!".to_string(),
        });
        form.resolve(Ok(()));
        let html = builder.render_post(&post, &form).unwrap();
        assert!(html.contains("Thank you for submitting your comment!"));
        assert!(!html.contains("<form"));
    }

    #[tokio::test]
    async fn test_links_encode_reserved_characters() {
        let store = seeded_store();
        store.insert_post(sample_post("p3", "what?now"));
        let builder = builder(store);

        let home = builder.build(&Route::Home).await.unwrap().unwrap();
        assert!(home.html.contains(r#"href="/post/what%3Fnow""#));

        let page = builder
            .build(&Route::Post("what?now".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert!(page.html.contains(r#"action="/post/what%3Fnow""#));
    }

    #[tokio::test]
    async fn test_home_lists_posts() {
        let builder = builder(seeded_store());
        let page = builder.build(&Route::Home).await.unwrap().unwrap();
        assert!(page.html.contains(r#"href="/post/hello-world""#));
        assert!(page.html.contains(r#"href="/post/second""#));
        assert!(page.post.is_none());
    }
}
