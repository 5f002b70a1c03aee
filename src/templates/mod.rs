//! Built-in templates using the Tera template engine
//!
//! The templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template because comment names and bodies are reader-supplied;
//! only the pre-rendered post body and meta tags are inserted with `safe`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("medium/layout.html")),
            ("index.html", include_str!("medium/index.html")),
            ("post.html", include_str!("medium/post.html")),
            ("not_found.html", include_str!("medium/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("medium/partials/header.html"),
            ),
            (
                "partials/comment_form.html",
                include_str!("medium/partials/comment_form.html"),
            ),
            (
                "partials/comments.html",
                include_str!("medium/partials/comments.html"),
            ),
        ])?;

        // Leave `/` alone so URLs and dates stay readable in the output
        tera.set_escape_fn(crate::helpers::html_escape);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(template_name, context)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(crate::helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub path: String,
    pub hero_image: Option<String>,
    pub author_name: String,
    pub author_image: Option<String>,
    pub created_at: String,
    pub created_at_iso: String,
    pub body_html: String,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub action: String,
    pub post_id: String,
    pub submitted: bool,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub errors: Vec<String>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub title: String,
    pub description: String,
    pub path: String,
    pub image: Option<String>,
    pub author_name: String,
    pub author_image: Option<String>,
}
