//! Portable Text rendering
//!
//! Post bodies arrive as a flat sequence of typed blocks. Text blocks carry
//! spans with decorator marks (`strong`, `em`, ...) and annotation marks that
//! point into the block's `markDefs` (links). Consecutive list items are
//! grouped into `<ul>`/`<ol>` containers.

use serde::{Deserialize, Serialize};

use super::post::{null_default, ImageRef};
use crate::config::StoreConfig;
use crate::helpers::{html_escape, image_url, safe_href};

/// A top-level body block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Block {
    #[serde(rename = "block")]
    Text(TextBlock),
    #[serde(rename = "image")]
    Image(ImageRef),
    /// Custom block types this renderer does not know about
    #[serde(other)]
    Unknown,
}

/// A paragraph, heading, quote or list item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default = "default_style", deserialize_with = "null_style")]
    pub style: String,
    #[serde(default, deserialize_with = "null_default")]
    pub children: Vec<Span>,
    #[serde(rename = "markDefs", default, deserialize_with = "null_default")]
    pub mark_defs: Vec<MarkDef>,
    /// `bullet` or `number` when the block is a list item
    #[serde(rename = "listItem", default)]
    pub list_item: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
}

fn default_style() -> String {
    "normal".to_string()
}

fn null_style<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_style))
}

/// A run of text with marks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Span {
    #[serde(default, deserialize_with = "null_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_default")]
    pub marks: Vec<String>,
}

/// Annotation definition referenced by span marks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    fn from_item(item: &str) -> Self {
        match item {
            "number" => ListKind::Number,
            _ => ListKind::Bullet,
        }
    }

    fn open_tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "<ul>",
            ListKind::Number => "<ol>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "</ul>",
            ListKind::Number => "</ol>",
        }
    }
}

/// Serializes Portable Text blocks to HTML
pub struct PortableTextRenderer {
    store: StoreConfig,
}

impl PortableTextRenderer {
    /// Create a renderer resolving images against the given store
    pub fn new(store: StoreConfig) -> Self {
        Self { store }
    }

    /// Render a block sequence to HTML
    pub fn render(&self, blocks: &[Block]) -> String {
        let mut html = String::new();
        let mut open_list: Option<ListKind> = None;

        for block in blocks {
            let list_kind = match block {
                Block::Text(text) => text.list_item.as_deref().map(ListKind::from_item),
                _ => None,
            };

            if open_list != list_kind {
                if let Some(kind) = open_list.take() {
                    html.push_str(kind.close_tag());
                }
                if let Some(kind) = list_kind {
                    html.push_str(kind.open_tag());
                    open_list = Some(kind);
                }
            }

            match block {
                Block::Text(text) => self.render_text_block(text, &mut html),
                Block::Image(image) => self.render_image(image, &mut html),
                Block::Unknown => {
                    tracing::debug!("Skipping unknown block type");
                }
            }
        }

        if let Some(kind) = open_list {
            html.push_str(kind.close_tag());
        }

        html
    }

    fn render_text_block(&self, block: &TextBlock, html: &mut String) {
        let inner = render_spans(&block.children, &block.mark_defs);

        if block.list_item.is_some() {
            html.push_str(&format!(r#"<li class="ml-4 list-disc">{}</li>"#, inner));
            return;
        }

        let element = match block.style.as_str() {
            "h1" => r#"<h1 class="my-5 text-2xl font-bold">"#,
            "h2" => r#"<h2 class="my-5 text-xl font-bold">"#,
            "h3" => r#"<h3 class="my-4 text-lg font-bold">"#,
            "h4" => r#"<h4 class="my-4 font-bold">"#,
            "blockquote" => r#"<blockquote class="border-l-4 pl-4 italic">"#,
            _ => "<p>",
        };
        let close = match block.style.as_str() {
            "h1" => "</h1>",
            "h2" => "</h2>",
            "h3" => "</h3>",
            "h4" => "</h4>",
            "blockquote" => "</blockquote>",
            _ => "</p>",
        };

        html.push_str(element);
        html.push_str(&inner);
        html.push_str(close);
    }

    fn render_image(&self, image: &ImageRef, html: &mut String) {
        match image_url(&self.store, image) {
            Some(src) => {
                let alt = image.alt.as_deref().unwrap_or("");
                html.push_str(&format!(
                    r#"<figure><img src="{}" alt="{}" loading="lazy"></figure>"#,
                    html_escape(&src),
                    html_escape(alt)
                ));
            }
            None => tracing::debug!("Skipping image block without a resolvable asset"),
        }
    }
}

/// Render spans, wrapping each in its marks
fn render_spans(spans: &[Span], mark_defs: &[MarkDef]) -> String {
    let mut html = String::new();

    for span in spans {
        let mut closes: Vec<&'static str> = Vec::new();

        for mark in &span.marks {
            match decorator_tags(mark) {
                Some((open, close)) => {
                    html.push_str(open);
                    closes.push(close);
                }
                None => {
                    if let Some(def) = mark_defs.iter().find(|d| &d.key == mark) {
                        if let Some(href) = def.href.as_deref().and_then(safe_href) {
                            if def.kind == "link" {
                                html.push_str(&format!(
                                    r#"<a href="{}" class="text-blue-500 hover:underline">"#,
                                    href
                                ));
                                closes.push("</a>");
                            }
                        }
                    }
                }
            }
        }

        html.push_str(&html_escape(&span.text).replace('\n', "<br>"));

        for close in closes.iter().rev() {
            html.push_str(close);
        }
    }

    html
}

fn decorator_tags(mark: &str) -> Option<(&'static str, &'static str)> {
    match mark {
        "strong" => Some(("<strong>", "</strong>")),
        "em" => Some(("<em>", "</em>")),
        "code" => Some(("<code>", "</code>")),
        "underline" => Some(("<u>", "</u>")),
        "strike-through" => Some(("<s>", "</s>")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> PortableTextRenderer {
        let mut store = StoreConfig::default();
        store.project_id = "proj".to_string();
        PortableTextRenderer::new(store)
    }

    fn parse(json: &str) -> Vec<Block> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = parse(
            r#"[
            { "_type": "block", "style": "h1", "children": [{ "_type": "span", "text": "Title" }] },
            { "_type": "block", "style": "h2", "children": [{ "_type": "span", "text": "Sub" }] },
            { "_type": "block", "style": "normal", "children": [{ "_type": "span", "text": "Body <text>" }] }
        ]"#,
        );
        let html = renderer().render(&blocks);
        assert_eq!(
            html,
            r#"<h1 class="my-5 text-2xl font-bold">Title</h1><h2 class="my-5 text-xl font-bold">Sub</h2><p>Body &lt;text&gt;</p>"#
        );
    }

    #[test]
    fn test_list_items_grouped() {
        let blocks = parse(
            r#"[
            { "_type": "block", "listItem": "bullet", "children": [{ "text": "one" }] },
            { "_type": "block", "listItem": "bullet", "children": [{ "text": "two" }] },
            { "_type": "block", "listItem": "number", "children": [{ "text": "first" }] },
            { "_type": "block", "children": [{ "text": "after" }] }
        ]"#,
        );
        let html = renderer().render(&blocks);
        assert_eq!(
            html,
            concat!(
                r#"<ul><li class="ml-4 list-disc">one</li><li class="ml-4 list-disc">two</li></ul>"#,
                r#"<ol><li class="ml-4 list-disc">first</li></ol>"#,
                "<p>after</p>"
            )
        );
    }

    #[test]
    fn test_links_and_decorators() {
        let blocks = parse(
            r#"[{
            "_type": "block",
            "markDefs": [{ "_key": "k1", "_type": "link", "href": "https://rust-lang.org" }],
            "children": [
                { "text": "see ", "marks": ["strong"] },
                { "text": "here", "marks": ["k1", "em"] }
            ]
        }]"#,
        );
        let html = renderer().render(&blocks);
        assert_eq!(
            html,
            r#"<p><strong>see </strong><a href="https://rust-lang.org" class="text-blue-500 hover:underline"><em>here</em></a></p>"#
        );
    }

    #[test]
    fn test_script_links_are_dropped() {
        let blocks = parse(
            r#"[{
            "_type": "block",
            "markDefs": [{ "_key": "bad", "_type": "link", "href": "javascript:alert(1)" }],
            "children": [{ "text": "click", "marks": ["bad"] }]
        }]"#,
        );
        assert_eq!(renderer().render(&blocks), "<p>click</p>");
    }

    #[test]
    fn test_images_and_unknown_blocks() {
        let blocks = parse(
            r#"[
            { "_type": "image", "asset": { "_ref": "image-abc-10x20-png" }, "alt": "pic" },
            { "_type": "youtube", "url": "https://youtu.be/x" },
            { "_type": "image", "asset": { "_ref": "broken" } }
        ]"#,
        );
        let html = renderer().render(&blocks);
        assert_eq!(
            html,
            r#"<figure><img src="https://cdn.sanity.io/images/proj/production/abc-10x20.png" alt="pic" loading="lazy"></figure>"#
        );
    }

    #[test]
    fn test_list_closed_before_image() {
        let blocks = parse(
            r#"[
            { "_type": "block", "listItem": "bullet", "children": [{ "text": "a" }] },
            { "_type": "image", "asset": { "url": "https://x.io/a.png" } }
        ]"#,
        );
        let html = renderer().render(&blocks);
        assert!(html.starts_with("<ul>"));
        assert!(html.contains("</ul><figure>"));
    }
}
