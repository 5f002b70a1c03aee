//! Content module - posts, authors, comments and body rendering

mod portable_text;
mod post;

pub use portable_text::{Block, MarkDef, PortableTextRenderer, Span, TextBlock};
pub use post::{
    AssetRef, Author, Comment, ImageRef, NewComment, Post, PostPath, PostSummary, Reference, Slug,
};
