//! GROQ queries issued against the content store

/// Every post's id and slug, for path enumeration
pub const POST_PATHS: &str = r#"*[_type == "post"] {
  _id,
  slug {
    current
  }
}"#;

/// One post by slug, with its author dereferenced and only approved comments
pub const POST_BY_SLUG: &str = r#"*[_type == "post" && slug.current == $slug][0] {
  _id,
  _createdAt,
  title,
  author -> {
    name,
    image
  },
  "comments": *[
    _type == "comment" &&
    post._ref == ^._id &&
    approved == true
  ],
  description,
  mainImage,
  slug,
  body
}"#;

/// Home page cards, newest first
pub const POST_SUMMARIES: &str = r#"*[_type == "post"] | order(_createdAt desc) {
  _id,
  title,
  author -> {
    name,
    image
  },
  description,
  mainImage,
  slug
}"#;

/// Encode a query parameter value the way the query API expects (JSON)
pub fn param(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
