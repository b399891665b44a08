//! Long-form blog entry record published by the blog tool.

use serde::{Deserialize, Serialize};

pub const BLOG_COLLECTION: &str = "com.whtwnd.blog.entry";

/// A `com.whtwnd.blog.entry` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogEntry {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub content: String,
    pub created_at: String,
    pub theme: String,
    pub title: String,
    pub visibility: String,
    pub subtitle: String,
}

impl BlogEntry {
    /// A link-visible entry rendered with the default light theme.
    pub fn new(title: impl Into<String>, content: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            record_type: BLOG_COLLECTION.to_string(),
            content: content.into(),
            created_at: created_at.into(),
            theme: "github-light".to_string(),
            title: title.into(),
            visibility: "url".to_string(),
            subtitle: String::new(),
        }
    }
}
