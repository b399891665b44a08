//! Read-side views returned by the social network API.

use serde::{Deserialize, Serialize};

/// Public profile of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Author reference inside a post view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub did: String,
    #[serde(default)]
    pub handle: String,
}

/// Hydrated post as returned by feed endpoints.
///
/// The record is kept as raw JSON; callers decode it into a
/// [`FeedPost`](crate::post::FeedPost) when they need the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: PostAuthor,
    pub record: serde_json::Value,
}

/// One entry of an author feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
}

/// Archived post used to reconstruct a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPost {
    pub uri: String,
    pub did: String,
    pub text: String,
    #[serde(default)]
    pub parent_uri: Option<String>,
    #[serde(default)]
    pub root_uri: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
