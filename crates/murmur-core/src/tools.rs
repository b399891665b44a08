//! Single-shot tools the agent calls back into.
//!
//! Each tool is one request/response on behalf of the bot's own account;
//! none of them touch the conversation lock.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use murmur_types::blog::{BLOG_COLLECTION, BlogEntry};
use murmur_types::error::{DecodeError, NetworkError};
use murmur_types::post::StrongRef;
use thiserror::Error;
use tracing::info;

use crate::network::{RecordCreate, SocialClient};
use crate::record::TidClock;
use crate::reply::ReplyComposer;

/// Posts fetched for the recent-posts tool.
pub const RECENT_POSTS_LIMIT: u32 = 50;

const BLOG_CONTENT_START: &str = "<BEGIN_WHITEWIND_CONTENT>";
const BLOG_CONTENT_END: &str = "<END_WHITEWIND_CONTENT>";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("text is empty")]
    EmptyText,
}

pub struct ToolService<S> {
    social: Arc<S>,
    composer: ReplyComposer,
    clock: Arc<TidClock>,
}

impl<S: SocialClient> ToolService<S> {
    pub fn new(social: Arc<S>, composer: ReplyComposer, clock: Arc<TidClock>) -> Self {
        Self {
            social,
            composer,
            clock,
        }
    }

    /// A user's recent posts as one text block, newest first. Reposts of
    /// other authors are left out.
    pub async fn recent_posts(&self, did: &str) -> Result<String, ToolError> {
        let feed = self.social.author_feed(did, RECENT_POSTS_LIMIT).await?;

        let mut text = String::from("<BEGIN POSTS>\n");
        for item in feed.iter().filter(|item| item.post.author.did == did) {
            let Some(post_text) = item.post.record.get("text").and_then(|t| t.as_str()) else {
                continue;
            };
            text.push_str("<BEGIN POST>");
            text.push_str(post_text);
            text.push_str("<END POST>\n");
        }
        text.push_str("<END POSTS>");
        Ok(text)
    }

    /// Publish `text` as a new thread. Returns the posts written.
    pub async fn create_top_level_post(&self, text: &str) -> Result<Vec<StrongRef>, ToolError> {
        let thread = self.composer.compose_top_level(text)?;
        if thread.is_empty() {
            return Err(ToolError::EmptyText);
        }
        self.composer.publish(self.social.as_ref(), &thread).await?;
        info!(chunks = thread.writes.len(), "published top-level post");
        Ok(thread.chain.links().to_vec())
    }

    /// Publish a long-form blog entry and return its public URL.
    pub async fn create_blog_post(&self, title: &str, text: &str) -> Result<String, ToolError> {
        let content = strip_blog_markers(text);
        if content.is_empty() {
            return Err(ToolError::EmptyText);
        }

        let entry = BlogEntry::new(
            title,
            content,
            Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        );
        let rkey = self.clock.next().to_string();
        let write = RecordCreate {
            collection: BLOG_COLLECTION.to_string(),
            rkey: rkey.clone(),
            value: serde_json::to_value(&entry).map_err(|e| DecodeError::Encode(e.to_string()))?,
        };

        let bot = self.composer.bot_did();
        let created = self.social.create_record(bot, &write).await?;
        info!(uri = %created.uri, "published blog entry");
        Ok(format!("https://whtwnd.com/{bot}/{rkey}"))
    }
}

fn strip_blog_markers(text: &str) -> String {
    text.replace(BLOG_CONTENT_START, "")
        .replace(BLOG_CONTENT_END, "")
        .trim()
        .to_string()
}
