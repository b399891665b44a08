//! Thread context reconstruction.
//!
//! Rebuilds the conversation leading up to a reply by walking parent
//! pointers backward through archived posts of the same thread.

use std::collections::HashMap;
use std::sync::Arc;

use murmur_types::error::RepositoryError;
use murmur_types::post::ReplyRef;
use murmur_types::profile::HistoricalPost;
use tracing::{debug, warn};

use crate::repository::archive::PostArchive;

/// Builds the chronological text of a thread from the post archive.
pub struct ThreadContextBuilder<A> {
    archive: Arc<A>,
    depth_limit: usize,
    window_days: u32,
}

impl<A: PostArchive> ThreadContextBuilder<A> {
    pub fn new(archive: Arc<A>, depth_limit: usize, window_days: u32) -> Self {
        Self {
            archive,
            depth_limit,
            window_days,
        }
    }

    /// Thread text ending at the reply's parent, oldest post first.
    ///
    /// Empty when there is no reply reference or nothing is archived for
    /// the thread.
    pub async fn build(&self, reply: Option<&ReplyRef>) -> Result<String, RepositoryError> {
        let Some(reply) = reply else {
            return Ok(String::new());
        };

        let posts = self
            .archive
            .thread_posts(&reply.root.uri, self.window_days)
            .await?;
        if posts.is_empty() {
            return Ok(String::new());
        }

        Ok(walk_thread(&posts, &reply.parent.uri, self.depth_limit))
    }
}

/// Walk from `start_uri` up the parent chain, at most `depth_limit` hops.
fn walk_thread(posts: &[HistoricalPost], start_uri: &str, depth_limit: usize) -> String {
    let index: HashMap<&str, &HistoricalPost> =
        posts.iter().map(|post| (post.uri.as_str(), post)).collect();

    let mut lines = Vec::new();
    let mut current = Some(start_uri);
    while let Some(uri) = current {
        let Some(post) = index.get(uri) else {
            break;
        };
        if lines.len() >= depth_limit {
            warn!(start = %start_uri, depth_limit, "thread walk hit depth limit");
            break;
        }
        lines.push(format_line(post));
        current = post.parent_uri.as_deref().filter(|p| !p.is_empty());
    }

    debug!(start = %start_uri, hops = lines.len(), "rebuilt thread");
    lines.reverse();
    lines.concat()
}

fn format_line(post: &HistoricalPost) -> String {
    format!("<START_POST>By {}: {}<END_POST>\n", post.did, post.text)
}
