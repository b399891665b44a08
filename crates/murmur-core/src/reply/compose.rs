//! Reply chain construction.
//!
//! A reply is published as a thread of posts. Every chunk record points at
//! a fixed root and at the chunk before it (the triggering post for the
//! first chunk). Since all chunks go out in one batch, each chunk's CID is
//! computed locally before anything is written.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use murmur_types::error::{DecodeError, NetworkError};
use murmur_types::post::{Embed, FeedPost, POST_COLLECTION, ReplyRef, StrongRef};
use tracing::debug;

use crate::network::{RecordCreate, SocialClient};
use crate::record::{TidClock, record_cid};

use super::chunk::split_into_chunks;
use super::links::first_url;

/// Records written so far for one reply operation.
///
/// The root is fixed once, either up front (replies) or by the first link
/// pushed (top-level threads). The tail is always the parent of the next
/// chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyChain {
    root: Option<StrongRef>,
    tail: Option<StrongRef>,
    links: Vec<StrongRef>,
}

impl ReplyChain {
    /// A chain continuing an existing thread.
    pub fn seeded(root: StrongRef, parent: StrongRef) -> Self {
        Self {
            root: Some(root),
            tail: Some(parent),
            links: Vec::new(),
        }
    }

    /// A chain replying to `post`, which lives at `post_ref`.
    ///
    /// The root is the post's own thread root when it is itself a reply,
    /// otherwise the post.
    pub fn replying_to(post_ref: StrongRef, post: &FeedPost) -> Self {
        let root = post
            .reply
            .as_ref()
            .map(|reply| reply.root.clone())
            .unwrap_or_else(|| post_ref.clone());
        Self::seeded(root, post_ref)
    }

    /// A chain starting a new thread. Its first link becomes the root.
    pub fn unrooted() -> Self {
        Self {
            root: None,
            tail: None,
            links: Vec::new(),
        }
    }

    /// Reply reference for the next record, or None if it starts the thread.
    pub fn next_reply(&self) -> Option<ReplyRef> {
        match (&self.root, &self.tail) {
            (Some(root), Some(parent)) => Some(ReplyRef {
                root: root.clone(),
                parent: parent.clone(),
            }),
            _ => None,
        }
    }

    pub fn push(&mut self, link: StrongRef) {
        if self.root.is_none() {
            self.root = Some(link.clone());
        }
        self.tail = Some(link.clone());
        self.links.push(link);
    }

    pub fn root(&self) -> Option<&StrongRef> {
        self.root.as_ref()
    }

    /// Records appended by this operation, in order.
    pub fn links(&self) -> &[StrongRef] {
        &self.links
    }
}

/// A composed thread ready to be written in one batch.
#[derive(Debug, Clone)]
pub struct ComposedThread {
    pub posts: Vec<FeedPost>,
    pub writes: Vec<RecordCreate>,
    pub chain: ReplyChain,
}

impl ComposedThread {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Builds chunked post threads on behalf of the bot's repository.
///
/// Replies and top-level threads share the same chunking and identifier
/// derivation; they differ only in how the chain is seeded.
#[derive(Debug, Clone)]
pub struct ReplyComposer {
    bot_did: String,
    chunk_budget: usize,
    clock: Arc<TidClock>,
}

impl ReplyComposer {
    pub fn new(bot_did: impl Into<String>, chunk_budget: usize, clock: Arc<TidClock>) -> Self {
        Self {
            bot_did: bot_did.into(),
            chunk_budget,
            clock,
        }
    }

    pub fn bot_did(&self) -> &str {
        &self.bot_did
    }

    /// Compose a reply continuing `chain`.
    pub fn compose(&self, text: &str, mut chain: ReplyChain) -> Result<ComposedThread, DecodeError> {
        let mut posts = Vec::new();
        let mut writes = Vec::new();

        for chunk in split_into_chunks(text, self.chunk_budget) {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }

            let mut post = FeedPost::new(chunk, now_timestamp());
            post.reply = chain.next_reply();
            post.embed = first_url(chunk).map(Embed::link);

            // The CID and the JSON write come from the same value.
            let cid = record_cid(&post)?;
            let value = serde_json::to_value(&post)
                .map_err(|e| DecodeError::Encode(e.to_string()))?;
            let rkey = self.clock.next().to_string();
            let uri = format!("at://{}/{}/{}", self.bot_did, POST_COLLECTION, rkey);

            debug!(%uri, %cid, chars = chunk.chars().count(), "composed chunk");
            chain.push(StrongRef::new(uri, cid.to_string()));
            writes.push(RecordCreate {
                collection: POST_COLLECTION.to_string(),
                rkey,
                value,
            });
            posts.push(post);
        }

        Ok(ComposedThread {
            posts,
            writes,
            chain,
        })
    }

    /// Compose a new top-level thread: the first chunk is the root.
    pub fn compose_top_level(&self, text: &str) -> Result<ComposedThread, DecodeError> {
        self.compose(text, ReplyChain::unrooted())
    }

    /// Write every chunk in one atomic batch. Nothing is written for an
    /// empty thread.
    pub async fn publish<S: SocialClient>(
        &self,
        client: &S,
        thread: &ComposedThread,
    ) -> Result<(), NetworkError> {
        if thread.is_empty() {
            return Ok(());
        }
        client.apply_writes(&self.bot_did, &thread.writes).await
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use murmur_types::profile::{FeedViewPost, Profile};

    /// SocialClient that records batch writes.
    #[derive(Default)]
    pub(crate) struct RecordingSocial {
        pub batches: Mutex<Vec<(String, Vec<RecordCreate>)>>,
        pub fail_writes: bool,
    }

    impl SocialClient for RecordingSocial {
        async fn get_profile(&self, did: &str) -> Result<Profile, NetworkError> {
            Ok(Profile {
                did: did.to_string(),
                handle: "user.test".to_string(),
                display_name: None,
                description: None,
            })
        }

        async fn author_feed(&self, _did: &str, _limit: u32) -> Result<Vec<FeedViewPost>, NetworkError> {
            Ok(Vec::new())
        }

        async fn apply_writes(&self, repo: &str, writes: &[RecordCreate]) -> Result<(), NetworkError> {
            if self.fail_writes {
                return Err(NetworkError::Request("connection reset".to_string()));
            }
            self.batches
                .lock()
                .unwrap()
                .push((repo.to_string(), writes.to_vec()));
            Ok(())
        }

        async fn create_record(&self, repo: &str, write: &RecordCreate) -> Result<StrongRef, NetworkError> {
            Ok(StrongRef::new(
                format!("at://{repo}/{}/{}", write.collection, write.rkey),
                "bafytest",
            ))
        }
    }

    fn composer(budget: usize) -> ReplyComposer {
        ReplyComposer::new("did:plc:bot", budget, Arc::new(TidClock::new(1)))
    }

    fn trigger() -> StrongRef {
        StrongRef::new("at://did:plc:user/app.bsky.feed.post/3kabc", "bafytrigger")
    }

    fn long_text() -> String {
        (0..120).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_reply_chain_links_each_chunk_to_previous() {
        let root = StrongRef::new("at://did:plc:bot/app.bsky.feed.post/root", "bafyroot");
        let thread = composer(100)
            .compose(&long_text(), ReplyChain::seeded(root.clone(), trigger()))
            .unwrap();

        assert!(thread.posts.len() > 2);
        assert_eq!(thread.posts.len(), thread.writes.len());
        assert_eq!(thread.chain.links().len(), thread.posts.len());

        for (i, post) in thread.posts.iter().enumerate() {
            let reply = post.reply.as_ref().unwrap();
            assert_eq!(reply.root, root);
            let expected_parent = if i == 0 {
                trigger()
            } else {
                thread.chain.links()[i - 1].clone()
            };
            assert_eq!(reply.parent, expected_parent);
        }
    }

    #[test]
    fn test_chain_cids_match_written_records() {
        let thread = composer(50)
            .compose(&long_text(), ReplyChain::seeded(trigger(), trigger()))
            .unwrap();

        for (write, link) in thread.writes.iter().zip(thread.chain.links()) {
            let decoded: FeedPost = serde_json::from_value(write.value.clone()).unwrap();
            assert_eq!(record_cid(&decoded).unwrap().to_string(), link.cid);
            assert_eq!(link.uri, format!("at://did:plc:bot/app.bsky.feed.post/{}", write.rkey));
            assert_eq!(write.collection, POST_COLLECTION);
        }
    }

    #[test]
    fn test_rkeys_are_increasing() {
        let thread = composer(30)
            .compose(&long_text(), ReplyChain::seeded(trigger(), trigger()))
            .unwrap();
        let keys: Vec<&str> = thread.writes.iter().map(|w| w.rkey.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_replying_to_uses_existing_root() {
        let mut post = FeedPost::new("hi", "2025-03-01T12:00:00.000Z");
        let thread_root = StrongRef::new("at://did:plc:bot/app.bsky.feed.post/r", "bafyr");
        post.reply = Some(ReplyRef {
            root: thread_root.clone(),
            parent: StrongRef::new("at://did:plc:bot/app.bsky.feed.post/p", "bafyp"),
        });
        let chain = ReplyChain::replying_to(trigger(), &post);
        let next = chain.next_reply().unwrap();
        assert_eq!(next.root, thread_root);
        assert_eq!(next.parent, trigger());

        let standalone = FeedPost::new("hi", "2025-03-01T12:00:00.000Z");
        let chain = ReplyChain::replying_to(trigger(), &standalone);
        assert_eq!(chain.next_reply().unwrap().root, trigger());
    }

    #[test]
    fn test_top_level_thread_roots_at_first_chunk() {
        let thread = composer(40).compose_top_level(&long_text()).unwrap();
        assert!(thread.posts[0].reply.is_none());
        let first = thread.chain.links()[0].clone();
        assert_eq!(thread.chain.root(), Some(&first));
        for (i, post) in thread.posts.iter().enumerate().skip(1) {
            let reply = post.reply.as_ref().unwrap();
            assert_eq!(reply.root, first);
            assert_eq!(reply.parent, thread.chain.links()[i - 1]);
        }
    }

    #[test]
    fn test_only_first_url_per_chunk_is_embedded() {
        let text = "look at https://one.example and https://two.example";
        let thread = composer(250).compose_top_level(text).unwrap();
        assert_eq!(thread.posts.len(), 1);
        assert_eq!(thread.posts[0].embed, Some(Embed::link("https://one.example")));

        let plain = composer(250).compose_top_level("no links").unwrap();
        assert!(plain.posts[0].embed.is_none());
    }

    #[test]
    fn test_blank_text_composes_nothing() {
        let thread = composer(250).compose_top_level("  \n ").unwrap();
        assert!(thread.is_empty());
        assert!(thread.chain.links().is_empty());
    }

    #[tokio::test]
    async fn test_publish_writes_one_batch_to_bot_repo() {
        let social = RecordingSocial::default();
        let composer = composer(40);
        let thread = composer.compose_top_level(&long_text()).unwrap();
        composer.publish(&social, &thread).await.unwrap();

        let batches = social.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, "did:plc:bot");
        assert_eq!(batches[0].1, thread.writes);
    }

    #[tokio::test]
    async fn test_publish_skips_empty_thread() {
        let social = RecordingSocial::default();
        let composer = composer(40);
        let thread = composer.compose_top_level("").unwrap();
        composer.publish(&social, &thread).await.unwrap();
        assert!(social.batches.lock().unwrap().is_empty());
    }
}
