//! Reply eligibility.
//!
//! A pure decision over one commit event: either the post is skipped for a
//! stated reason or it is accepted together with its decoded record. The
//! rules run in a fixed order and the first rejection wins.

use std::fmt;

use murmur_types::aturi::AtUri;
use murmur_types::config::EligibilityConfig;
use murmur_types::event::CommitEvent;
use murmur_types::post::{FeedPost, StrongRef};

/// Why a post was not answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Authored by the bot itself.
    SelfAuthored,
    /// The event carries no record or it does not decode as a post.
    MalformedRecord(String),
    /// Admin-only mode is on and the author is not an admin.
    NotAdmin,
    /// A reply reference whose URIs could not be parsed.
    MalformedReplyRef(String),
    /// A reply in a thread the bot neither started nor took part in.
    ForeignThread,
    /// The author replying to themselves inside the bot's thread without
    /// mentioning the bot again.
    ConsecutiveThreadReply,
    /// Neither a mention nor a reply to the bot.
    NotAddressed,
    /// Author is on the ignore list.
    IgnoredUser,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SelfAuthored => write!(f, "self-authored"),
            SkipReason::MalformedRecord(e) => write!(f, "malformed record: {e}"),
            SkipReason::NotAdmin => write!(f, "author is not an admin"),
            SkipReason::MalformedReplyRef(e) => write!(f, "malformed reply reference: {e}"),
            SkipReason::ForeignThread => write!(f, "reply outside the bot's threads"),
            SkipReason::ConsecutiveThreadReply => write!(f, "consecutive thread reply"),
            SkipReason::NotAddressed => write!(f, "bot not addressed"),
            SkipReason::IgnoredUser => write!(f, "author is ignored"),
        }
    }
}

/// A post the bot should answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedPost {
    pub author_did: String,
    pub uri: String,
    pub cid: String,
    pub post: FeedPost,
    pub mentions_bot: bool,
}

impl AcceptedPost {
    /// Strong reference to the triggering post.
    pub fn strong_ref(&self) -> StrongRef {
        StrongRef::new(self.uri.clone(), self.cid.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Skip(SkipReason),
    Accept(Box<AcceptedPost>),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept(_))
    }
}

/// Decides whether a commit event warrants a reply.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    config: EligibilityConfig,
}

impl EligibilityFilter {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    pub fn evaluate(&self, event: &CommitEvent) -> Decision {
        let bot = self.config.bot_did.as_str();

        if event.did == bot {
            return Decision::Skip(SkipReason::SelfAuthored);
        }

        let post = match decode_post(event) {
            Ok(post) => post,
            Err(reason) => return Decision::Skip(reason),
        };
        let Some(cid) = event.cid.clone().filter(|cid| !cid.is_empty()) else {
            return Decision::Skip(SkipReason::MalformedRecord("missing cid".to_string()));
        };

        if self.config.admin_only && !self.config.is_admin(&event.did) {
            return Decision::Skip(SkipReason::NotAdmin);
        }

        let mentions_bot = post.mentions(bot);

        match &post.reply {
            Some(reply) if !mentions_bot => {
                let root: AtUri = match reply.root.uri.parse() {
                    Ok(uri) => uri,
                    Err(e) => return Decision::Skip(SkipReason::MalformedReplyRef(e.to_string())),
                };
                let parent: AtUri = match reply.parent.uri.parse() {
                    Ok(uri) => uri,
                    Err(e) => return Decision::Skip(SkipReason::MalformedReplyRef(e.to_string())),
                };
                if root.authority() != bot && parent.authority() != bot {
                    return Decision::Skip(SkipReason::ForeignThread);
                }
                if parent.authority() == event.did {
                    return Decision::Skip(SkipReason::ConsecutiveThreadReply);
                }
            }
            None if !mentions_bot => return Decision::Skip(SkipReason::NotAddressed),
            _ => {}
        }

        if self.config.is_ignored(&event.did) {
            return Decision::Skip(SkipReason::IgnoredUser);
        }

        Decision::Accept(Box::new(AcceptedPost {
            author_did: event.did.clone(),
            uri: event.uri(),
            cid,
            post,
            mentions_bot,
        }))
    }
}

fn decode_post(event: &CommitEvent) -> Result<FeedPost, SkipReason> {
    let bytes = event
        .record
        .as_deref()
        .ok_or_else(|| SkipReason::MalformedRecord("missing record".to_string()))?;
    serde_json::from_slice(bytes).map_err(|e| SkipReason::MalformedRecord(e.to_string()))
}
