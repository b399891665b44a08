//! Feed post records and the record kinds the dispatcher knows about.
//!
//! The field layout mirrors the network's `app.bsky.feed.post` lexicon.
//! Optional fields are omitted when empty so that a record serializes to the
//! same bytes whether it is encoded as JSON for a write or as DAG-CBOR for
//! its content identifier.

use serde::{Deserialize, Serialize};

/// Collection name of feed posts.
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// `$type` of an external link embed.
pub const EXTERNAL_EMBED_TYPE: &str = "app.bsky.embed.external";

fn post_type() -> String {
    POST_COLLECTION.to_string()
}

/// Closed set of record kinds routed by the event dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Post,
    Unhandled,
}

impl RecordKind {
    pub fn from_collection(collection: &str) -> Self {
        match collection {
            POST_COLLECTION => RecordKind::Post,
            _ => RecordKind::Unhandled,
        }
    }
}

/// Reference to a specific version of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

impl StrongRef {
    pub fn new(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            cid: cid.into(),
        }
    }
}

/// Thread linkage of a reply: the thread root and the direct parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: StrongRef,
    pub parent: StrongRef,
}

/// Byte range a facet annotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: u64,
    pub byte_end: u64,
}

/// Rich-text annotation on a span of post text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteSlice,
    #[serde(default)]
    pub features: Vec<FacetFeature>,
}

/// What a facet annotates. Unknown feature types decode as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: String },
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: String },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: String },
    #[serde(other)]
    Unknown,
}

/// Link card target of an external embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct External {
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Post embed. Only link previews are produced; other embed kinds found on
/// incoming posts decode as `Unsupported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum Embed {
    #[serde(rename = "app.bsky.embed.external")]
    External { external: External },
    #[serde(other)]
    Unsupported,
}

impl Embed {
    pub fn link(uri: impl Into<String>) -> Self {
        Embed::External {
            external: External {
                uri: uri.into(),
                title: String::new(),
                description: String::new(),
            },
        }
    }
}

/// A feed post record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(rename = "$type", default = "post_type")]
    pub record_type: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub langs: Vec<String>,
    pub created_at: String,
}

impl FeedPost {
    /// A plain post with no reply, facets or embed.
    pub fn new(text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            record_type: post_type(),
            text: text.into(),
            facets: Vec::new(),
            reply: None,
            embed: None,
            langs: Vec::new(),
            created_at: created_at.into(),
        }
    }

    /// DIDs targeted by mention facets, in facet order.
    pub fn mentioned_dids(&self) -> impl Iterator<Item = &str> {
        self.facets
            .iter()
            .flat_map(|facet| facet.features.iter())
            .filter_map(|feature| match feature {
                FacetFeature::Mention { did } => Some(did.as_str()),
                _ => None,
            })
    }

    pub fn mentions(&self, did: &str) -> bool {
        self.mentioned_dids().any(|d| d == did)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY_WITH_MENTION: &str = r#"{
        "$type": "app.bsky.feed.post",
        "text": "@bot.example what do you think?",
        "createdAt": "2025-03-01T12:00:00.000Z",
        "langs": ["en"],
        "facets": [{
            "index": {"byteStart": 0, "byteEnd": 12},
            "features": [
                {"$type": "app.bsky.richtext.facet#mention", "did": "did:plc:bot"},
                {"$type": "app.bsky.richtext.facet#future", "value": 1}
            ]
        }],
        "reply": {
            "root": {"uri": "at://did:plc:bot/app.bsky.feed.post/1", "cid": "bafyroot"},
            "parent": {"uri": "at://did:plc:bot/app.bsky.feed.post/2", "cid": "bafyparent"}
        },
        "embed": {"$type": "app.bsky.embed.images", "images": []}
    }"#;

    #[test]
    fn test_decode_reply_with_mention() {
        let post: FeedPost = serde_json::from_str(REPLY_WITH_MENTION).unwrap();
        assert_eq!(post.record_type, POST_COLLECTION);
        assert!(post.mentions("did:plc:bot"));
        assert!(!post.mentions("did:plc:other"));
        assert_eq!(post.facets[0].features[1], FacetFeature::Unknown);
        assert_eq!(post.embed, Some(Embed::Unsupported));
        let reply = post.reply.unwrap();
        assert_eq!(reply.parent.cid, "bafyparent");
    }

    #[test]
    fn test_plain_post_omits_empty_fields() {
        let post = FeedPost::new("hello", "2025-03-01T12:00:00.000Z");
        let json = serde_json::to_value(&post).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["$type"], "app.bsky.feed.post");
        assert_eq!(obj["createdAt"], "2025-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_link_embed_shape() {
        let json = serde_json::to_value(Embed::link("https://example.com")).unwrap();
        assert_eq!(json["$type"], EXTERNAL_EMBED_TYPE);
        assert_eq!(json["external"]["uri"], "https://example.com");
        assert_eq!(json["external"]["title"], "");
    }

    #[test]
    fn test_record_kind_routing() {
        assert_eq!(RecordKind::from_collection("app.bsky.feed.post"), RecordKind::Post);
        assert_eq!(RecordKind::from_collection("app.bsky.feed.like"), RecordKind::Unhandled);
    }

    #[test]
    fn test_missing_text_is_malformed() {
        let result: Result<FeedPost, _> =
            serde_json::from_str(r#"{"createdAt": "2025-03-01T12:00:00Z"}"#);
        assert!(result.is_err());
    }
}
