//! Event feed types: cursor, commit events and feed frames.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Resumable position in the event feed.
///
/// The feed orders events by a microsecond sequence; the cursor is the
/// sequence of the last event handed to dispatch. It only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub u64);

impl Cursor {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cursor {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Cursor)
            .map_err(|_| DecodeError::Cursor(s.to_string()))
    }
}

/// Kind of change a commit applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// One change to a record in a repository, as surfaced by the event feed.
///
/// `record` holds the serialized record exactly as received; it is decoded
/// lazily by whichever handler owns the collection. Deletes carry neither a
/// record nor a CID.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEvent {
    pub seq: Cursor,
    pub did: String,
    pub collection: String,
    pub rkey: String,
    pub cid: Option<String>,
    pub record: Option<Vec<u8>>,
    pub rev: String,
    pub operation: Operation,
    pub indexed_at: DateTime<Utc>,
}

impl CommitEvent {
    /// Canonical `at://` URI of the record this event touched.
    pub fn uri(&self) -> String {
        format!("at://{}/{}/{}", self.did, self.collection, self.rkey)
    }
}

/// A decoded frame from the feed.
///
/// Identity and account frames still carry a sequence and advance the
/// cursor, but are never dispatched. So does a commit frame whose body
/// could not be decoded; replaying it would never succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFrame {
    Commit(CommitEvent),
    Other { seq: Cursor, kind: String },
    Malformed { seq: Cursor, reason: String },
}

impl FeedFrame {
    pub fn seq(&self) -> Cursor {
        match self {
            FeedFrame::Commit(event) => event.seq,
            FeedFrame::Other { seq, .. } | FeedFrame::Malformed { seq, .. } => *seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_parse_and_display() {
        let cursor: Cursor = " 1725911162329308\n".parse().unwrap();
        assert_eq!(cursor, Cursor(1_725_911_162_329_308));
        assert_eq!(cursor.to_string(), "1725911162329308");
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!("not-a-cursor".parse::<Cursor>().is_err());
        assert!("".parse::<Cursor>().is_err());
    }

    #[test]
    fn test_cursor_ordering() {
        assert!(Cursor(10) < Cursor(11));
    }

    #[test]
    fn test_commit_event_uri() {
        let event = CommitEvent {
            seq: Cursor(1),
            did: "did:plc:alice".to_string(),
            collection: "app.bsky.feed.post".to_string(),
            rkey: "3kabc".to_string(),
            cid: None,
            record: None,
            rev: "rev".to_string(),
            operation: Operation::Create,
            indexed_at: Utc::now(),
        };
        assert_eq!(event.uri(), "at://did:plc:alice/app.bsky.feed.post/3kabc");
        assert_eq!(FeedFrame::Commit(event).seq(), Cursor(1));
    }

    #[test]
    fn test_operation_serde() {
        let op: Operation = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(op, Operation::Delete);
        assert_eq!(op.to_string(), "delete");
    }
}
