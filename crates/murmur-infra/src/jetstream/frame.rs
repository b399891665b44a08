//! Jetstream JSON frame decoding.
//!
//! A frame is `{did, time_us, kind, commit?}`. `time_us` is the feed
//! sequence; the commit record is kept as raw JSON bytes. Once `time_us`
//! is known, a bad commit body yields `FeedFrame::Malformed` so the cursor
//! can move past it.

use chrono::{DateTime, Utc};
use murmur_types::error::StreamError;
use murmur_types::event::{CommitEvent, Cursor, FeedFrame, Operation};
use serde::Deserialize;
use serde_json::value::RawValue;

#[derive(Deserialize)]
struct Envelope<'a> {
    did: String,
    time_us: u64,
    kind: String,
    #[serde(borrow, default)]
    commit: Option<&'a RawValue>,
}

#[derive(Deserialize)]
struct CommitBody<'a> {
    rev: String,
    operation: Operation,
    collection: String,
    rkey: String,
    #[serde(borrow, default)]
    record: Option<&'a RawValue>,
    #[serde(default)]
    cid: Option<String>,
}

/// Decode one text frame.
pub fn parse_frame(text: &str) -> Result<FeedFrame, StreamError> {
    let envelope: Envelope<'_> =
        serde_json::from_str(text).map_err(|e| StreamError::Envelope(e.to_string()))?;
    let seq = Cursor(envelope.time_us);

    if envelope.kind != "commit" {
        return Ok(FeedFrame::Other {
            seq,
            kind: envelope.kind,
        });
    }

    let Some(raw) = envelope.commit else {
        return Ok(FeedFrame::Malformed {
            seq,
            reason: "commit frame has no commit body".to_string(),
        });
    };
    let commit: CommitBody<'_> = match serde_json::from_str(raw.get()) {
        Ok(commit) => commit,
        Err(e) => {
            return Ok(FeedFrame::Malformed {
                seq,
                reason: format!("bad commit body: {e}"),
            });
        }
    };

    let indexed_at = i64::try_from(envelope.time_us)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .unwrap_or_else(Utc::now);

    Ok(FeedFrame::Commit(CommitEvent {
        seq,
        did: envelope.did,
        collection: commit.collection,
        rkey: commit.rkey,
        cid: commit.cid,
        record: commit.record.map(|raw| raw.get().as_bytes().to_vec()),
        rev: commit.rev,
        operation: commit.operation,
        indexed_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_commit() {
        let text = r#"{
            "did": "did:plc:alice",
            "time_us": 1725911162329308,
            "kind": "commit",
            "commit": {
                "rev": "3l3qo2vutsw2b",
                "operation": "create",
                "collection": "app.bsky.feed.post",
                "rkey": "3l3qo2vuowo2b",
                "record": {"$type": "app.bsky.feed.post", "text": "hi", "createdAt": "2024-09-09T19:46:02.102Z"},
                "cid": "bafyreidwaivazkwu67xztlmuobx35hs2lnfh3kolmgfmucldvhd3sgzcqi"
            }
        }"#;

        let FeedFrame::Commit(event) = parse_frame(text).unwrap() else {
            panic!("expected a commit frame");
        };
        assert_eq!(event.seq, Cursor(1_725_911_162_329_308));
        assert_eq!(event.did, "did:plc:alice");
        assert_eq!(event.operation, Operation::Create);
        assert_eq!(event.uri(), "at://did:plc:alice/app.bsky.feed.post/3l3qo2vuowo2b");

        let record: serde_json::Value = serde_json::from_slice(event.record.as_deref().unwrap()).unwrap();
        assert_eq!(record["text"], "hi");
        assert_eq!(event.indexed_at.timestamp(), 1_725_911_162);
    }

    #[test]
    fn test_parse_delete_commit_has_no_record() {
        let text = r#"{"did":"did:plc:a","time_us":5,"kind":"commit",
            "commit":{"rev":"r","operation":"delete","collection":"app.bsky.feed.post","rkey":"k"}}"#;
        let FeedFrame::Commit(event) = parse_frame(text).unwrap() else {
            panic!("expected a commit frame");
        };
        assert_eq!(event.operation, Operation::Delete);
        assert!(event.record.is_none());
        assert!(event.cid.is_none());
    }

    #[test]
    fn test_parse_identity_frame_is_other() {
        let text = r#"{"did":"did:plc:a","time_us":42,"kind":"identity",
            "identity":{"did":"did:plc:a","handle":"a.test","seq":1,"time":"2024-09-05T06:11:04.870Z"}}"#;
        assert_eq!(
            parse_frame(text).unwrap(),
            FeedFrame::Other {
                seq: Cursor(42),
                kind: "identity".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_frame("{not json"), Err(StreamError::Envelope(_))));
        assert!(matches!(
            parse_frame(r#"{"did":"did:plc:a","kind":"commit"}"#),
            Err(StreamError::Envelope(_))
        ));
    }

    #[test]
    fn test_commit_without_body_is_malformed() {
        let frame = parse_frame(r#"{"did":"did:plc:a","time_us":1,"kind":"commit"}"#).unwrap();
        assert!(matches!(frame, FeedFrame::Malformed { seq: Cursor(1), .. }));
    }

    #[test]
    fn test_unknown_operation_is_malformed() {
        let text = r#"{"did":"did:plc:a","time_us":8,"kind":"commit",
            "commit":{"rev":"r","operation":"resync","collection":"app.bsky.feed.post","rkey":"k"}}"#;
        match parse_frame(text).unwrap() {
            FeedFrame::Malformed { seq, reason } => {
                assert_eq!(seq, Cursor(8));
                assert!(reason.contains("resync"), "{reason}");
            }
            other => panic!("expected a malformed frame, got {other:?}"),
        }
    }
}
