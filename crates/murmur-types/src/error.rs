use std::time::Duration;

use thiserror::Error;

/// Errors from repository operations (used by trait definitions in murmur-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the conversational agent API.
///
/// Every non-2xx response is a hard failure for that call.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Request(String),

    #[error("bad status code in agent response: {status}")]
    BadStatus { status: u16, body: String },

    #[error("failed to decode agent response: {0}")]
    Deserialization(String),

    #[error("agent call timed out after {0:?}")]
    Timeout(Duration),

    #[error("created block has no id")]
    MissingBlockId,
}

/// Errors from the social-network read/write API.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("xrpc request failed: {0}")]
    Request(String),

    #[error("{method} returned status {status}: {body}")]
    BadStatus {
        method: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode xrpc response: {0}")]
    Deserialization(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("failed to encode record: {0}")]
    Encode(String),
}

/// Errors decoding records, identifiers and timestamps.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record: {0}")]
    Record(String),

    #[error("invalid at-uri '{0}'")]
    AtUri(String),

    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    #[error("invalid cursor '{0}'")]
    Cursor(String),

    #[error("failed to encode record: {0}")]
    Encode(String),
}

/// Errors surfaced by an event feed subscription.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Disconnect, socket error, or timeout. Recovered by reconnecting.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame that could not be decoded as an event envelope.
    #[error("undecodable envelope: {0}")]
    Envelope(String),

    /// Misconfiguration or auth failure. Terminates the process.
    #[error("fatal stream error: {0}")]
    Fatal(String),
}

impl StreamError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StreamError::Fatal(_))
    }
}

/// Reasons a single conversation turn was abandoned.
///
/// None of these are fatal to the process: the turn ends after its cleanup
/// runs and no reply is published.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("failed to fetch profile: {0}")]
    Profile(#[source] NetworkError),

    #[error("memory block storage failed: {0}")]
    Storage(#[from] RepositoryError),

    #[error("failed to create memory block: {0}")]
    BlockCreate(#[source] AgentError),

    #[error("failed to attach memory block: {0}")]
    Attach(#[source] AgentError),

    #[error("failed to load thread context: {0}")]
    Thread(#[source] RepositoryError),

    #[error("agent message failed: {0}")]
    Agent(#[source] AgentError),

    #[error("agent response contained no reply")]
    NoReply,

    #[error("failed to compose reply: {0}")]
    Compose(#[from] DecodeError),

    #[error("failed to publish reply: {0}")]
    Publish(#[source] NetworkError),

    #[error("turn timed out after {0:?}")]
    Timeout(Duration),

    #[error("turn panicked")]
    Panicked,
}

/// Errors routing a commit event to its handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_network_error_display() {
        let err = NetworkError::BadStatus {
            method: "com.atproto.repo.applyWrites".to_string(),
            status: 400,
            body: "InvalidRequest".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "com.atproto.repo.applyWrites returned status 400: InvalidRequest"
        );
    }

    #[test]
    fn test_turn_error_wraps_source() {
        let err = TurnError::Attach(AgentError::BadStatus {
            status: 404,
            body: String::new(),
        });
        assert!(err.to_string().contains("attach"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_only_fatal_stream_errors_are_fatal() {
        assert!(StreamError::Fatal("bad auth".into()).is_fatal());
        assert!(!StreamError::Transport("reset".into()).is_fatal());
        assert!(!StreamError::Envelope("not json".into()).is_fatal());
    }
}
