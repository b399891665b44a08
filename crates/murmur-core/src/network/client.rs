//! SocialClient trait definition.

use murmur_types::error::NetworkError;
use murmur_types::post::StrongRef;
use murmur_types::profile::{FeedViewPost, Profile};

/// A record-create operation inside a batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCreate {
    pub collection: String,
    pub rkey: String,
    pub value: serde_json::Value,
}

/// Trait for the authenticated social network API.
///
/// Every call is made on behalf of the bot's own account. Implementations
/// live in murmur-infra (e.g., `XrpcClient`).
pub trait SocialClient: Send + Sync {
    /// Fetch the public profile of an account.
    fn get_profile(
        &self,
        did: &str,
    ) -> impl std::future::Future<Output = Result<Profile, NetworkError>> + Send;

    /// Fetch recent posts authored by an account (including its own thread
    /// replies), newest first.
    fn author_feed(
        &self,
        did: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<FeedViewPost>, NetworkError>> + Send;

    /// Apply an ordered batch of record creates to a repository atomically.
    fn apply_writes(
        &self,
        repo: &str,
        writes: &[RecordCreate],
    ) -> impl std::future::Future<Output = Result<(), NetworkError>> + Send;

    /// Create a single record and return its reference.
    fn create_record(
        &self,
        repo: &str,
        write: &RecordCreate,
    ) -> impl std::future::Future<Output = Result<StrongRef, NetworkError>> + Send;
}
