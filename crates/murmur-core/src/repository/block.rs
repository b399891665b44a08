//! Memory block and legacy memory repository traits.

use murmur_types::error::RepositoryError;
use murmur_types::memory::{LegacyMemory, MemoryBlock};

/// Persistent DID -> memory block binding.
///
/// Rows are created lazily on a user's first conversation and never
/// updated or deleted. Uses RPITIT (native async fn in traits, Rust 2024
/// edition). Implementations live in murmur-infra.
pub trait BlockRepository: Send + Sync {
    /// Look up the block bound to a user. Returns None if the user has never
    /// conversed with the agent.
    fn find_block(
        &self,
        did: &str,
    ) -> impl std::future::Future<Output = Result<Option<MemoryBlock>, RepositoryError>> + Send;

    /// Insert a new binding. Fails with `Conflict` if the DID is already bound.
    fn insert_block(
        &self,
        block: &MemoryBlock,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Read-only access to free-text memories written before memory blocks.
pub trait LegacyMemoryRepository: Send + Sync {
    /// All legacy memories for a user, oldest first.
    fn memories_for(
        &self,
        did: &str,
    ) -> impl std::future::Future<Output = Result<Vec<LegacyMemory>, RepositoryError>> + Send;
}
