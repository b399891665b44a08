//! Cursor store trait.

use murmur_types::error::RepositoryError;
use murmur_types::event::Cursor;

/// Durable single-value slot holding the event feed position.
///
/// Read once at startup and overwritten as events are processed.
pub trait CursorStore: Send + Sync {
    /// Load the persisted cursor. Returns None when nothing was ever saved.
    fn load(&self) -> impl std::future::Future<Output = Result<Option<Cursor>, RepositoryError>> + Send;

    /// Overwrite the persisted cursor. The write must be atomic: a crash
    /// leaves either the old or the new value.
    fn save(&self, cursor: Cursor) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
