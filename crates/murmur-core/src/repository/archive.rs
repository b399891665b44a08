//! Historical post archive trait.

use murmur_types::error::RepositoryError;
use murmur_types::profile::HistoricalPost;

/// Queryable archive of recently indexed posts.
pub trait PostArchive: Send + Sync {
    /// All archived posts in the thread rooted at `root_uri` (including the
    /// root itself) created within the last `window_days` days.
    fn thread_posts(
        &self,
        root_uri: &str,
        window_days: u32,
    ) -> impl std::future::Future<Output = Result<Vec<HistoricalPost>, RepositoryError>> + Send;
}
