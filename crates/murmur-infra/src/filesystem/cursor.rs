//! Cursor persisted as a decimal string in a single file.

use std::path::{Path, PathBuf};

use murmur_core::repository::cursor::CursorStore;
use murmur_types::error::RepositoryError;
use murmur_types::event::Cursor;

/// File-backed [`CursorStore`].
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cursor".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CursorStore for FileCursorStore {
    async fn load(&self) -> Result<Option<Cursor>, RepositoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(RepositoryError::Query(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }
        content
            .parse::<Cursor>()
            .map(Some)
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn save(&self, cursor: Cursor) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, cursor.to_string())
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to write {}: {e}", temp.display())))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to replace {}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("state").join("cursor"));

        store.save(Cursor(1_725_911_162_329_308)).await.unwrap();
        store.save(Cursor(1_725_911_162_329_999)).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(Cursor(1_725_911_162_329_999)));
        assert!(!store.temp_path().exists());
        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(raw, "1725911162329999");
    }

    #[tokio::test]
    async fn test_garbage_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor");
        tokio::fs::write(&path, "not-a-number").await.unwrap();
        assert!(FileCursorStore::new(path).load().await.is_err());
    }

    #[tokio::test]
    async fn test_whitespace_is_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor");
        tokio::fs::write(&path, "42\n").await.unwrap();
        assert_eq!(FileCursorStore::new(path).load().await.unwrap(), Some(Cursor(42)));
    }
}
