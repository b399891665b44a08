//! SQLite memory block and legacy memory repositories.
//!
//! Implements `BlockRepository` and `LegacyMemoryRepository` from
//! `murmur-core` using sqlx with split read/write pools.

use chrono::{DateTime, Utc};
use murmur_core::repository::block::{BlockRepository, LegacyMemoryRepository};
use murmur_types::error::RepositoryError;
use murmur_types::memory::{LegacyMemory, MemoryBlock};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `BlockRepository`.
pub struct SqliteBlockRepository {
    pool: DatabasePool,
}

impl SqliteBlockRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct BlockRow {
    did: String,
    block_id: String,
    created_at: String,
}

impl BlockRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            did: row.try_get("did")?,
            block_id: row.try_get("block_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_block(self) -> Result<MemoryBlock, RepositoryError> {
        Ok(MemoryBlock {
            did: self.did,
            block_id: self.block_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl BlockRepository for SqliteBlockRepository {
    async fn find_block(&self, did: &str) -> Result<Option<MemoryBlock>, RepositoryError> {
        let row = sqlx::query("SELECT did, block_id, created_at FROM memory_blocks WHERE did = ?")
            .bind(did)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let block_row =
                    BlockRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(block_row.into_block()?))
            }
            None => Ok(None),
        }
    }

    async fn insert_block(&self, block: &MemoryBlock) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO memory_blocks (did, block_id, created_at) VALUES (?, ?, ?)")
            .bind(&block.did)
            .bind(&block.block_id)
            .bind(block.created_at.to_rfc3339())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(format!("memory block already bound for {}", block.did))
                } else {
                    RepositoryError::Query(e.to_string())
                }
            })?;

        Ok(())
    }
}

/// SQLite-backed implementation of `LegacyMemoryRepository`.
pub struct SqliteLegacyMemoryRepository {
    pool: DatabasePool,
}

impl SqliteLegacyMemoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl LegacyMemoryRepository for SqliteLegacyMemoryRepository {
    async fn memories_for(&self, did: &str) -> Result<Vec<LegacyMemory>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT did, rkey, memory FROM user_memories WHERE did = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(did)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(LegacyMemory {
                    did: row.try_get("did")?,
                    rkey: row.try_get("rkey")?,
                    memory: row.try_get("memory")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}
