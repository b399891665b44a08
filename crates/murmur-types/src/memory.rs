//! Per-user memory types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum size (characters) of a per-user memory block.
pub const DEFAULT_BLOCK_LIMIT: u32 = 15_000;

/// Binding between a user and the agent memory block holding their context.
///
/// One row per user who has ever conversed with the agent. Rows are only
/// ever inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub did: String,
    pub block_id: String,
    pub created_at: DateTime<Utc>,
}

impl MemoryBlock {
    pub fn new(did: impl Into<String>, block_id: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            block_id: block_id.into(),
            created_at: Utc::now(),
        }
    }

    /// Agent-side label for a user's block.
    pub fn label_for(did: &str) -> String {
        format!("user-{did}")
    }
}

/// Free-text memory written before per-user blocks existed.
///
/// Read once, when a user's block is first created, and folded into the
/// block as a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMemory {
    pub did: String,
    pub rkey: String,
    pub memory: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_label() {
        assert_eq!(MemoryBlock::label_for("did:plc:abc"), "user-did:plc:abc");
    }
}
