//! Configuration types for murmur.
//!
//! `RuntimeConfig` holds the tunables of the reply pipeline. It is loaded from
//! an optional TOML file; every field has a default so a missing file (or
//! missing keys) yields a working configuration.
//!
//! `EligibilityConfig` holds the bot identity and the allow/ignore lists the
//! eligibility filter consults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_MAX_STEPS;
use crate::memory::DEFAULT_BLOCK_LIMIT;

/// Tunables of the event consumer and reply pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum characters per reply chunk.
    pub chunk_budget: usize,
    /// Hard ceiling on parent hops when rebuilding a thread.
    pub thread_depth_limit: usize,
    /// How far back (days) the post archive is searched for thread members.
    pub thread_window_days: u32,
    /// Upper bound on a whole conversation turn.
    pub turn_timeout_secs: u64,
    /// Pending reply jobs held before new ones are dropped.
    pub reply_queue_capacity: usize,
    /// Persist the cursor after this many events.
    pub cursor_flush_every: u64,
    /// Persist the cursor at least this often while events flow.
    pub cursor_flush_interval_secs: u64,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    /// Interval between network session refreshes.
    pub session_refresh_secs: u64,
    pub memory_block_limit: u32,
    pub agent_max_steps: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            chunk_budget: 250,
            thread_depth_limit: 100,
            thread_window_days: 7,
            turn_timeout_secs: 180,
            reply_queue_capacity: 32,
            cursor_flush_every: 100,
            cursor_flush_interval_secs: 5,
            reconnect_initial_ms: 1_000,
            reconnect_max_ms: 30_000,
            session_refresh_secs: 3_600,
            memory_block_limit: DEFAULT_BLOCK_LIMIT,
            agent_max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl RuntimeConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn cursor_flush_interval(&self) -> Duration {
        Duration::from_secs(self.cursor_flush_interval_secs)
    }

    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }

    pub fn session_refresh(&self) -> Duration {
        Duration::from_secs(self.session_refresh_secs)
    }
}

/// Bot identity and the user lists consulted before replying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub bot_did: String,
    /// Only admins may trigger replies when `admin_only` is set.
    pub admin_dids: Vec<String>,
    pub admin_only: bool,
    /// Users the bot never replies to.
    pub ignore_dids: Vec<String>,
}

impl EligibilityConfig {
    pub fn new(bot_did: impl Into<String>) -> Self {
        Self {
            bot_did: bot_did.into(),
            ..Default::default()
        }
    }

    pub fn is_admin(&self, did: &str) -> bool {
        self.admin_dids.iter().any(|d| d == did)
    }

    pub fn is_ignored(&self, did: &str) -> bool {
        self.ignore_dids.iter().any(|d| d == did)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.chunk_budget, 250);
        assert_eq!(config.thread_depth_limit, 100);
        assert_eq!(config.turn_timeout(), Duration::from_secs(180));
        assert_eq!(config.memory_block_limit, 15_000);
    }

    #[test]
    fn test_runtime_config_partial_toml() {
        let config: RuntimeConfig = toml::from_str(
            r#"
reply_queue_capacity = 8
cursor_flush_every = 10
"#,
        )
        .unwrap();
        assert_eq!(config.reply_queue_capacity, 8);
        assert_eq!(config.cursor_flush_every, 10);
        assert_eq!(config.chunk_budget, 250);
    }

    #[test]
    fn test_runtime_config_empty_toml() {
        let config: RuntimeConfig = toml::from_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_eligibility_lists() {
        let config = EligibilityConfig {
            bot_did: "did:plc:bot".into(),
            admin_dids: vec!["did:plc:admin".into()],
            admin_only: true,
            ignore_dids: vec!["did:plc:spam".into()],
        };
        assert!(config.is_admin("did:plc:admin"));
        assert!(!config.is_admin("did:plc:spam"));
        assert!(config.is_ignored("did:plc:spam"));
    }
}
