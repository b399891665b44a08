//! Conversation sessions with the single stateful agent.
//!
//! Every turn runs under one process-wide lock. The [`ConversationGuard`]
//! detaches the user's memory block and resets the agent's history before
//! the lock is released, on every exit path.

pub mod guard;
pub mod manager;
pub mod prompt;

pub use guard::ConversationGuard;
pub use manager::{SessionManager, SessionSettings, TurnOutcome};
