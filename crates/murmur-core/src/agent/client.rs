//! AgentClient trait definition.
//!
//! The agent is a single stateful session. Memory blocks are attached before
//! a turn and detached after it, and the message history is reset between
//! turns so that no conversation bleeds into the next.

use murmur_types::agent::{AgentResponse, BlockInfo, CreateBlockRequest, SendMessageRequest};
use murmur_types::error::AgentError;

/// Trait for the agent backend bound to one fixed agent.
///
/// All calls are request/response; a non-2xx status is an error.
/// Implementations live in murmur-infra (e.g., `LettaClient`).
pub trait AgentClient: Send + Sync {
    /// Create a new memory block and return it with its assigned id.
    fn create_block(
        &self,
        request: &CreateBlockRequest,
    ) -> impl std::future::Future<Output = Result<BlockInfo, AgentError>> + Send;

    /// Attach a memory block to the agent's core memory.
    fn attach_block(
        &self,
        block_id: &str,
    ) -> impl std::future::Future<Output = Result<(), AgentError>> + Send;

    /// Detach a memory block from the agent's core memory.
    fn detach_block(
        &self,
        block_id: &str,
    ) -> impl std::future::Future<Output = Result<(), AgentError>> + Send;

    /// Send one turn of messages and wait for the agent to stop stepping.
    fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> impl std::future::Future<Output = Result<AgentResponse, AgentError>> + Send;

    /// Drop the agent's in-context message history.
    fn reset_messages(&self) -> impl std::future::Future<Output = Result<(), AgentError>> + Send;
}
