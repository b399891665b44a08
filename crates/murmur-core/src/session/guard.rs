//! Scoped ownership of the conversation lock.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error};

use crate::agent::AgentClient;

/// Holds the conversation lock for one turn.
///
/// Call [`release`](Self::release) on every normal exit. If the guard is
/// dropped instead (early return, cancellation, panic) the same cleanup is
/// spawned onto the runtime and the lock is held until it finishes, so the
/// next turn never sees a block or history left over from this one.
pub struct ConversationGuard<A: AgentClient + 'static> {
    agent: Arc<A>,
    block_id: Option<String>,
    lock: Option<OwnedMutexGuard<()>>,
}

impl<A: AgentClient + 'static> ConversationGuard<A> {
    pub fn new(agent: Arc<A>, lock: OwnedMutexGuard<()>) -> Self {
        Self {
            agent,
            block_id: None,
            lock: Some(lock),
        }
    }

    /// Register the block that cleanup must detach.
    pub fn bind_block(&mut self, block_id: impl Into<String>) {
        self.block_id = Some(block_id.into());
    }

    pub fn block_id(&self) -> Option<&str> {
        self.block_id.as_deref()
    }

    /// Detach the block, reset the history, then release the lock.
    pub async fn release(mut self) {
        let lock = self.lock.take();
        let block_id = self.block_id.take();
        cleanup(self.agent.as_ref(), block_id).await;
        drop(lock);
        debug!("conversation lock released");
    }
}

impl<A: AgentClient + 'static> Drop for ConversationGuard<A> {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        let agent = Arc::clone(&self.agent);
        let block_id = self.block_id.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    cleanup(agent.as_ref(), block_id).await;
                    drop(lock);
                    debug!("conversation lock released after abandoned turn");
                });
            }
            Err(_) => {
                error!(?block_id, "no runtime to clean up abandoned turn");
            }
        }
    }
}

async fn cleanup<A: AgentClient>(agent: &A, block_id: Option<String>) {
    if let Some(block_id) = block_id {
        if let Err(e) = agent.detach_block(&block_id).await {
            error!(error = %e, %block_id, "failed to detach memory block");
        }
    }
    if let Err(e) = agent.reset_messages().await {
        error!(error = %e, "failed to reset agent messages");
    }
}
