//! Conversation turns against the agent.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use murmur_types::agent::{AgentMessage, CreateBlockRequest, SendMessageRequest};
use murmur_types::config::RuntimeConfig;
use murmur_types::error::{AgentError, TurnError};
use murmur_types::memory::MemoryBlock;
use murmur_types::post::StrongRef;
use murmur_types::profile::Profile;
use tokio::sync::Mutex;
use tracing::{Instrument, Span, error, field, info, info_span, warn};

use crate::agent::AgentClient;
use crate::eligibility::AcceptedPost;
use crate::network::SocialClient;
use crate::queue::ReplyHandler;
use crate::reply::{ReplyChain, ReplyComposer};
use crate::repository::archive::PostArchive;
use crate::repository::block::{BlockRepository, LegacyMemoryRepository};
use crate::thread::ThreadContextBuilder;

use super::guard::ConversationGuard;
use super::prompt::{block_value, extract_reply, summary_prompt, turn_message};

/// Limits applied to every turn.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub turn_timeout: Duration,
    pub block_limit: u32,
    pub max_steps: u32,
}

impl From<&RuntimeConfig> for SessionSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            turn_timeout: config.turn_timeout(),
            block_limit: config.memory_block_limit,
            max_steps: config.agent_max_steps,
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub block_id: String,
    pub created_block: bool,
    pub published: Vec<StrongRef>,
}

/// Serializes conversation turns with the agent.
///
/// Only one turn is inside the critical section at a time, system wide.
/// Later callers wait on the lock; ordering between waiters is whatever
/// tokio's mutex grants.
pub struct SessionManager<A, S, B, L, P>
where
    A: AgentClient + 'static,
{
    agent: Arc<A>,
    social: Arc<S>,
    blocks: Arc<B>,
    legacy: Arc<L>,
    thread: ThreadContextBuilder<P>,
    composer: ReplyComposer,
    settings: SessionSettings,
    lock: Arc<Mutex<()>>,
}

impl<A, S, B, L, P> SessionManager<A, S, B, L, P>
where
    A: AgentClient + 'static,
    S: SocialClient,
    B: BlockRepository,
    L: LegacyMemoryRepository,
    P: PostArchive,
{
    pub fn new(
        agent: Arc<A>,
        social: Arc<S>,
        blocks: Arc<B>,
        legacy: Arc<L>,
        thread: ThreadContextBuilder<P>,
        composer: ReplyComposer,
        settings: SessionSettings,
    ) -> Self {
        Self {
            agent,
            social,
            blocks,
            legacy,
            thread,
            composer,
            settings,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// True while a turn holds the conversation lock (including its cleanup).
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Run one conversation turn for an accepted post and publish the reply.
    ///
    /// Cleanup runs on every exit path before the lock is released. Panics
    /// inside the turn are caught and reported as [`TurnError::Panicked`].
    pub async fn converse(&self, post: &AcceptedPost) -> Result<TurnOutcome, TurnError> {
        let lock = Arc::clone(&self.lock).lock_owned().await;
        let mut guard = ConversationGuard::new(Arc::clone(&self.agent), lock);

        let timeout = self.settings.turn_timeout;
        let result = AssertUnwindSafe(tokio::time::timeout(timeout, self.run_turn(post, &mut guard)))
            .catch_unwind()
            .await;

        guard.release().await;

        match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_elapsed)) => Err(TurnError::Timeout(timeout)),
            Err(_panic) => Err(TurnError::Panicked),
        }
    }

    async fn run_turn(
        &self,
        post: &AcceptedPost,
        guard: &mut ConversationGuard<A>,
    ) -> Result<TurnOutcome, TurnError> {
        let did = post.author_did.as_str();

        let profile = self
            .social
            .get_profile(did)
            .await
            .map_err(TurnError::Profile)?;

        let (block, created_block) = match self.blocks.find_block(did).await? {
            Some(block) => {
                info!(%did, block_id = %block.block_id, "found memory block for user");
                (block, false)
            }
            None => (self.create_block(&profile).await?, true),
        };

        guard.bind_block(block.block_id.clone());
        self.agent
            .attach_block(&block.block_id)
            .await
            .map_err(TurnError::Attach)?;

        let thread = self
            .thread
            .build(post.post.reply.as_ref())
            .await
            .map_err(TurnError::Thread)?;

        let message = AgentMessage::user(turn_message(&thread, &post.post.text)).with_sender(did);
        let request = SendMessageRequest::tool_calls(vec![message], self.settings.max_steps);
        let response = self
            .agent
            .send_message(&request)
            .await
            .map_err(TurnError::Agent)?;
        info!(
            %did,
            messages = response.messages.len(),
            total_tokens = response.usage.total_tokens,
            "agent responded"
        );
        let span = Span::current();
        span.record("gen_ai.usage.input_tokens", response.usage.prompt_tokens);
        span.record("gen_ai.usage.output_tokens", response.usage.completion_tokens);

        let reply = extract_reply(&response).ok_or(TurnError::NoReply)?;

        let chain = ReplyChain::replying_to(post.strong_ref(), &post.post);
        let thread = self.composer.compose(&reply, chain)?;
        self.composer
            .publish(self.social.as_ref(), &thread)
            .await
            .map_err(TurnError::Publish)?;

        info!(%did, uri = %post.uri, chunks = thread.writes.len(), "published reply");
        Ok(TurnOutcome {
            block_id: block.block_id,
            created_block,
            published: thread.chain.links().to_vec(),
        })
    }

    /// Create and persist a user's first memory block.
    async fn create_block(&self, profile: &Profile) -> Result<MemoryBlock, TurnError> {
        let summary = self.migrate_legacy(&profile.did).await;

        let request = CreateBlockRequest {
            value: block_value(profile, &summary),
            label: MemoryBlock::label_for(&profile.did),
            limit: self.settings.block_limit,
        };
        let created = self
            .agent
            .create_block(&request)
            .await
            .map_err(TurnError::BlockCreate)?;
        let block_id = created
            .id
            .ok_or(TurnError::BlockCreate(AgentError::MissingBlockId))?;

        let block = MemoryBlock::new(&profile.did, block_id);
        self.blocks.insert_block(&block).await?;
        info!(did = %block.did, block_id = %block.block_id, "created memory block for user");
        Ok(block)
    }

    /// Summarize legacy free-text memories, or empty if there are none or
    /// summarizing fails.
    async fn migrate_legacy(&self, did: &str) -> String {
        let memories = match self.legacy.memories_for(did).await {
            Ok(memories) => memories,
            Err(e) => {
                warn!(error = %e, %did, "could not read legacy memories");
                return String::new();
            }
        };
        if memories.is_empty() {
            return String::new();
        }

        info!(%did, count = memories.len(), "migrating legacy memories");
        let text = memories
            .iter()
            .map(|m| m.memory.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let request = SendMessageRequest::tool_calls(
            vec![AgentMessage::user(summary_prompt(&text))],
            self.settings.max_steps,
        );
        let summary = match self.agent.send_message(&request).await {
            Ok(response) => extract_reply(&response).unwrap_or_default(),
            Err(e) => {
                error!(error = %e, %did, "could not summarize legacy memories");
                String::new()
            }
        };

        if let Err(e) = self.agent.reset_messages().await {
            error!(error = %e, "failed to reset agent after summary");
        }
        summary
    }
}

impl<A, S, B, L, P> ReplyHandler for SessionManager<A, S, B, L, P>
where
    A: AgentClient + 'static,
    S: SocialClient + 'static,
    B: BlockRepository + 'static,
    L: LegacyMemoryRepository + 'static,
    P: PostArchive + 'static,
{
    async fn handle(&self, post: AcceptedPost) {
        let span = info_span!(
            "conversation_turn",
            gen_ai.operation.name = "invoke_agent",
            murmur.user.did = %post.author_did,
            murmur.post.uri = %post.uri,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
        );
        async {
            if let Err(e) = self.converse(&post).await {
                error!(error = %e, "conversation turn failed");
            }
        }
        .instrument(span)
        .await
    }
}
