//! Message templates and agent response parsing.

use murmur_types::agent::{AgentResponse, MessageType, ReplyArguments};
use murmur_types::profile::Profile;
use tracing::warn;

/// Seed value of a new user's memory block.
pub fn block_value(profile: &Profile, summary: &str) -> String {
    format!(
        "This is my section of core memory devoted to information about the user.\n\
         I currently know the following about them:\n\
         Bluesky Handle: @{handle}\n\
         Atproto DID: {did}\n\
         Display Name: {display_name}\n\
         Profile Description: {description}\n\
         Where are they from? What do they do? Who are they? What do they post about?\n\
         I should update this memory over time as I interact with the human and learn more about them.\n\
         \n\
         {summary}\n",
        handle = profile.handle,
        did = profile.did,
        display_name = profile.display_name.as_deref().unwrap_or_default(),
        description = profile.description.as_deref().unwrap_or_default(),
    )
}

/// Single-turn request asking the agent to condense `text`.
pub fn summary_prompt(text: &str) -> String {
    format!(
        "Please take the following text and form a 1-3 paragraph summary of it. \
         You shouldn't feel like you need to make it too short, but stay under 3 \
         paragraphs if possible.\n\n{text}"
    )
}

/// User message for a turn: the thread so far, then the post itself.
pub fn turn_message(thread: &str, text: &str) -> String {
    if thread.is_empty() {
        text.to_string()
    } else {
        format!("<thread_summary>{thread}</thread_summary>\n\n{text}")
    }
}

/// Reply text carried by the agent's tool calls.
///
/// When the agent called its reply tool more than once, the last call wins.
/// Calls whose arguments do not decode are skipped.
pub fn extract_reply(response: &AgentResponse) -> Option<String> {
    response
        .messages
        .iter()
        .filter(|m| m.message_type == MessageType::ToolCallMessage)
        .filter_map(|m| m.tool_call.as_ref())
        .filter_map(|call| match serde_json::from_str::<ReplyArguments>(&call.arguments) {
            Ok(args) => Some(args.message),
            Err(e) => {
                warn!(error = %e, tool = ?call.name, "undecodable tool call arguments");
                None
            }
        })
        .filter(|message| !message.trim().is_empty())
        .last()
}
