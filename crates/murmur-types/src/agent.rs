//! Request and response types for the stateful conversational agent.
//!
//! The agent is a single long-lived session with attachable memory blocks.
//! Messages are sent one turn at a time; the response lists the typed
//! messages the agent produced while working through its steps.

use serde::{Deserialize, Serialize};

/// Default ceiling on agent reasoning steps per turn.
pub const DEFAULT_MAX_STEPS: u32 = 50;

/// Role of a message sent to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    System,
    Assistant,
}

/// A message sent to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: MessageRole,
    pub content: String,
    /// Identifier of the account the message is on behalf of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
}

impl AgentMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            sender_id: None,
        }
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }
}

/// Types of messages the agent can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    SystemMessage,
    UserMessage,
    AssistantMessage,
    ReasoningMessage,
    HiddenReasoningMessage,
    ToolCallMessage,
    ToolReturnMessage,
    #[serde(other)]
    Unknown,
}

/// Body of a send-message call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub messages: Vec<AgentMessage>,
    pub max_steps: u32,
    pub use_assistant_message: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_return_message_types: Vec<MessageType>,
}

impl SendMessageRequest {
    /// A turn that only returns tool-call messages.
    pub fn tool_calls(messages: Vec<AgentMessage>, max_steps: u32) -> Self {
        Self {
            messages,
            max_steps,
            use_assistant_message: false,
            include_return_message_types: vec![MessageType::ToolCallMessage],
        }
    }
}

/// Tool invocation carried by a tool-call message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub name: Option<String>,
    /// JSON-encoded argument object.
    #[serde(default)]
    pub arguments: String,
}

/// Arguments of the agent's reply tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyArguments {
    pub message: String,
}

/// One typed message in an agent response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub id: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
}

/// Why the agent stopped stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopReason {
    pub stop_reason: String,
}

/// Token usage counters for a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub step_count: u32,
}

/// Full response to a send-message call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub messages: Vec<ResponseMessage>,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub usage: UsageStats,
}

/// Body of a create-block call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub value: String,
    pub label: String,
    pub limit: u32,
}

/// A memory block as stored by the agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_request_shape() {
        let req = SendMessageRequest::tool_calls(
            vec![AgentMessage::user("hi").with_sender("did:plc:a")],
            DEFAULT_MAX_STEPS,
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_steps"], 50);
        assert_eq!(json["use_assistant_message"], false);
        assert_eq!(json["include_return_message_types"][0], "tool_call_message");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["sender_id"], "did:plc:a");
    }

    #[test]
    fn test_response_tolerates_unknown_message_types() {
        let json = r#"{
            "messages": [
                {"id": "m1", "message_type": "approval_request_message"},
                {"id": "m2", "message_type": "tool_call_message",
                 "tool_call": {"name": "reply", "arguments": "{\"message\":\"hello\"}"}}
            ],
            "stop_reason": {"stop_reason": "end_turn", "message_type": "stop_reason"},
            "usage": {"completion_tokens": 5, "prompt_tokens": 7, "total_tokens": 12, "step_count": 2}
        }"#;
        let resp: AgentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.messages[0].message_type, MessageType::Unknown);
        assert_eq!(resp.messages[1].message_type, MessageType::ToolCallMessage);
        assert_eq!(resp.usage.total_tokens, 12);
    }
}
