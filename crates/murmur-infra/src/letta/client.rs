//! LettaClient -- concrete [`AgentClient`] for a Letta server.
//!
//! Every call targets one fixed agent. The API key is sent as a bearer token
//! and is wrapped in [`secrecy::SecretString`] so it never shows up in
//! `Debug` output or logs.

use std::time::Duration;

use murmur_core::agent::AgentClient;
use murmur_types::agent::{AgentResponse, BlockInfo, CreateBlockRequest, SendMessageRequest};
use murmur_types::error::AgentError;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Connection settings for a Letta server.
pub struct LettaConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub agent_id: String,
    pub timeout: Duration,
}

/// Letta agent API client bound to one agent.
pub struct LettaClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    agent_id: String,
    timeout: Duration,
}

impl LettaClient {
    pub fn new(config: LettaConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Request(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent_id: config.agent_id,
            timeout: config.timeout,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn agent_url(&self, suffix: &str) -> String {
        self.url(&format!("/v1/agents/{}{}", self.agent_id, suffix))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.api_key.expose_secret())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AgentError> {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AgentError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| AgentError::Deserialization(e.to_string()))
    }

    fn map_transport(&self, err: reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(self.timeout)
        } else {
            AgentError::Request(err.to_string())
        }
    }
}

impl AgentClient for LettaClient {
    async fn create_block(&self, request: &CreateBlockRequest) -> Result<BlockInfo, AgentError> {
        let url = self.url("/v1/blocks/");
        debug!(label = %request.label, "creating memory block");
        self.send_json(self.request(Method::POST, &url).json(request))
            .await
    }

    async fn attach_block(&self, block_id: &str) -> Result<(), AgentError> {
        let url = self.agent_url(&format!("/core-memory/blocks/attach/{block_id}"));
        self.send(self.request(Method::PATCH, &url)).await?;
        debug!(%block_id, "attached memory block");
        Ok(())
    }

    async fn detach_block(&self, block_id: &str) -> Result<(), AgentError> {
        let url = self.agent_url(&format!("/core-memory/blocks/detach/{block_id}"));
        self.send(self.request(Method::PATCH, &url)).await?;
        debug!(%block_id, "detached memory block");
        Ok(())
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<AgentResponse, AgentError> {
        let url = self.agent_url("/messages");
        self.send_json(self.request(Method::POST, &url).json(request))
            .await
    }

    async fn reset_messages(&self) -> Result<(), AgentError> {
        let url = self.agent_url("/reset-messages");
        self.send(self.request(Method::PATCH, &url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> LettaClient {
        LettaClient::new(LettaConfig {
            base_url: base_url.to_string(),
            api_key: SecretString::from("letta-key".to_string()),
            agent_id: "agent-123".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_agent_urls() {
        let client = client("https://letta.example/");
        assert_eq!(client.url("/v1/blocks/"), "https://letta.example/v1/blocks/");
        assert_eq!(
            client.agent_url("/core-memory/blocks/attach/block-9"),
            "https://letta.example/v1/agents/agent-123/core-memory/blocks/attach/block-9"
        );
        assert_eq!(
            client.agent_url("/reset-messages"),
            "https://letta.example/v1/agents/agent-123/reset-messages"
        );
    }

    #[test]
    fn test_request_carries_bearer_token() {
        let client = client("https://letta.example");
        let request = client
            .request(Method::PATCH, "https://letta.example/x")
            .build()
            .unwrap();
        assert_eq!(*request.method(), Method::PATCH);
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer letta-key"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let client = client("http://127.0.0.1:9");
        let err = client.reset_messages().await.unwrap_err();
        assert!(matches!(err, AgentError::Request(_) | AgentError::Timeout(_)));
    }
}
