//! XrpcClient -- concrete [`SocialClient`] over XRPC.

use std::sync::Arc;

use murmur_core::network::{RecordCreate, SocialClient};
use murmur_types::error::NetworkError;
use murmur_types::post::StrongRef;
use murmur_types::profile::{FeedViewPost, Profile};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::session::AuthSession;

const GET_PROFILE: &str = "app.bsky.actor.getProfile";
const GET_AUTHOR_FEED: &str = "app.bsky.feed.getAuthorFeed";
const APPLY_WRITES: &str = "com.atproto.repo.applyWrites";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

const CREATE_OP: &str = "com.atproto.repo.applyWrites#create";

#[derive(Deserialize)]
struct AuthorFeedOutput {
    feed: Vec<FeedViewPost>,
}

#[derive(Serialize)]
struct CreateRecordInput<'a> {
    repo: &'a str,
    collection: &'a str,
    rkey: &'a str,
    record: &'a Value,
}

/// Social network client acting as the logged-in bot account.
pub struct XrpcClient {
    session: Arc<AuthSession>,
}

impl XrpcClient {
    pub fn new(session: Arc<AuthSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    fn url(&self, nsid: &str) -> String {
        format!("{}/xrpc/{nsid}", self.session.host())
    }

    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.session.current().await;
        builder.bearer_auth(token.expose_secret())
    }

    async fn query<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, String)],
    ) -> Result<T, NetworkError> {
        let builder = self.session.http().get(self.url(nsid)).query(params);
        let response = send(self.authed(builder).await, nsid).await?;
        response
            .json()
            .await
            .map_err(|e| NetworkError::Deserialization(e.to_string()))
    }

    async fn procedure(&self, nsid: &str, body: &impl Serialize) -> Result<Response, NetworkError> {
        let builder = self.session.http().post(self.url(nsid)).json(body);
        send(self.authed(builder).await, nsid).await
    }
}

async fn send(builder: RequestBuilder, nsid: &str) -> Result<Response, NetworkError> {
    let response = builder
        .send()
        .await
        .map_err(|e| NetworkError::Request(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(NetworkError::Unauthorized(format!("{nsid}: {body}")));
    }
    Err(NetworkError::BadStatus {
        method: nsid.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Body of a batch write creating every record in order.
fn apply_writes_body(repo: &str, writes: &[RecordCreate]) -> Value {
    let writes: Vec<Value> = writes
        .iter()
        .map(|w| {
            json!({
                "$type": CREATE_OP,
                "collection": w.collection,
                "rkey": w.rkey,
                "value": w.value,
            })
        })
        .collect();
    json!({ "repo": repo, "validate": true, "writes": writes })
}

impl SocialClient for XrpcClient {
    async fn get_profile(&self, did: &str) -> Result<Profile, NetworkError> {
        self.query(GET_PROFILE, &[("actor", did.to_string())]).await
    }

    async fn author_feed(&self, did: &str, limit: u32) -> Result<Vec<FeedViewPost>, NetworkError> {
        let out: AuthorFeedOutput = self
            .query(
                GET_AUTHOR_FEED,
                &[
                    ("actor", did.to_string()),
                    ("filter", "posts_and_author_threads".to_string()),
                    ("includePins", "true".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(out.feed)
    }

    async fn apply_writes(&self, repo: &str, writes: &[RecordCreate]) -> Result<(), NetworkError> {
        let body = apply_writes_body(repo, writes);
        self.procedure(APPLY_WRITES, &body).await?;
        debug!(%repo, count = writes.len(), "applied record batch");
        Ok(())
    }

    async fn create_record(&self, repo: &str, write: &RecordCreate) -> Result<StrongRef, NetworkError> {
        let body = CreateRecordInput {
            repo,
            collection: &write.collection,
            rkey: &write.rkey,
            record: &write.value,
        };
        let response = self.procedure(CREATE_RECORD, &body).await?;
        response
            .json::<StrongRef>()
            .await
            .map_err(|e| NetworkError::Deserialization(e.to_string()))
    }
}
