//! ClickHouseArchive -- concrete [`PostArchive`] over the ClickHouse HTTP
//! interface.
//!
//! Queries use server-side parameters (`{root:String}`) so the thread URI is
//! never spliced into the SQL text. Rows come back as `JSONEachRow`.

use chrono::{DateTime, NaiveDateTime, Utc};
use murmur_core::repository::archive::PostArchive;
use murmur_types::error::RepositoryError;
use murmur_types::profile::HistoricalPost;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

const THREAD_QUERY: &str = "SELECT uri, did, text, parent_uri, root_uri, created_at \
     FROM {table:Identifier} \
     WHERE (root_uri = {root:String} OR uri = {root:String}) \
     AND created_at >= now() - INTERVAL {window:UInt32} DAY \
     FORMAT JSONEachRow";

/// Connection settings for the archive.
pub struct ClickHouseConfig {
    /// HTTP endpoint, e.g. `http://localhost:8123`.
    pub url: String,
    pub database: String,
    pub user: String,
    pub password: SecretString,
}

/// Read-only view over the `post` table.
pub struct ClickHouseArchive {
    http: reqwest::Client,
    config: ClickHouseConfig,
}

#[derive(Deserialize)]
struct PostRow {
    uri: String,
    did: String,
    text: String,
    #[serde(default)]
    parent_uri: String,
    #[serde(default)]
    root_uri: String,
    created_at: String,
}

impl ClickHouseArchive {
    pub fn new(http: reqwest::Client, config: ClickHouseConfig) -> Self {
        Self { http, config }
    }

    fn table(&self) -> String {
        format!("{}.post", self.config.database)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Parse a `DateTime64` rendered in ClickHouse's default text format.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| RepositoryError::Query(format!("invalid created_at '{value}': {e}")))
}

fn parse_rows(body: &str) -> Result<Vec<HistoricalPost>, RepositoryError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let row: PostRow = serde_json::from_str(line)
                .map_err(|e| RepositoryError::Query(format!("invalid archive row: {e}")))?;
            Ok(HistoricalPost {
                created_at: parse_timestamp(&row.created_at)?,
                uri: row.uri,
                did: row.did,
                text: row.text,
                parent_uri: non_empty(row.parent_uri),
                root_uri: non_empty(row.root_uri),
            })
        })
        .collect()
}

impl PostArchive for ClickHouseArchive {
    async fn thread_posts(
        &self,
        root_uri: &str,
        window_days: u32,
    ) -> Result<Vec<HistoricalPost>, RepositoryError> {
        let response = self
            .http
            .post(&self.config.url)
            .header("X-ClickHouse-User", &self.config.user)
            .header("X-ClickHouse-Key", self.config.password.expose_secret())
            .query(&[
                ("database", self.config.database.clone()),
                ("param_table", self.table()),
                ("param_root", root_uri.to_string()),
                ("param_window", window_days.to_string()),
            ])
            .body(THREAD_QUERY)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, url = %self.config.url, "archive request failed");
                RepositoryError::Connection
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        if !status.is_success() {
            return Err(RepositoryError::Query(format!(
                "archive returned status {}: {body}",
                status.as_u16()
            )));
        }

        let posts = parse_rows(&body)?;
        debug!(%root_uri, count = posts.len(), "loaded archived thread posts");
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_archive_is_connection_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let archive = ClickHouseArchive::new(
            reqwest::Client::new(),
            ClickHouseConfig {
                url: "http://127.0.0.1:9".to_string(),
                database: "bsky".to_string(),
                user: "default".to_string(),
                password: SecretString::from("x".to_string()),
            },
        );
        let err = archive.thread_posts("at://did:plc:a/app.bsky.feed.post/1", 7).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Connection));
    }

    #[test]
    fn test_parse_rows() {
        let body = concat!(
            r#"{"uri":"at://did:plc:a/app.bsky.feed.post/1","did":"did:plc:a","text":"root","parent_uri":"","root_uri":"","created_at":"2025-03-01 12:00:00.123"}"#,
            "\n",
            r#"{"uri":"at://did:plc:b/app.bsky.feed.post/2","did":"did:plc:b","text":"reply","parent_uri":"at://did:plc:a/app.bsky.feed.post/1","root_uri":"at://did:plc:a/app.bsky.feed.post/1","created_at":"2025-03-01 12:01:00"}"#,
            "\n"
        );
        let posts = parse_rows(body).unwrap();

        assert_eq!(posts.len(), 2);
        assert!(posts[0].parent_uri.is_none());
        assert!(posts[0].root_uri.is_none());
        assert_eq!(posts[0].created_at.timestamp_subsec_millis(), 123);
        assert_eq!(
            posts[1].parent_uri.as_deref(),
            Some("at://did:plc:a/app.bsky.feed.post/1")
        );
    }

    #[test]
    fn test_parse_rows_empty_body() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_timestamp_accepts_rfc3339() {
        let ts = parse_timestamp("2025-03-01T12:00:00Z").unwrap();
        assert_eq!(ts.timestamp(), 1_740_830_400);
    }

    #[test]
    fn test_parse_rows_rejects_bad_timestamp() {
        let body = r#"{"uri":"u","did":"d","text":"t","created_at":"yesterday"}"#;
        assert!(matches!(parse_rows(body), Err(RepositoryError::Query(_))));
    }
}
