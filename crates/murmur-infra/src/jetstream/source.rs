//! JetstreamSource -- concrete [`EventSource`] over a Jetstream websocket.

use futures_util::StreamExt;
use murmur_core::consumer::{EventSource, FrameStream};
use murmur_types::error::StreamError;
use murmur_types::event::Cursor;
use murmur_types::post::POST_COLLECTION;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::frame::parse_frame;

/// Jetstream subscription filtered to feed posts.
pub struct JetstreamSource {
    host: String,
}

impl JetstreamSource {
    /// `host` is the websocket base, e.g. `wss://jetstream2.us-east.bsky.network`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    fn subscribe_url(&self, cursor: Option<Cursor>) -> String {
        let mut url = format!(
            "{}/subscribe?wantedCollections={POST_COLLECTION}",
            self.host
        );
        if let Some(cursor) = cursor {
            url.push_str(&format!("&cursor={cursor}"));
        }
        url
    }
}

impl EventSource for JetstreamSource {
    async fn subscribe(&self, cursor: Option<Cursor>) -> Result<FrameStream, StreamError> {
        let url = self.subscribe_url(cursor);
        info!(%url, "connecting to jetstream");

        let (mut socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        // Pings are answered by the socket itself while it is polled.
        let frames = async_stream::stream! {
            while let Some(message) = socket.next().await {
                match message {
                    Ok(Message::Text(text)) => yield parse_frame(text.as_str()),
                    Ok(Message::Binary(_)) => {
                        debug!("ignoring binary jetstream frame");
                    }
                    Ok(Message::Close(frame)) => {
                        warn!(?frame, "jetstream closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(StreamError::Transport(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_url_without_cursor() {
        let source = JetstreamSource::new("wss://jetstream.example/");
        assert_eq!(
            source.subscribe_url(None),
            "wss://jetstream.example/subscribe?wantedCollections=app.bsky.feed.post"
        );
    }

    #[test]
    fn test_subscribe_url_with_cursor() {
        let source = JetstreamSource::new("wss://jetstream.example");
        assert_eq!(
            source.subscribe_url(Some(Cursor(1_725_911_162_329_308))),
            "wss://jetstream.example/subscribe?wantedCollections=app.bsky.feed.post&cursor=1725911162329308"
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_transport_error() {
        let source = JetstreamSource::new("ws://127.0.0.1:9");
        let result = source.subscribe(None).await;
        assert!(matches!(result, Err(StreamError::Transport(_))));
    }
}
