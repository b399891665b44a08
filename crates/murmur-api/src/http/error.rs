//! Application error type mapping to HTTP status codes.
//!
//! Every error body is `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use murmur_core::tools::ToolError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Missing or wrong bearer token.
    Unauthorized,
    /// The request body was rejected before reaching a tool.
    Validation(String),
    /// A tool failed while talking to the network.
    Tool(ToolError),
}

impl From<ToolError> for AppError {
    fn from(e: ToolError) -> Self {
        AppError::Tool(e)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Tool(ToolError::EmptyText) => {
                (StatusCode::BAD_REQUEST, ToolError::EmptyText.to_string())
            }
            AppError::Tool(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %message, "tool request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_types::error::NetworkError;

    #[test]
    fn test_unauthorized_is_forbidden() {
        let (status, message) = AppError::Unauthorized.status_and_message();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message, "unauthorized");
    }

    #[test]
    fn test_tool_errors_map_to_status() {
        let (status, _) = AppError::Tool(ToolError::EmptyText).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let err = AppError::from(ToolError::Network(NetworkError::Request("refused".into())));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("refused"));
    }

    #[test]
    fn test_response_status() {
        let response = AppError::Validation("bad body".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
