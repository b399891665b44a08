//! Bearer token authentication extractor for the tool endpoints.
//!
//! The configured key is kept only as its SHA-256 digest; the presented
//! token is hashed and the digests compared.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker. Extracting this validates the bearer token.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts).ok_or(AppError::Unauthorized)?;
        if hash_api_key(token) == state.api_key_hash.as_str() {
            Ok(Authenticated)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Token of an `Authorization: <scheme> <token>` header.
fn extract_bearer(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get("authorization")?.to_str().ok()?;
    let mut pieces = header.split(' ');
    let (_scheme, token) = (pieces.next()?, pieces.next()?);
    if pieces.next().is_some() || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/tools/recent-posts");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&parts_with(Some("Bearer secret"))), Some("secret"));
        assert_eq!(extract_bearer(&parts_with(None)), None);
        assert_eq!(extract_bearer(&parts_with(Some("secret"))), None);
        assert_eq!(extract_bearer(&parts_with(Some("Bearer a b"))), None);
    }

    #[test]
    fn test_hash_api_key_is_stable_hex() {
        let hash = hash_api_key("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key("secret"));
        assert_ne!(hash, hash_api_key("Secret"));
    }
}
