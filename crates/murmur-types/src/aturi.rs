//! `at://` URI parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// A parsed `at://<authority>/<collection>/<rkey>` URI.
///
/// Only the authority is required; collection and record key are present for
/// record URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtUri {
    pub authority: String,
    pub collection: Option<String>,
    pub rkey: Option<String>,
}

impl AtUri {
    pub fn record(authority: &str, collection: &str, rkey: &str) -> Self {
        Self {
            authority: authority.to_string(),
            collection: Some(collection.to_string()),
            rkey: Some(rkey.to_string()),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl FromStr for AtUri {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| DecodeError::AtUri(s.to_string()))?;

        // Strip query/fragment, which never participate in record identity.
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let mut parts = rest.split('/');
        let authority = parts.next().unwrap_or_default();
        if authority.is_empty() || authority.contains(char::is_whitespace) {
            return Err(DecodeError::AtUri(s.to_string()));
        }

        let collection = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
        let rkey = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
        if parts.next().is_some_and(|p| !p.is_empty()) {
            return Err(DecodeError::AtUri(s.to_string()));
        }
        if rkey.is_some() && collection.is_none() {
            return Err(DecodeError::AtUri(s.to_string()));
        }

        Ok(Self {
            authority: authority.to_string(),
            collection,
            rkey,
        })
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}", self.authority)?;
        if let Some(collection) = &self.collection {
            write!(f, "/{collection}")?;
            if let Some(rkey) = &self.rkey {
                write!(f, "/{rkey}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_uri() {
        let uri: AtUri = "at://did:plc:abc123/app.bsky.feed.post/3kxyz".parse().unwrap();
        assert_eq!(uri.authority(), "did:plc:abc123");
        assert_eq!(uri.collection.as_deref(), Some("app.bsky.feed.post"));
        assert_eq!(uri.rkey.as_deref(), Some("3kxyz"));
        assert_eq!(uri.to_string(), "at://did:plc:abc123/app.bsky.feed.post/3kxyz");
    }

    #[test]
    fn test_parse_authority_only() {
        let uri: AtUri = "at://alice.bsky.social".parse().unwrap();
        assert_eq!(uri.authority(), "alice.bsky.social");
        assert!(uri.collection.is_none());
    }

    #[test]
    fn test_rejects_non_at_scheme() {
        assert!("https://bsky.app/profile/alice".parse::<AtUri>().is_err());
        assert!("at://".parse::<AtUri>().is_err());
        assert!("at://a/b/c/d".parse::<AtUri>().is_err());
    }
}
