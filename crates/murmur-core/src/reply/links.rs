//! URL detection for link preview embeds.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).expect("URL pattern is valid")
});

/// First URL-like substring in `text`, with trailing sentence punctuation
/// removed.
pub fn first_url(text: &str) -> Option<&str> {
    let found = URL_RE.find(text)?.as_str();
    let trimmed = found.trim_end_matches(['.', ',', ';', ':', '!', '?']);
    (!trimmed.ends_with("://")).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_first_url_only() {
        let text = "see https://a.example/x and http://b.example";
        assert_eq!(first_url(text), Some("https://a.example/x"));
    }

    #[test]
    fn test_strips_trailing_punctuation() {
        assert_eq!(
            first_url("read this: https://example.com/post?id=1."),
            Some("https://example.com/post?id=1")
        );
        assert_eq!(first_url("(https://example.com)"), Some("https://example.com"));
    }

    #[test]
    fn test_no_url() {
        assert_eq!(first_url("no links here, just www text"), None);
        assert_eq!(first_url("ftp://example.com"), None);
    }
}
