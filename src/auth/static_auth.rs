//! Glob-allowlist authenticator.
//!
//! Grounded on `examples/original_source/auth/static.go`'s `staticAuth`.

use async_trait::async_trait;

use crate::auth::Authenticator;
use crate::stream_id::StreamId;

/// Authenticates a stream id against a fixed list of glob patterns matched
/// against its original string form.
pub struct StaticAuthenticator {
    allow: Vec<String>,
}

impl StaticAuthenticator {
    /// Creates an authenticator that allows any id matching one of `allow`.
    pub fn new(allow: Vec<String>) -> Self {
        StaticAuthenticator { allow }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, id: &StreamId) -> bool {
        self.allow.iter().any(|pattern| id.matches(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_matching_pattern() {
        let auth = StaticAuthenticator::new(vec!["play/*".to_string()]);
        let id = StreamId::parse("play/foo").unwrap();
        assert!(auth.authenticate(&id).await);
    }

    #[tokio::test]
    async fn denies_unmatched_pattern() {
        let auth = StaticAuthenticator::new(vec!["publish/*".to_string()]);
        let id = StreamId::parse("play/foo").unwrap();
        assert!(!auth.authenticate(&id).await);
    }

    #[tokio::test]
    async fn wildcard_allows_everything() {
        let auth = StaticAuthenticator::new(vec!["*".to_string()]);
        let id = StreamId::parse("publish/anything").unwrap();
        assert!(auth.authenticate(&id).await);
    }
}
