//! # Authentication
//!
//! The gate a connection's [`crate::stream_id::StreamId`] must pass before a
//! publish or play session is allowed to start. Grounded on
//! `examples/original_source/auth/authenticator.go`'s single-method
//! `Authenticator` interface.

pub mod http_auth;
pub mod static_auth;

use async_trait::async_trait;

use crate::stream_id::StreamId;

/// Decides whether a parsed stream id may proceed.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns `true` if `id` is allowed to publish or play.
    async fn authenticate(&self, id: &StreamId) -> bool;
}

pub use http_auth::{HttpAuthConfig, HttpAuthenticator};
pub use static_auth::StaticAuthenticator;
