//! HTTP-backend authenticator.
//!
//! POSTs form data to a configured URL; a 2xx response allows the
//! connection. Grounded on `examples/original_source/auth/http.go`'s
//! `httpAuth.Authenticate` (field names `call`/`app`/`name`/`username`/the
//! configurable password parameter, deny-and-log on transport error).

use std::time::Duration;

use async_trait::async_trait;

use crate::auth::Authenticator;
use crate::stream_id::StreamId;

/// Configuration for [`HttpAuthenticator`].
#[derive(Debug, Clone)]
pub struct HttpAuthConfig {
    /// The URL to POST form data to.
    pub url: String,
    /// The `app` form field sent with every request.
    pub application: String,
    /// Request timeout.
    pub timeout: Duration,
    /// The form field name the stream's password is sent under.
    pub password_param: String,
}

/// Authenticates by delegating to an external HTTP endpoint.
pub struct HttpAuthenticator {
    config: HttpAuthConfig,
    client: reqwest::Client,
}

impl HttpAuthenticator {
    /// Builds a client with `config.timeout` as its request timeout.
    pub fn new(config: HttpAuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("http auth client configuration is always valid");
        HttpAuthenticator { config, client }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, id: &StreamId) -> bool {
        let params = [
            ("call", id.mode().as_str()),
            ("app", self.config.application.as_str()),
            ("name", id.name()),
            ("username", id.username()),
            (self.config.password_param.as_str(), id.password()),
        ];

        let response = match self.client.post(&self.config.url).form(&params).send().await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("http-auth: request failed: {}", err);
                return false;
            }
        };

        response.status().is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deny_on_unreachable_backend() {
        let auth = HttpAuthenticator::new(HttpAuthConfig {
            url: "http://127.0.0.1:1".to_string(), // nothing listens here
            application: "live".to_string(),
            timeout: Duration::from_millis(200),
            password_param: "password".to_string(),
        });
        let id = StreamId::parse("play/foo").unwrap();
        assert!(!auth.authenticate(&id).await);
    }
}
