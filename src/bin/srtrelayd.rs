//! Process entry point: loads configuration, builds the authenticator and
//! relay registry, starts the observability HTTP surface, and waits for a
//! shutdown signal.
//!
//! Grounded on `examples/original_source/main.go`/`srt/server.go`'s top
//! level wiring. Binding the actual SRT listeners is left to an integrator:
//! this binary only wires the transport-agnostic core together and exposes
//! [`srtrelay::listener::Server::listen`] for whatever concrete
//! `PacketListener` (an SRT binding) is supplied at deployment time, since
//! the SRT transport itself is out of this crate's scope.

use std::sync::Arc;

use srtrelay::auth::{Authenticator, HttpAuthConfig, HttpAuthenticator, StaticAuthenticator};
use srtrelay::config::{AuthConfig, RelayConfig};
use srtrelay::listener::Server;
use srtrelay::relay::Relay;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match RelayConfig::load(&["./srtrelay.toml", "/etc/srtrelay/srtrelay.toml"]) {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let auth: Arc<dyn Authenticator> = match &config.auth {
        AuthConfig::Static { allow } => Arc::new(StaticAuthenticator::new(allow.clone())),
        AuthConfig::Http {
            url,
            application,
            timeout,
            password_param,
        } => Arc::new(HttpAuthenticator::new(HttpAuthConfig {
            url: url.clone(),
            application: application.clone(),
            timeout: *timeout,
            password_param: password_param.clone(),
        })),
    };

    let relay = Relay::new(config.buffer_size, config.packet_size);
    let server = Server::new(
        Arc::clone(&relay),
        auth,
        config.packet_size,
        config.sync_clients,
        config.public_address.clone(),
    );

    if config.api.enabled {
        let api_addr = config.api.address.clone();
        let server_for_api = Arc::clone(&server);
        tokio::spawn(async move {
            let app = srtrelay::api::router(server_for_api);
            match tokio::net::TcpListener::bind(&api_addr).await {
                Ok(listener) => {
                    log::info!("observability surface listening on {}", api_addr);
                    if let Err(e) = axum::serve(listener, app).await {
                        log::error!("observability surface stopped: {}", e);
                    }
                }
                Err(e) => log::error!("failed to bind observability surface {}: {}", api_addr, e),
            }
        });
    }

    log::info!(
        "srtrelay core ready; configured listen addresses: {:?} (bind an SRT PacketListener to Server::listen to start accepting connections)",
        config.addresses
    );

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown signal received"),
        Err(e) => log::error!("failed to listen for shutdown signal: {}", e),
    }
    server.shutdown();
}
