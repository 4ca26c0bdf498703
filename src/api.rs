//! # Observability HTTP surface
//!
//! A thin `axum` router exposing `GET /streams` and `GET /sockets` JSON
//! snapshots. Grounded on `examples/original_source/api/server.go`'s
//! `/streams` handler; `axum` is enriched from `zijiren233-synctv`'s
//! dependency stack since the teacher carries no HTTP server crate.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::listener::{Server, SocketStatistics};
use crate::relay::StreamStatistics;

/// Builds the observability router over a shared [`Server`] handle.
pub fn router(server: Arc<Server>) -> Router {
    Router::new()
        .route("/streams", get(get_streams))
        .route("/sockets", get(get_sockets))
        .with_state(server)
}

async fn get_streams(State(server): State<Arc<Server>>) -> Json<Vec<StreamStatistics>> {
    Json(server.statistics())
}

async fn get_sockets(State(server): State<Arc<Server>>) -> Json<Vec<SocketStatistics>> {
    Json(server.socket_statistics())
}
