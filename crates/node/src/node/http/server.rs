//! HTTP surface of the deal client: the deal API under `/api/v0` and probes
//! under `/_status`

use std::net::SocketAddr;

use anyhow::Result;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tokio::sync::watch::Receiver as WatchReceiver;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::node::State as NodeState;

use super::api;
use super::health;

const HEALTH_PREFIX: &str = "/_status";
const API_PREFIX: &str = "/api/v0";

/// Deal requests are a handful of fields
const API_REQUEST_SIZE_LIMIT: usize = 16 * 1_024;

pub async fn run(
    remote_listen_addr: SocketAddr,
    log_level: tracing::Level,
    state: NodeState,
    mut shutdown_rx: WatchReceiver<()>,
) -> Result<()> {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(log_level))
        .on_response(
            DefaultOnResponse::new()
                .level(log_level)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Millis));

    let node_id = state.iroh_node_id();
    let api_router =
        api::router(state.clone()).layer(RequestBodyLimitLayer::new(API_REQUEST_SIZE_LIMIT));

    let root_router = Router::new()
        .nest(API_PREFIX, api_router)
        .nest(HEALTH_PREFIX, health::router(state.clone()))
        .fallback(not_found)
        .with_state(state)
        .layer(trace_layer);

    let listener = tokio::net::TcpListener::bind(remote_listen_addr).await?;
    tracing::info!(addr = %remote_listen_addr, %node_id, "deal api listening");

    axum::serve(listener, root_router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

/// Unknown routes answer in the same `{"error": ...}` shape as the deal API
async fn not_found(uri: Uri) -> Response {
    let body = Json(serde_json::json!({
        "error": format!("no route for {}", uri.path()),
    }));
    (StatusCode::NOT_FOUND, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_routes_answer_with_json_errors() {
        let response = not_found(Uri::from_static("/api/v0/deal")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "no route for /api/v0/deal");
    }
}
