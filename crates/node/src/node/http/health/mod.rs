//! Probes for the deal client: liveness of the iroh endpoint, readiness with
//! the node's identity and deal count, and build info

use axum::routing::get;
use axum::Router;
use http::header::{ACCEPT, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

mod livez;
mod readyz;
mod version;

use crate::node::State as NodeState;

/// Probes carry no body, only headers count against this
const PROBE_REQUEST_SIZE_LIMIT: usize = 1_024;

pub fn router(state: NodeState) -> Router<NodeState> {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers([ACCEPT, ORIGIN])
        .allow_origin(Any);

    Router::new()
        .route("/livez", get(livez::handler))
        .route("/readyz", get(readyz::handler))
        .route("/versionz", get(version::handler))
        .with_state(state)
        .layer(cors_layer)
        .layer(RequestBodyLimitLayer::new(PROBE_REQUEST_SIZE_LIMIT))
}
