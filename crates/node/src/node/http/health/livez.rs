use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::node::State as NodeState;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

/// Live while the iroh endpoint can still dial miners
pub async fn handler(state: State<NodeState>) -> (StatusCode, Json<LivenessResponse>) {
    if state.endpoint().is_closed() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(LivenessResponse { status: "closing" }),
        )
    } else {
        (StatusCode::OK, Json(LivenessResponse { status: "ok" }))
    }
}
