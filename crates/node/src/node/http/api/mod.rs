use axum::{routing, Router};
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

mod deals;
mod error;
mod propose;
mod query;
mod vouchers;

pub use deals::handler as deals_handler;
pub use propose::handler as propose_handler;
pub use query::handler as query_handler;
pub use vouchers::handler as vouchers_handler;

use crate::node::State as NodeState;

pub fn router(state: NodeState) -> Router<NodeState> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, ORIGIN, CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .route(
            "/deals",
            routing::post(propose_handler).get(deals_handler),
        )
        .route("/deals/:cid", routing::get(query_handler))
        .route("/deals/:cid/vouchers", routing::get(vouchers_handler))
        .with_state(state)
        .layer(cors_layer)
}
