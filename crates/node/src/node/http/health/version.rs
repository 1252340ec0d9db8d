use axum::Json;

use crate::Version;

pub async fn handler() -> Json<Version> {
    Json(Version::new())
}
