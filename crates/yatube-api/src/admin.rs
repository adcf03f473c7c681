use axum::{
    Extension, Json,
    extract::State,
    http::Uri,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use yatube_feed::Viewer;

use crate::error::ApiError;
use crate::posts::require_login;
use crate::state::AppState;

/// POST /admin/cache/clear/
///
/// Drop every cached page immediately.
pub async fn clear_cache(
    State(state): State<AppState>,
    uri: Uri,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    require_login(&viewer, &uri)?;
    if !state.is_admin(&viewer) {
        return Err(ApiError::Forbidden("cache administration is limited to admins".into()));
    }

    let cleared = state.cache.clear();
    info!(cleared, ?viewer, "page cache cleared by admin");
    Ok(Json(json!({ "cleared": cleared })))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
