use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use yatube_feed::Viewer;

use crate::session::decode_token;
use crate::state::AppState;

/// Resolve the optional bearer token into a `Viewer` extension.
/// Missing, malformed or expired tokens make the request anonymous.
pub async fn resolve_viewer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let viewer = match token {
        Some(token) => match decode_token(&state.jwt_secret, token) {
            Ok(claims) => Viewer::from(claims),
            Err(e) => {
                warn!("Ignoring invalid bearer token: {}", e);
                Viewer::Anonymous
            }
        },
        None => Viewer::Anonymous,
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}
