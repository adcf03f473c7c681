pub mod admin;
pub mod error;
pub mod follows;
pub mod forms;
pub mod middleware;
pub mod posts;
pub mod session;
pub mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use state::{AppState, AppStateInner};

/// Every route of the site. Each request gets a `Viewer` from its bearer token, if any.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/profile/{username}/follow/", get(follows::profile_follow))
        .route("/profile/{username}/unfollow/", get(follows::profile_unfollow))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route("/posts/{post_id}/edit/", get(posts::edit_form).post(posts::edit_post))
        .route("/posts/{post_id}/delete/", post(posts::delete_post))
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .route("/create/", get(posts::create_form).post(posts::create_post))
        .route("/follow/", get(follows::follow_index))
        .route("/admin/cache/clear/", post(admin::clear_cache))
        .route("/health", get(admin::health))
        .fallback(error::page_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_viewer,
        ))
        .with_state(state)
}
