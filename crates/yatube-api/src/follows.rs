use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::Uri,
    response::{IntoResponse, Response},
};
use tracing::debug;

use yatube_feed::{FeedError, Viewer, author_by_username};

use crate::error::{ApiError, found};
use crate::posts::{PageQuery, profile_url, require_login};
use crate::state::{AppState, run_blocking};

/// GET /follow/
///
/// Posts by the authors the viewer follows.
pub async fn follow_index(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<PageQuery>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    require_login(&viewer, &uri)?;

    let page = query.number();
    let feed = run_blocking(&state, move |s| Ok(s.composer().followed(&viewer, page)?))
        .await
        .map_err(|e| e.at(&uri))?;
    Ok(Json(feed))
}

/// GET /profile/{username}/follow/
///
/// Following yourself is silently ignored.
pub async fn profile_follow(
    State(state): State<AppState>,
    uri: Uri,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    require_login(&viewer, &uri)?;

    let target = username.clone();
    run_blocking(&state, move |s| {
        let author = author_by_username(&s.db, &target)?;
        s.register(&viewer)?;
        let follower = viewer.require()?;
        match s.follows().follow(follower, author.id) {
            Ok(_) => Ok(()),
            Err(FeedError::SelfFollow) => {
                debug!(%follower, "ignoring self-follow");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    })
    .await
    .map_err(|e| e.at(&uri))?;

    Ok(found(&profile_url(&username)))
}

/// GET /profile/{username}/unfollow/
///
/// 404 when there is nothing to unfollow.
pub async fn profile_unfollow(
    State(state): State<AppState>,
    uri: Uri,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    require_login(&viewer, &uri)?;

    let target = username.clone();
    run_blocking(&state, move |s| {
        let author = author_by_username(&s.db, &target)?;
        s.follows().unfollow(viewer.require()?, author.id)?;
        Ok(())
    })
    .await
    .map_err(|e| e.at(&uri))?;

    Ok(found(&profile_url(&username)))
}
