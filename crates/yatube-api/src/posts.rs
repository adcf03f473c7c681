use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    http::{Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;

use yatube_feed::{FeedError, Viewer, parse_page};
use yatube_types::api::{CommentForm, PostForm, PostFormState};
use yatube_types::models::GroupRef;

use crate::error::{ApiError, found};
use crate::forms::{validate_comment_form, validate_post_form};
use crate::state::{AppState, AppStateInner, run_blocking};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub(crate) fn number(&self) -> Option<i64> {
        parse_page(self.page.as_deref())
    }
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// GET /
///
/// The global feed, served from the page cache while fresh.
pub async fn index(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let key = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    if let Some(body) = state.cache.get(&key) {
        return Ok(json_body(body));
    }

    let page = query.number();
    let body = run_blocking(&state, move |s| {
        let feed = s.composer().global(page)?;
        Ok(serde_json::to_vec(&feed)?)
    })
    .await?;

    let body = Bytes::from(body);
    state.cache.insert(key, body.clone());
    Ok(json_body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.number();
    let feed = run_blocking(&state, move |s| Ok(s.composer().group(&slug, page)?)).await?;
    Ok(Json(feed))
}

/// GET /profile/{username}/
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.number();
    let feed = run_blocking(&state, move |s| Ok(s.composer().profile(&username, &viewer, page)?)).await?;
    Ok(Json(feed))
}

/// GET /posts/{id}/
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let detail = run_blocking(&state, move |s| Ok(s.composer().post_detail(post_id)?)).await?;
    Ok(Json(detail))
}

/// GET /create/
///
/// Empty post form.
pub async fn create_form(
    State(state): State<AppState>,
    uri: Uri,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    require_login(&viewer, &uri)?;

    let groups = run_blocking(&state, move |s| group_choices(s))
        .await
        .map_err(|e| e.at(&uri))?;
    Ok(Json(PostFormState {
        is_edit: false,
        post_id: None,
        text: None,
        group: None,
        image: None,
        groups,
    }))
}

/// POST /create/
///
/// Redirects to the author's profile.
pub async fn create_post(
    State(state): State<AppState>,
    uri: Uri,
    Extension(viewer): Extension<Viewer>,
    Form(form): Form<PostForm>,
) -> Result<Response, ApiError> {
    require_login(&viewer, &uri)?;

    let username = run_blocking(&state, move |s| {
        let draft = validate_post_form(&s.db, form)?;
        s.register(&viewer)?;
        let post = s.authoring().create_post(&viewer, draft)?;
        Ok(post.author_username)
    })
    .await
    .map_err(|e| e.at(&uri))?;

    Ok(found(&profile_url(&username)))
}

/// GET /posts/{id}/edit/
///
/// The post's current values. Non-authors are sent back to the post.
pub async fn edit_form(
    State(state): State<AppState>,
    uri: Uri,
    Path(post_id): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    require_login(&viewer, &uri)?;

    let result = run_blocking(&state, move |s| {
        let post = match s.authoring().owned_post(&viewer, post_id) {
            Ok(post) => post,
            Err(FeedError::Forbidden(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(PostFormState {
            is_edit: true,
            post_id: Some(post.id),
            text: Some(post.text),
            group: post.group.map(|g| g.id),
            image: post.image,
            groups: group_choices(s)?,
        }))
    })
    .await
    .map_err(|e| e.at(&uri))?;

    match result {
        Some(form) => Ok(Json(form).into_response()),
        None => Ok(found(&post_url(post_id))),
    }
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    State(state): State<AppState>,
    uri: Uri,
    Path(post_id): Path<String>,
    Extension(viewer): Extension<Viewer>,
    Form(form): Form<PostForm>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    require_login(&viewer, &uri)?;

    run_blocking(&state, move |s| {
        let authoring = s.authoring();
        // Ownership first: a non-author gets redirected even with an invalid form.
        match authoring.owned_post(&viewer, post_id) {
            Ok(_) => {}
            Err(FeedError::Forbidden(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let draft = validate_post_form(&s.db, form)?;
        authoring.edit_post(&viewer, post_id, draft)?;
        Ok(())
    })
    .await
    .map_err(|e| e.at(&uri))?;

    Ok(found(&post_url(post_id)))
}

/// POST /posts/{id}/delete/
///
/// Redirects to the author's profile.
pub async fn delete_post(
    State(state): State<AppState>,
    uri: Uri,
    Path(post_id): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    require_login(&viewer, &uri)?;

    let deleted = run_blocking(&state, move |s| match s.authoring().delete_post(&viewer, post_id) {
        Ok(post) => Ok(Some(post)),
        Err(FeedError::Forbidden(_)) => Ok(None),
        Err(e) => Err(e.into()),
    })
    .await
    .map_err(|e| e.at(&uri))?;

    match deleted {
        Some(post) => Ok(found(&profile_url(&post.author_username))),
        None => Ok(found(&post_url(post_id))),
    }
}

/// POST /posts/{id}/comment/
pub async fn add_comment(
    State(state): State<AppState>,
    uri: Uri,
    Path(post_id): Path<String>,
    Extension(viewer): Extension<Viewer>,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    require_login(&viewer, &uri)?;

    run_blocking(&state, move |s| {
        let text = validate_comment_form(form)?;
        s.register(&viewer)?;
        s.authoring().add_comment(&viewer, post_id, &text)?;
        Ok(())
    })
    .await
    .map_err(|e| e.at(&uri))?;

    Ok(found(&post_url(post_id)))
}

/// Only all-digit ids name a post; anything else is an unknown page.
fn parse_post_id(raw: &str) -> Result<i64, ApiError> {
    let unknown = || ApiError::NotFound(format!("post '{}'", raw));
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unknown());
    }
    raw.parse().map_err(|_| unknown())
}

pub(crate) fn require_login(viewer: &Viewer, uri: &Uri) -> Result<(), ApiError> {
    if viewer.is_authenticated() {
        Ok(())
    } else {
        Err(ApiError::login_required(uri))
    }
}

fn group_choices(s: &AppStateInner) -> Result<Vec<GroupRef>, ApiError> {
    Ok(s.db
        .list_groups()?
        .into_iter()
        .map(|g| GroupRef {
            id: g.id,
            title: g.title,
            slug: g.slug,
        })
        .collect())
}

fn json_body(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
