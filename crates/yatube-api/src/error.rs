use axum::{
    Json,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use yatube_feed::FeedError;
use yatube_types::api::{ErrorPage, ValidationErrors};

pub const LOGIN_PATH: &str = "/auth/login/";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Anonymous viewer on an authenticated-only page; `next` is where to come back to.
    #[error("login required")]
    LoginRequired { next: Option<String> },

    #[error("invalid form submission")]
    Validation(ValidationErrors),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn login_required(uri: &Uri) -> Self {
        Self::LoginRequired {
            next: Some(request_target(uri)),
        }
    }

    /// Point a login redirect raised below the handler back at `uri`.
    pub fn at(self, uri: &Uri) -> Self {
        match self {
            Self::LoginRequired { next: None } => Self::login_required(uri),
            other => other,
        }
    }
}

fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound(what) => Self::NotFound(what),
            FeedError::Forbidden(why) => Self::Forbidden(why),
            FeedError::Unauthorized => Self::LoginRequired { next: None },
            FeedError::SelfFollow => {
                let mut errors = ValidationErrors::default();
                errors.add("author", FeedError::SelfFollow.to_string());
                Self::Validation(errors)
            }
            FeedError::Store(e) => e.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Store error: {:#}", err);
        Self::Internal
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        error!("Render error: {}", err);
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(what) => {
                warn!("Not found: {}", what);
                error_page(StatusCode::NOT_FOUND, "not_found", format!("{} does not exist", what))
            }
            Self::Forbidden(why) => {
                warn!("Forbidden: {}", why);
                error_page(StatusCode::FORBIDDEN, "forbidden", why)
            }
            Self::LoginRequired { next: Some(next) } => found(&login_url(&next)),
            Self::LoginRequired { next: None } => found(LOGIN_PATH),
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::Internal => error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "something went wrong".to_string(),
            ),
        }
    }
}

fn error_page(status: StatusCode, error: &str, message: String) -> Response {
    let page = ErrorPage {
        status: status.as_u16(),
        error: error.to_string(),
        message,
    };
    (status, Json(page)).into_response()
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn login_url(next: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_PATH, next)
}

/// Fallback for unknown routes.
pub async fn page_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("page {}", uri.path()))
}
