use std::collections::HashSet;
use std::sync::Arc;

use tracing::error;

use yatube_db::Database;
use yatube_feed::{Authoring, FeedComposer, FollowGraph, PageCache, Paginator, Viewer};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub cache: PageCache,
    pub paginator: Paginator,
    pub jwt_secret: String,
    /// Usernames allowed to clear the page cache.
    pub admins: HashSet<String>,
}

impl AppStateInner {
    pub fn composer(&self) -> FeedComposer<'_> {
        FeedComposer::new(&self.db, self.paginator)
    }

    pub fn follows(&self) -> FollowGraph<'_> {
        FollowGraph::new(&self.db)
    }

    pub fn authoring(&self) -> Authoring<'_> {
        Authoring::new(&self.db)
    }

    pub fn is_admin(&self, viewer: &Viewer) -> bool {
        match viewer {
            Viewer::Author { username, .. } => self.admins.contains(username),
            Viewer::Anonymous => false,
        }
    }

    /// Record an authenticated viewer in the store the first time they act.
    pub fn register(&self, viewer: &Viewer) -> Result<(), ApiError> {
        if let Viewer::Author { id, username } = viewer {
            if !self.db.ensure_author(*id, username)? {
                return Err(ApiError::Forbidden(format!(
                    "username '{}' belongs to another account",
                    username
                )));
            }
        }
        Ok(())
    }
}

/// Run blocking store work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}
