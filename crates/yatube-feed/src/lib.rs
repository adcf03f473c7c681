pub mod authoring;
pub mod cache;
pub mod composer;
pub mod error;
pub mod follow;
pub mod pagination;
pub mod viewer;

use yatube_db::Database;
use yatube_types::models::Author;

pub use authoring::{Authoring, PostDraft};
pub use cache::{Clock, ManualClock, PageCache, SystemClock};
pub use composer::FeedComposer;
pub use error::{FeedError, FeedResult};
pub use follow::{FollowGraph, FollowOutcome};
pub use pagination::{Paginator, parse_page};
pub use viewer::Viewer;

/// Look up an author by handle, mapping absence to `NotFound`.
pub fn author_by_username(db: &Database, username: &str) -> FeedResult<Author> {
    db.get_author_by_username(username)?
        .ok_or_else(|| FeedError::not_found(format!("author '{}'", username)))
}
