use tracing::info;
use uuid::Uuid;

use yatube_db::{Database, NewPost};
use yatube_types::models::{Comment, Post};

use crate::error::{FeedError, FeedResult};
use crate::viewer::Viewer;

/// Validated contents of a create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Post and comment mutations on behalf of a viewer.
pub struct Authoring<'a> {
    db: &'a Database,
}

impl<'a> Authoring<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create_post(&self, viewer: &Viewer, draft: PostDraft) -> FeedResult<Post> {
        let author_id = viewer.require()?;
        let post = self.db.create_post(NewPost {
            author_id,
            text: draft.text,
            group_id: draft.group_id,
            image: draft.image,
        })?;

        info!(post_id = post.id, %author_id, "post created: {}", post);
        Ok(post)
    }

    /// The post, if the viewer wrote it.
    pub fn owned_post(&self, viewer: &Viewer, post_id: i64) -> FeedResult<Post> {
        let viewer_id = viewer.require()?;
        let post = self.find_post(post_id)?;
        ensure_author(&post, viewer_id)?;
        Ok(post)
    }

    pub fn edit_post(&self, viewer: &Viewer, post_id: i64, draft: PostDraft) -> FeedResult<Post> {
        let post = self.owned_post(viewer, post_id)?;
        // No new upload keeps the current image.
        let image = draft.image.or(post.image);
        self.db
            .update_post(post.id, &draft.text, draft.group_id, image.as_deref())?;

        info!(post_id, "post edited");
        self.find_post(post_id)
    }

    /// Removes the post and its comments. Cached pages keep showing it until they expire.
    pub fn delete_post(&self, viewer: &Viewer, post_id: i64) -> FeedResult<Post> {
        let post = self.owned_post(viewer, post_id)?;
        self.db.delete_post(post.id)?;

        info!(post_id, "post deleted");
        Ok(post)
    }

    pub fn add_comment(&self, viewer: &Viewer, post_id: i64, text: &str) -> FeedResult<Comment> {
        let author_id = viewer.require()?;
        let post = self.find_post(post_id)?;
        let comment = self.db.create_comment(post.id, author_id, text)?;

        info!(post_id, comment_id = comment.id, %author_id, "comment added");
        Ok(comment)
    }

    fn find_post(&self, post_id: i64) -> FeedResult<Post> {
        self.db
            .get_post(post_id)?
            .ok_or_else(|| FeedError::not_found(format!("post {}", post_id)))
    }
}

fn ensure_author(post: &Post, viewer_id: Uuid) -> FeedResult<()> {
    if post.author_id != viewer_id {
        return Err(FeedError::forbidden(format!(
            "post {} belongs to {}",
            post.id, post.author_username
        )));
    }
    Ok(())
}
