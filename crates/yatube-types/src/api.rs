use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Author, Comment, Group, GroupRef, Post};

// -- JWT Claims --

/// Claims issued by the auth service. `sub` is the author's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Pagination --

/// One page of an ordered listing. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub per_page: u32,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous.then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next.then(|| self.number + 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// -- Feeds --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub page: Page<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFeed {
    pub author: Author,
    pub post_count: u64,
    /// Whether the current viewer follows `author`. Always false for anonymous viewers.
    pub following: bool,
    pub page: Page<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_post_count: u64,
    /// Oldest first.
    pub comments: Vec<Comment>,
    pub comment_form: CommentFormState,
}

// -- Forms --

#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    /// Group id as submitted; an empty string means "no group".
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormState {
    pub text: Option<String>,
}

/// Initial state of the create/edit post form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormState {
    pub is_edit: bool,
    pub post_id: Option<i64>,
    pub text: Option<String>,
    pub group: Option<i64>,
    pub image: Option<String>,
    pub groups: Vec<GroupRef>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPage {
    pub status: u16,
    pub error: String,
    pub message: String,
}

/// Field name -> messages.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
