//! Database row types. These map directly to SQLite rows.
//! Distinct from yatube-types models to keep the DB layer independent;
//! the `into_*` conversions are the only place raw ids and timestamps are parsed.

use anyhow::{Context, Result};
use rusqlite::Row;
use uuid::Uuid;

use yatube_types::models::{Author, Comment, Group, GroupRef, Post};

use crate::parse_timestamp;

pub struct AuthorRow {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

impl AuthorRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    pub fn into_author(self) -> Result<Author> {
        Ok(Author {
            id: parse_id(&self.id)?,
            username: self.username,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct GroupRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl GroupRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
        })
    }

    pub fn into_group(self) -> Group {
        Group {
            id: self.id,
            title: self.title,
            slug: self.slug,
            description: self.description,
        }
    }
}

pub struct PostRow {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub author_id: String,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
}

impl PostRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
            author_id: row.get(3)?,
            author_username: row.get(4)?,
            group_id: row.get(5)?,
            group_title: row.get(6)?,
            group_slug: row.get(7)?,
            image: row.get(8)?,
        })
    }

    pub fn into_post(self) -> Result<Post> {
        let group = match (self.group_id, self.group_title, self.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
            _ => None,
        };

        Ok(Post {
            id: self.id,
            created_at: parse_timestamp(&self.created_at)
                .with_context(|| format!("post {}", self.id))?,
            author_id: parse_id(&self.author_id)?,
            author_username: self.author_username,
            text: self.text,
            group,
            image: self.image,
        })
    }
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: String,
    pub author_username: String,
    pub text: String,
    pub created_at: String,
}

impl CommentRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            post_id: row.get(1)?,
            author_id: row.get(2)?,
            author_username: row.get(3)?,
            text: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn into_comment(self) -> Result<Comment> {
        Ok(Comment {
            id: self.id,
            post_id: self.post_id,
            author_id: parse_id(&self.author_id)?,
            author_username: self.author_username,
            text: self.text,
            created_at: parse_timestamp(&self.created_at)
                .with_context(|| format!("comment {}", self.id))?,
        })
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .with_context(|| format!("Corrupt author id '{}'", raw))
}
