use crate::cascade::{self, Entity};
use crate::models::{AuthorRow, CommentRow, GroupRow, PostRow, parse_id};
use crate::{Database, format_timestamp, next_timestamp};
use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use tracing::warn;
use uuid::Uuid;

use yatube_types::models::{Author, Comment, Group, Post};

const POST_SELECT: &str = "SELECT p.id, p.text, p.created_at, p.author_id, a.username,
        p.group_id, g.title, g.slug, p.image
     FROM posts p
     JOIN authors a ON a.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

const POST_ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC";

/// Which posts a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
    Authors(Vec<Uuid>),
}

pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Database {
    // -- Authors --

    pub fn create_author(&self, username: &str) -> Result<Author> {
        let id = Uuid::new_v4();
        if !self.ensure_author(id, username)? {
            return Err(anyhow!("Username '{}' is already taken", username));
        }
        self.get_author_by_id(id)?
            .ok_or_else(|| anyhow!("Author {} vanished after insert", id))
    }

    /// Registers an author known to the auth service. No-op if the id exists.
    ///
    /// Returns false when `username` already belongs to a different id; nothing
    /// is written then.
    pub fn ensure_author(&self, id: Uuid, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO authors (id, username, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO NOTHING",
                (id.to_string(), username, format_timestamp(Utc::now())),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    warn!(%id, username, "username already registered to another author");
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_author_by_username(&self, username: &str) -> Result<Option<Author>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, created_at FROM authors WHERE username = ?1",
                [username],
                AuthorRow::from_row,
            )
            .optional()?
            .map(AuthorRow::into_author)
            .transpose()
        })
    }

    pub fn get_author_by_id(&self, id: Uuid) -> Result<Option<Author>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, created_at FROM authors WHERE id = ?1",
                [id.to_string()],
                AuthorRow::from_row,
            )
            .optional()?
            .map(AuthorRow::into_author)
            .transpose()
        })
    }

    pub fn delete_author(&self, id: Uuid) -> Result<bool> {
        self.delete(Entity::Author, Value::Text(id.to_string()))
    }

    // -- Groups --

    pub fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Group> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
                (title, slug, description),
            )?;
            Ok(Group {
                id: conn.last_insert_rowid(),
                title: title.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
            })
        })
    }

    pub fn get_group(&self, id: i64) -> Result<Option<Group>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, slug, description FROM post_groups WHERE id = ?1",
                    [id],
                    GroupRow::from_row,
                )
                .optional()?;
            Ok(row.map(GroupRow::into_group))
        })
    }

    pub fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
                    [slug],
                    GroupRow::from_row,
                )
                .optional()?;
            Ok(row.map(GroupRow::into_group))
        })
    }

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")?;
            let rows = stmt
                .query_map([], GroupRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(GroupRow::into_group).collect())
        })
    }

    /// Posts in the group keep existing with no group.
    pub fn delete_group(&self, id: i64) -> Result<bool> {
        self.delete(Entity::Group, Value::Integer(id))
    }

    // -- Posts --

    pub fn create_post(&self, new: NewPost) -> Result<Post> {
        let id = self.with_conn(|conn| {
            let created_at = next_timestamp(conn, "posts")?;
            conn.execute(
                "INSERT INTO posts (text, created_at, author_id, group_id, image) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![new.text, created_at, new.author_id.to_string(), new.group_id, new.image],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        self.get_post(id)?
            .ok_or_else(|| anyhow!("Post {} vanished after insert", id))
    }

    /// Rewrites the mutable fields of a post. `created_at` and `author_id` never change.
    pub fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
                rusqlite::params![text, group_id, image, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE p.id = ?1", POST_SELECT),
                [id],
                PostRow::from_row,
            )
            .optional()?
            .map(PostRow::into_post)
            .transpose()
        })
    }

    /// Deletes the post and its comments. Its image reference goes with the row.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.delete(Entity::Post, Value::Integer(id))
    }

    pub fn posts_all(&self, limit: u32, offset: u64) -> Result<Vec<Post>> {
        self.posts_in(&PostScope::All, limit, offset)
    }

    pub fn count_posts(&self) -> Result<u64> {
        self.count_posts_in(&PostScope::All)
    }

    pub fn posts_by_group(&self, group_id: i64, limit: u32, offset: u64) -> Result<Vec<Post>> {
        self.posts_in(&PostScope::Group(group_id), limit, offset)
    }

    pub fn count_posts_by_group(&self, group_id: i64) -> Result<u64> {
        self.count_posts_in(&PostScope::Group(group_id))
    }

    pub fn posts_by_author(&self, author_id: Uuid, limit: u32, offset: u64) -> Result<Vec<Post>> {
        self.posts_in(&PostScope::Author(author_id), limit, offset)
    }

    pub fn count_posts_by_author(&self, author_id: Uuid) -> Result<u64> {
        self.count_posts_in(&PostScope::Author(author_id))
    }

    pub fn posts_by_authors_in(&self, author_ids: &[Uuid], limit: u32, offset: u64) -> Result<Vec<Post>> {
        self.posts_in(&PostScope::Authors(author_ids.to_vec()), limit, offset)
    }

    pub fn count_posts_by_authors_in(&self, author_ids: &[Uuid]) -> Result<u64> {
        self.count_posts_in(&PostScope::Authors(author_ids.to_vec()))
    }

    pub fn posts_in(&self, scope: &PostScope, limit: u32, offset: u64) -> Result<Vec<Post>> {
        if scope.is_empty() {
            return Ok(vec![]);
        }
        self.with_conn(|conn| query_posts(conn, scope, limit, offset))
    }

    pub fn count_posts_in(&self, scope: &PostScope) -> Result<u64> {
        if scope.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| count_posts(conn, scope))
    }

    /// Counts the scope, asks `window` for `(limit, offset)` given that total,
    /// and fetches the slice, all under one hold of the connection. The total
    /// always describes the rows the slice was cut from.
    pub fn page_of_posts<W>(&self, scope: &PostScope, window: W) -> Result<(u64, Vec<Post>)>
    where
        W: FnOnce(u64) -> (u32, u64),
    {
        if scope.is_empty() {
            return Ok((0, vec![]));
        }
        self.with_conn(|conn| {
            let total = count_posts(conn, scope)?;
            let (limit, offset) = window(total);
            let posts = query_posts(conn, scope, limit, offset)?;
            Ok((total, posts))
        })
    }

    // -- Comments --

    pub fn create_comment(&self, post_id: i64, author_id: Uuid, text: &str) -> Result<Comment> {
        let id = self.with_conn(|conn| {
            let created_at = next_timestamp(conn, "comments")?;
            conn.execute(
                "INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![post_id, author_id.to_string(), text, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        self.with_conn(|conn| {
            conn.query_row(
                "SELECT c.id, c.post_id, c.author_id, a.username, c.text, c.created_at
                 FROM comments c JOIN authors a ON a.id = c.author_id
                 WHERE c.id = ?1",
                [id],
                CommentRow::from_row,
            )?
            .into_comment()
        })
    }

    /// Oldest first.
    pub fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.author_id, a.username, c.text, c.created_at
                 FROM comments c JOIN authors a ON a.id = c.author_id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC",
            )?;
            let rows = stmt
                .query_map([post_id], CommentRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(CommentRow::into_comment).collect()
        })
    }

    // -- Follows --

    /// Returns false when the edge already existed. The primary key makes
    /// concurrent duplicate inserts collapse into one row.
    pub fn insert_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO follows (user_id, author_id, created_at) VALUES (?1, ?2, ?3)",
                (user_id.to_string(), author_id.to_string(), format_timestamp(Utc::now())),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Returns false when there was no edge to remove.
    pub fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
                (user_id.to_string(), author_id.to_string()),
            )?;
            Ok(removed > 0)
        })
    }

    pub fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2)",
                (user_id.to_string(), author_id.to_string()),
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn followed_author_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT author_id FROM follows WHERE user_id = ?1 ORDER BY author_id")?;
            let ids = stmt
                .query_map([user_id.to_string()], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ids.iter().map(|id| parse_id(id)).collect()
        })
    }

    fn delete(&self, entity: Entity, key: Value) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let removed = cascade::delete_entity(&tx, entity, &key)?;
            tx.commit()?;
            Ok(removed > 0)
        })
    }
}

impl PostScope {
    /// An empty author set matches nothing, so no query is needed.
    fn is_empty(&self) -> bool {
        matches!(self, Self::Authors(ids) if ids.is_empty())
    }

    fn clause(&self) -> (String, Vec<Value>) {
        match self {
            Self::All => (String::new(), vec![]),
            Self::Group(id) => ("WHERE p.group_id = ?".into(), vec![Value::Integer(*id)]),
            Self::Author(id) => ("WHERE p.author_id = ?".into(), vec![Value::Text(id.to_string())]),
            Self::Authors(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                let params = ids.iter().map(|id| Value::Text(id.to_string())).collect();
                (format!("WHERE p.author_id IN ({})", placeholders), params)
            }
        }
    }
}

fn query_posts(conn: &Connection, scope: &PostScope, limit: u32, offset: u64) -> Result<Vec<Post>> {
    let (filter, mut params) = scope.clause();
    let sql = format!("{} {} {} LIMIT ? OFFSET ?", POST_SELECT, filter, POST_ORDER);
    params.push(Value::Integer(i64::from(limit)));
    params.push(Value::Integer(i64::try_from(offset)?));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), PostRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(PostRow::into_post).collect()
}

fn count_posts(conn: &Connection, scope: &PostScope) -> Result<u64> {
    let (filter, params) = scope.clause();
    let sql = format!("SELECT COUNT(*) FROM posts p {}", filter);
    let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(u64::try_from(count)?)
}
