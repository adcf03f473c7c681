//! What happens to dependent rows when an entity is deleted.
//!
//! The schema's foreign keys only guard integrity; every cascade and
//! set-null is listed in [`DELETE_RULES`] and applied by [`delete_entity`].

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Author,
    Group,
    Post,
    Comment,
    Follow,
}

impl Entity {
    pub fn table(self) -> &'static str {
        match self {
            Self::Author => "authors",
            Self::Group => "post_groups",
            Self::Post => "posts",
            Self::Comment => "comments",
            Self::Follow => "follows",
        }
    }

    /// Single-column primary key, if the entity has one.
    pub fn key(self) -> Option<&'static str> {
        match self {
            Self::Follow => None,
            _ => Some("id"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

/// On delete of `parent`, apply `action` to every `child` whose `column` references it.
#[derive(Debug, Clone, Copy)]
pub struct DeleteRule {
    pub parent: Entity,
    pub child: Entity,
    pub column: &'static str,
    pub action: OnDelete,
}

pub const DELETE_RULES: &[DeleteRule] = &[
    DeleteRule { parent: Entity::Author, child: Entity::Post, column: "author_id", action: OnDelete::Cascade },
    DeleteRule { parent: Entity::Author, child: Entity::Comment, column: "author_id", action: OnDelete::Cascade },
    DeleteRule { parent: Entity::Author, child: Entity::Follow, column: "user_id", action: OnDelete::Cascade },
    DeleteRule { parent: Entity::Author, child: Entity::Follow, column: "author_id", action: OnDelete::Cascade },
    DeleteRule { parent: Entity::Group, child: Entity::Post, column: "group_id", action: OnDelete::SetNull },
    DeleteRule { parent: Entity::Post, child: Entity::Comment, column: "post_id", action: OnDelete::Cascade },
];

fn has_rules(entity: Entity) -> bool {
    DELETE_RULES.iter().any(|rule| rule.parent == entity)
}

/// Delete one entity and everything its rules reach. Returns the number of
/// `entity` rows removed (0 or 1). Run inside a transaction.
pub fn delete_entity(conn: &Connection, entity: Entity, key: &Value) -> Result<usize> {
    let key_column = entity
        .key()
        .ok_or_else(|| anyhow!("{:?} rows cannot be deleted by key", entity))?;

    for rule in DELETE_RULES.iter().filter(|rule| rule.parent == entity) {
        let table = rule.child.table();
        match rule.action {
            OnDelete::SetNull => {
                conn.execute(
                    &format!("UPDATE {} SET {} = NULL WHERE {} = ?1", table, rule.column, rule.column),
                    rusqlite::params![key],
                )?;
            }
            OnDelete::Cascade => match rule.child.key() {
                Some(child_key) if has_rules(rule.child) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM {} WHERE {} = ?1",
                        child_key, table, rule.column
                    ))?;
                    let children = stmt
                        .query_map(rusqlite::params![key], |row| row.get::<_, Value>(0))?
                        .collect::<std::result::Result<Vec<_>, _>>()?;

                    for child in &children {
                        delete_entity(conn, rule.child, child)?;
                    }
                }
                _ => {
                    conn.execute(
                        &format!("DELETE FROM {} WHERE {} = ?1", table, rule.column),
                        rusqlite::params![key],
                    )?;
                }
            },
        }
    }

    let removed = conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", entity.table(), key_column),
        rusqlite::params![key],
    )?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, NewPost};

    #[test]
    fn every_rule_targets_a_real_column() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            for rule in DELETE_RULES {
                conn.prepare(&format!("SELECT {} FROM {}", rule.column, rule.child.table()))?;
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn follow_edges_have_no_key() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| delete_entity(conn, Entity::Follow, &Value::Integer(1)));
        assert!(result.is_err());
    }

    #[test]
    fn deleting_group_nulls_post_reference() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_author("leo").unwrap();
        let group = db.create_group("Cats", "cats", "").unwrap();
        let post = db
            .create_post(NewPost {
                author_id: author.id,
                text: "meow".into(),
                group_id: Some(group.id),
                image: None,
            })
            .unwrap();

        assert!(db.delete_group(group.id).unwrap());

        let post = db.get_post(post.id).unwrap().expect("post survives group deletion");
        assert_eq!(post.group, None);
        assert!(db.get_group_by_slug("cats").unwrap().is_none());
    }

    #[test]
    fn deleting_author_removes_posts_comments_and_edges() {
        let db = Database::open_in_memory().unwrap();
        let leo = db.create_author("leo").unwrap();
        let tolstoy = db.create_author("tolstoy").unwrap();

        let own_post = db
            .create_post(NewPost { author_id: leo.id, text: "mine".into(), group_id: None, image: None })
            .unwrap();
        let other_post = db
            .create_post(NewPost { author_id: tolstoy.id, text: "theirs".into(), group_id: None, image: None })
            .unwrap();
        // tolstoy's comment on leo's post goes with the post
        db.create_comment(own_post.id, tolstoy.id, "nice").unwrap();
        // leo's comment on tolstoy's post goes with leo
        db.create_comment(other_post.id, leo.id, "thanks").unwrap();
        db.insert_follow(leo.id, tolstoy.id).unwrap();
        db.insert_follow(tolstoy.id, leo.id).unwrap();

        assert!(db.delete_author(leo.id).unwrap());

        assert!(db.get_post(own_post.id).unwrap().is_none());
        assert!(db.get_post(other_post.id).unwrap().is_some());
        assert!(db.comments_for_post(other_post.id).unwrap().is_empty());
        assert!(!db.follow_exists(tolstoy.id, leo.id).unwrap());
        assert!(db.followed_author_ids(tolstoy.id).unwrap().is_empty());
        assert_eq!(db.count_posts().unwrap(), 1);
        let orphans: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM comments", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn deleting_post_removes_its_comments() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_author("leo").unwrap();
        let post = db
            .create_post(NewPost { author_id: author.id, text: "bye".into(), group_id: None, image: Some("posts/a.png".into()) })
            .unwrap();
        db.create_comment(post.id, author.id, "first").unwrap();

        assert!(db.delete_post(post.id).unwrap());
        assert!(!db.delete_post(post.id).unwrap());
        assert!(db.comments_for_post(post.id).unwrap().is_empty());
    }
}
