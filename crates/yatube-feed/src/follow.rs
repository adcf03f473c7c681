use std::collections::BTreeSet;

use tracing::{debug, info};
use uuid::Uuid;

use yatube_db::Database;

use crate::error::{FeedError, FeedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
}

/// The directed "reads" relation between authors.
pub struct FollowGraph<'a> {
    db: &'a Database,
}

impl<'a> FollowGraph<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Following someone twice leaves a single edge and succeeds both times.
    pub fn follow(&self, follower: Uuid, target: Uuid) -> FeedResult<FollowOutcome> {
        if follower == target {
            return Err(FeedError::SelfFollow);
        }

        if self.db.insert_follow(follower, target)? {
            info!(%follower, %target, "follow edge created");
            Ok(FollowOutcome::Created)
        } else {
            debug!(%follower, %target, "already following");
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    pub fn unfollow(&self, follower: Uuid, target: Uuid) -> FeedResult<()> {
        if !self.db.delete_follow(follower, target)? {
            return Err(FeedError::not_found(format!(
                "follow edge {} -> {}",
                follower, target
            )));
        }

        info!(%follower, %target, "follow edge removed");
        Ok(())
    }

    pub fn is_following(&self, follower: Uuid, target: Uuid) -> FeedResult<bool> {
        Ok(self.db.follow_exists(follower, target)?)
    }

    /// Ids of every author `follower` follows.
    pub fn followed_authors(&self, follower: Uuid) -> FeedResult<BTreeSet<Uuid>> {
        Ok(self.db.followed_author_ids(follower)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, Uuid, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_author("reader").unwrap().id;
        let author = db.create_author("writer").unwrap().id;
        (db, user, author)
    }

    #[test]
    fn follow_twice_keeps_one_edge() {
        let (db, user, author) = setup();
        let graph = FollowGraph::new(&db);

        assert_eq!(graph.follow(user, author).unwrap(), FollowOutcome::Created);
        assert!(graph.is_following(user, author).unwrap());
        assert_eq!(graph.follow(user, author).unwrap(), FollowOutcome::AlreadyFollowing);
        assert!(graph.is_following(user, author).unwrap());
        assert_eq!(graph.followed_authors(user).unwrap().len(), 1);
    }

    #[test]
    fn edges_are_directed() {
        let (db, user, author) = setup();
        let graph = FollowGraph::new(&db);

        graph.follow(user, author).unwrap();
        assert!(!graph.is_following(author, user).unwrap());
        assert!(graph.followed_authors(author).unwrap().is_empty());
    }

    #[test]
    fn self_follow_rejected() {
        let (db, user, _) = setup();
        let graph = FollowGraph::new(&db);

        assert!(matches!(graph.follow(user, user), Err(FeedError::SelfFollow)));
        assert!(!graph.is_following(user, user).unwrap());
    }

    #[test]
    fn unfollow_without_edge_is_not_found() {
        let (db, user, author) = setup();
        let graph = FollowGraph::new(&db);
        let other = db.create_author("other").unwrap().id;
        graph.follow(user, other).unwrap();

        assert!(matches!(graph.unfollow(user, author), Err(FeedError::NotFound(_))));
        assert_eq!(graph.followed_authors(user).unwrap(), BTreeSet::from([other]));
    }

    #[test]
    fn unfollow_removes_edge() {
        let (db, user, author) = setup();
        let graph = FollowGraph::new(&db);

        graph.follow(user, author).unwrap();
        graph.unfollow(user, author).unwrap();
        assert!(!graph.is_following(user, author).unwrap());
        assert!(matches!(graph.unfollow(user, author), Err(FeedError::NotFound(_))));
    }
}
