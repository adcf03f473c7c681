//! The four post listings plus the single-post view.

use tracing::debug;
use yatube_db::{Database, PostScope};
use yatube_types::api::{CommentFormState, Feed, GroupFeed, Page, PostDetail, ProfileFeed};
use yatube_types::models::Post;

use crate::error::{FeedError, FeedResult};
use crate::follow::FollowGraph;
use crate::pagination::Paginator;
use crate::viewer::Viewer;
use crate::author_by_username;

pub struct FeedComposer<'a> {
    db: &'a Database,
    paginator: Paginator,
}

impl<'a> FeedComposer<'a> {
    pub fn new(db: &'a Database, paginator: Paginator) -> Self {
        Self { db, paginator }
    }

    /// Every post, newest first.
    pub fn global(&self, page: Option<i64>) -> FeedResult<Feed> {
        let page = self.compose(&PostScope::All, page)?;
        Ok(Feed { page })
    }

    pub fn group(&self, slug: &str, page: Option<i64>) -> FeedResult<GroupFeed> {
        let group = self
            .db
            .get_group_by_slug(slug)?
            .ok_or_else(|| FeedError::not_found(format!("group '{}'", slug)))?;

        let page = self.compose(&PostScope::Group(group.id), page)?;
        debug!(group = %group, total = page.total, "group feed");
        Ok(GroupFeed { group, page })
    }

    pub fn profile(&self, username: &str, viewer: &Viewer, page: Option<i64>) -> FeedResult<ProfileFeed> {
        let author = author_by_username(self.db, username)?;

        let following = match viewer.id() {
            Some(viewer_id) => FollowGraph::new(self.db).is_following(viewer_id, author.id)?,
            None => false,
        };

        let page = self.compose(&PostScope::Author(author.id), page)?;

        Ok(ProfileFeed {
            author,
            post_count: page.total,
            following,
            page,
        })
    }

    /// Posts by every author the viewer follows. Anonymous viewers are `Unauthorized`.
    pub fn followed(&self, viewer: &Viewer, page: Option<i64>) -> FeedResult<Feed> {
        let viewer_id = viewer.require()?;
        let authors: Vec<_> = FollowGraph::new(self.db)
            .followed_authors(viewer_id)?
            .into_iter()
            .collect();

        let page = self.compose(&PostScope::Authors(authors), page)?;
        Ok(Feed { page })
    }

    pub fn post_detail(&self, post_id: i64) -> FeedResult<PostDetail> {
        let post = self
            .db
            .get_post(post_id)?
            .ok_or_else(|| FeedError::not_found(format!("post {}", post_id)))?;

        let author_post_count = self.db.count_posts_by_author(post.author_id)?;
        let comments = self.db.comments_for_post(post.id)?;

        Ok(PostDetail {
            post,
            author_post_count,
            comments,
            comment_form: CommentFormState::default(),
        })
    }

    /// Count and slice come from one store snapshot, so a page past the end
    /// of a shrinking listing cannot come back empty.
    fn compose(&self, scope: &PostScope, requested: Option<i64>) -> FeedResult<Page<Post>> {
        let (total, posts) = self.db.page_of_posts(scope, |total| {
            let window = self.paginator.window(total, requested);
            (window.limit(), window.offset())
        })?;
        Ok(self.paginator.window(total, requested).page(posts))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use uuid::Uuid;
    use yatube_db::NewPost;

    use super::*;

    const TEST_POSTS: usize = 13;

    fn post(db: &Database, author: Uuid, group: Option<i64>, text: &str) -> Post {
        db.create_post(NewPost {
            author_id: author,
            text: text.to_string(),
            group_id: group,
            image: None,
        })
        .unwrap()
    }

    fn composer(db: &Database) -> FeedComposer<'_> {
        FeedComposer::new(db, Paginator::new(NonZeroU32::new(10).unwrap()))
    }

    fn strictly_newest_first(posts: &[Post]) -> bool {
        posts.windows(2).all(|w| w[0].created_at > w[1].created_at)
    }

    #[test]
    fn global_feed_pages() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_author("testuser").unwrap();
        let created: Vec<Post> = (1..=TEST_POSTS)
            .map(|i| post(&db, author.id, None, &format!("test_text_post_{i}")))
            .collect();

        let feed = composer(&db).global(None).unwrap();
        assert_eq!(feed.page.len(), 10);
        assert_eq!(feed.page.items[0].id, created.last().unwrap().id);
        assert!(strictly_newest_first(&feed.page.items));

        let second = composer(&db).global(Some(2)).unwrap();
        assert_eq!(second.page.len(), TEST_POSTS - 10);
        assert_eq!(second.page.items.last().unwrap().id, created[0].id);
    }

    #[test]
    fn group_feed_is_isolated() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_author("testuser").unwrap();
        let g1 = db.create_group("test_group", "test_group_slug", "desc").unwrap();
        let g2 = db.create_group("test_group_2", "test_group_2_slug", "desc").unwrap();
        for i in 0..3 {
            post(&db, author.id, Some(g1.id), &format!("in group {i}"));
        }
        post(&db, author.id, None, "no group");

        let feed = composer(&db).group("test_group_slug", None).unwrap();
        assert_eq!(feed.group, g1);
        assert_eq!(feed.page.total, 3);
        assert!(strictly_newest_first(&feed.page.items));

        let other = composer(&db).group(&g2.slug, None).unwrap();
        assert!(other.page.is_empty());
    }

    #[test]
    fn last_page_follows_a_shrinking_listing() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_author("testuser").unwrap();
        let created: Vec<Post> = (0..11).map(|i| post(&db, author.id, None, &format!("p{i}"))).collect();

        let before = composer(&db).global(Some(2)).unwrap();
        assert_eq!((before.page.number, before.page.len()), (2, 1));

        db.delete_post(created[0].id).unwrap();
        let after = composer(&db).global(Some(2)).unwrap();
        assert_eq!(after.page.total, 10);
        assert_eq!(after.page.num_pages, 1);
        assert_eq!(after.page.number, 1);
        assert_eq!(after.page.len(), 10);
    }

    #[test]
    fn unknown_group_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(composer(&db).group("missing", None), Err(FeedError::NotFound(_))));
    }

    #[test]
    fn profile_reports_follow_state() {
        let db = Database::open_in_memory().unwrap();
        let writer = db.create_author("writer").unwrap();
        let reader = db.create_author("reader").unwrap();
        post(&db, writer.id, None, "hello");
        post(&db, reader.id, None, "not mine");

        let anonymous = composer(&db).profile("writer", &Viewer::Anonymous, None).unwrap();
        assert!(!anonymous.following);
        assert_eq!(anonymous.post_count, 1);
        assert!(anonymous.page.items.iter().all(|p| p.author_id == writer.id));

        let viewer = Viewer::Author { id: reader.id, username: reader.username.clone() };
        assert!(!composer(&db).profile("writer", &viewer, None).unwrap().following);

        FollowGraph::new(&db).follow(reader.id, writer.id).unwrap();
        assert!(composer(&db).profile("writer", &viewer, None).unwrap().following);

        assert!(matches!(
            composer(&db).profile("ghost", &viewer, None),
            Err(FeedError::NotFound(_))
        ));
    }

    #[test]
    fn followed_feed_contains_only_followed_authors() {
        let db = Database::open_in_memory().unwrap();
        let reader = db.create_author("reader").unwrap();
        let a = db.create_author("a").unwrap();
        let b = db.create_author("b").unwrap();
        let stranger = db.create_author("stranger").unwrap();
        post(&db, a.id, None, "a1");
        post(&db, stranger.id, None, "s1");
        post(&db, b.id, None, "b1");
        post(&db, a.id, None, "a2");

        let viewer = Viewer::Author { id: reader.id, username: reader.username.clone() };
        assert!(composer(&db).followed(&viewer, None).unwrap().page.is_empty());

        let graph = FollowGraph::new(&db);
        graph.follow(reader.id, a.id).unwrap();
        let feed = composer(&db).followed(&viewer, None).unwrap();
        let texts: Vec<&str> = feed.page.items.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["a2", "a1"]);

        graph.follow(reader.id, b.id).unwrap();
        let feed = composer(&db).followed(&viewer, None).unwrap();
        let texts: Vec<&str> = feed.page.items.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["a2", "b1", "a1"]);
    }

    #[test]
    fn followed_feed_needs_a_viewer() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            composer(&db).followed(&Viewer::Anonymous, None),
            Err(FeedError::Unauthorized)
        ));
    }

    #[test]
    fn post_detail_counts_and_comments() {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_author("writer").unwrap();
        let commenter = db.create_author("commenter").unwrap();
        let first = post(&db, author.id, None, "first");
        post(&db, author.id, None, "second");
        db.create_comment(first.id, commenter.id, "older").unwrap();
        db.create_comment(first.id, author.id, "newer").unwrap();

        let detail = composer(&db).post_detail(first.id).unwrap();
        assert_eq!(detail.post, first);
        assert_eq!(detail.author_post_count, 2);
        let texts: Vec<&str> = detail.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["older", "newer"]);

        assert!(matches!(composer(&db).post_detail(404), Err(FeedError::NotFound(_))));
    }
}
