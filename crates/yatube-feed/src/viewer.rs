use uuid::Uuid;

use yatube_types::api::Claims;

use crate::error::{FeedError, FeedResult};

/// Who is looking at a page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    Author { id: Uuid, username: String },
}

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::Author { id, .. } => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Author { .. })
    }

    /// The viewer's author id, or `Unauthorized` for anonymous viewers.
    pub fn require(&self) -> FeedResult<Uuid> {
        self.id().ok_or(FeedError::Unauthorized)
    }
}

impl From<Claims> for Viewer {
    fn from(claims: Claims) -> Self {
        Self::Author {
            id: claims.sub,
            username: claims.username,
        }
    }
}
