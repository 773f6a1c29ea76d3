use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{CommentId, DomainResult, TipId, UserId, text};

pub const COMMENT_MAX_CHARS: usize = 1000;

/// A comment left on a tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub tip_id: TipId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn create(tip_id: TipId, author_id: UserId, new: NewComment, now: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::new(),
            tip_id,
            author_id,
            content: new.content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    pub fn new(content: &str) -> DomainResult<Self> {
        Ok(Self {
            content: text::bounded("content", content, 1, COMMENT_MAX_CHARS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_content_is_bounded() {
        assert!(NewComment::new("").is_err());
        assert!(NewComment::new(&"x".repeat(COMMENT_MAX_CHARS + 1)).is_err());
        assert_eq!(NewComment::new(" nice ").unwrap().content, "nice");
    }
}
