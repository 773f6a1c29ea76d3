//! Likes and saves: per-user flags on a tip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{TipId, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Save,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Save => "save",
        }
    }
}

/// One user's like or save of one tip. Unique per `(kind, user_id, tip_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub kind: ReactionKind,
    pub user_id: UserId,
    pub tip_id: TipId,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(kind: ReactionKind, user_id: UserId, tip_id: TipId, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            user_id,
            tip_id,
            created_at: now,
        }
    }
}
