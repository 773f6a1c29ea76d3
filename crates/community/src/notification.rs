//! Activity notifications for tip authors.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{DomainError, NotificationId, TipId, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Comment,
    Like,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Comment => "comment",
            NotificationKind::Like => "like",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(NotificationKind::Comment),
            "like" => Ok(NotificationKind::Like),
            other => Err(DomainError::validation(
                "kind",
                format!("unknown notification kind {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub kind: NotificationKind,
    pub tip_id: TipId,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Notify `recipient` that `actor` acted on their tip.
    ///
    /// Returns `None` when users act on their own tips.
    pub fn for_activity(
        recipient_id: UserId,
        actor_id: UserId,
        kind: NotificationKind,
        tip_id: TipId,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if recipient_id == actor_id {
            return None;
        }
        Some(Self {
            id: NotificationId::new(),
            recipient_id,
            actor_id,
            kind,
            tip_id,
            read: false,
            created_at: now,
        })
    }
}
