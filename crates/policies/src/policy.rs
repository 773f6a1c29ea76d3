use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{DomainResult, LocationId, OrganizationId, Page, PolicyId, UserId, text};

pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MAX_CHARS: usize = 10_000;

/// A municipal program description.
///
/// `organization_id` and `location_id` must reference existing rows; the
/// service checks this before insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub organization_id: OrganizationId,
    pub location_id: LocationId,
    pub title: String,
    pub content: String,
    pub apply_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn create(new: NewPolicy, now: DateTime<Utc>) -> Self {
        Self {
            id: PolicyId::new(),
            organization_id: new.organization_id,
            location_id: new.location_id,
            title: new.title,
            content: new.content,
            apply_url: new.apply_url,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPolicy {
    pub organization_id: OrganizationId,
    pub location_id: LocationId,
    pub title: String,
    pub content: String,
    pub apply_url: Option<String>,
}

impl NewPolicy {
    pub fn new(
        organization_id: OrganizationId,
        location_id: LocationId,
        title: &str,
        content: &str,
        apply_url: Option<&str>,
    ) -> DomainResult<Self> {
        let apply_url = match apply_url.map(str::trim) {
            None | Some("") => None,
            Some(url) => Some(text::http_url("applyUrl", url)?),
        };
        Ok(Self {
            organization_id,
            location_id,
            title: text::bounded("title", title, 1, TITLE_MAX_CHARS)?,
            content: text::bounded("content", content, 1, CONTENT_MAX_CHARS)?,
            apply_url,
        })
    }
}

/// Filter for policy listings. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyQuery {
    pub location_id: Option<LocationId>,
    pub organization_id: Option<OrganizationId>,
    pub page: Page,
}

impl PolicyQuery {
    pub fn matches(&self, policy: &Policy) -> bool {
        self.location_id.is_none_or(|l| policy.location_id == l)
            && self.organization_id.is_none_or(|o| policy.organization_id == o)
    }
}

/// A user's bookmark on a policy. Unique per `(user_id, policy_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub user_id: UserId,
    pub policy_id: PolicyId,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(user_id: UserId, policy_id: PolicyId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            policy_id,
            created_at: now,
        }
    }
}
