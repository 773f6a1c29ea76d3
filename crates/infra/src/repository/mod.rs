//! Repository layer: one trait method per storage query.
//!
//! Services depend on `Arc<dyn Store>` and never on a concrete backend. The
//! handle is opened once at startup by [`open_store`] and closed after the
//! server shuts down.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use lifetip_auth::User;
use lifetip_community::{
    Comment, HashtagCount, Notification, Reaction, ReactionKind, Tip, TipQuery, TipStats,
};
use lifetip_core::{
    CommentId, LocationId, NotificationId, OrganizationId, Page, PolicyId, QuizId, TipId, UserId,
};
use lifetip_policies::{Bookmark, Location, Organization, Policy, PolicyQuery};
use lifetip_quizzes::Quiz;

use crate::config::DatabaseConfig;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Storage failure.
///
/// Uniqueness and foreign-key violations get their own variants so services
/// can turn them into client errors; everything else is a backend failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key already exists (email, organization name, like, ...).
    #[error("duplicate record in {0}")]
    Duplicate(&'static str),

    /// A referenced row does not exist (tip deleted under a new comment, ...).
    #[error("referenced record missing for {0}")]
    MissingReference(&'static str),

    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    #[error("storage error in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Unknown ids are skipped.
    async fn find_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<bool>;
    /// Deletes the user's tips, comments, reactions, bookmarks and notifications too.
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait TipRepository: Send + Sync {
    async fn insert_tip(&self, tip: &Tip) -> StoreResult<()>;
    async fn find_tip(&self, id: TipId) -> StoreResult<Option<Tip>>;
    /// Newest first, filtered and paged by `query`.
    async fn list_tips(&self, query: &TipQuery) -> StoreResult<Vec<Tip>>;
    async fn update_tip(&self, tip: &Tip) -> StoreResult<bool>;
    /// Deletes the tip's comments, reactions and notifications too.
    async fn delete_tip(&self, id: TipId) -> StoreResult<bool>;
    async fn tip_stats(&self, id: TipId) -> StoreResult<TipStats>;
    /// Most used hashtags, ties broken alphabetically.
    async fn popular_hashtags(&self, limit: u32) -> StoreResult<Vec<HashtagCount>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn find_comment(&self, id: CommentId) -> StoreResult<Option<Comment>>;
    /// Oldest first.
    async fn list_comments(&self, tip_id: TipId, page: Page) -> StoreResult<Vec<Comment>>;
    async fn delete_comment(&self, id: CommentId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    async fn reaction_exists(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> StoreResult<bool>;
    /// Fails with [`StoreError::Duplicate`] if the user already reacted this way.
    async fn insert_reaction(&self, reaction: &Reaction) -> StoreResult<()>;
    async fn delete_reaction(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> StoreResult<bool>;
    async fn count_reactions(&self, kind: ReactionKind, tip_id: TipId) -> StoreResult<u64>;
    /// Tips the user reacted to, most recent reaction first.
    async fn reacted_tips(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        page: Page,
    ) -> StoreResult<Vec<Tip>>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn insert_organization(&self, organization: &Organization) -> StoreResult<()>;
    async fn find_organization(&self, id: OrganizationId) -> StoreResult<Option<Organization>>;
    /// Alphabetical by name.
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>>;

    async fn insert_location(&self, location: &Location) -> StoreResult<()>;
    async fn find_location(&self, id: LocationId) -> StoreResult<Option<Location>>;
    /// Alphabetical by name.
    async fn list_locations(&self) -> StoreResult<Vec<Location>>;

    async fn insert_policy(&self, policy: &Policy) -> StoreResult<()>;
    async fn find_policy(&self, id: PolicyId) -> StoreResult<Option<Policy>>;
    /// Newest first.
    async fn list_policies(&self, query: &PolicyQuery) -> StoreResult<Vec<Policy>>;

    async fn bookmark_exists(&self, user_id: UserId, policy_id: PolicyId) -> StoreResult<bool>;
    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()>;
    async fn delete_bookmark(&self, user_id: UserId, policy_id: PolicyId) -> StoreResult<bool>;
    /// Most recent bookmark first.
    async fn bookmarked_policies(&self, user_id: UserId, page: Page) -> StoreResult<Vec<Policy>>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn insert_quiz(&self, quiz: &Quiz) -> StoreResult<()>;
    async fn find_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>>;
    /// Newest first.
    async fn list_quizzes(&self, page: Page) -> StoreResult<Vec<Quiz>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;
    /// Newest first.
    async fn list_notifications(
        &self,
        recipient_id: UserId,
        page: Page,
    ) -> StoreResult<Vec<Notification>>;
    /// Only succeeds for the recipient's own notifications.
    async fn mark_notification_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
    ) -> StoreResult<bool>;
}

/// The full storage handle injected into services.
#[async_trait]
pub trait Store:
    UserRepository
    + TipRepository
    + CommentRepository
    + ReactionRepository
    + PolicyRepository
    + QuizRepository
    + NotificationRepository
{
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Release connections. Called once after the server has stopped.
    async fn close(&self);
}

/// Open the configured backend: Postgres when a URL is set, memory otherwise.
pub async fn open_store(config: &DatabaseConfig) -> StoreResult<Arc<dyn Store>> {
    match &config.url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.max_connections).await?;
            store.apply_schema().await?;
            tracing::info!(backend = store.backend(), "storage opened");
            Ok(Arc::new(store))
        }
        None => {
            let store = InMemoryStore::new();
            tracing::info!(backend = store.backend(), "storage opened");
            Ok(Arc::new(store))
        }
    }
}
