//! In-memory store for tests and local development.
//!
//! Mirrors the Postgres schema's constraints: unique keys produce
//! `StoreError::Duplicate`, dangling references produce
//! `StoreError::MissingReference`, and deletes cascade.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use lifetip_auth::User;
use lifetip_community::{
    Comment, HashtagCount, Notification, Reaction, ReactionKind, Tip, TipQuery, TipStats,
};
use lifetip_core::{
    CommentId, LocationId, NotificationId, OrganizationId, Page, PolicyId, QuizId, TipId, UserId,
};
use lifetip_policies::{Bookmark, Location, Organization, Policy, PolicyQuery};
use lifetip_quizzes::Quiz;

use super::{
    CommentRepository, NotificationRepository, PolicyRepository, QuizRepository,
    ReactionRepository, Store, StoreError, StoreResult, TipRepository, UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    tips: HashMap<TipId, Tip>,
    comments: HashMap<CommentId, Comment>,
    reactions: HashMap<(ReactionKind, UserId, TipId), Reaction>,
    organizations: HashMap<OrganizationId, Organization>,
    locations: HashMap<LocationId, Location>,
    policies: HashMap<PolicyId, Policy>,
    bookmarks: HashMap<(UserId, PolicyId), Bookmark>,
    quizzes: HashMap<QuizId, Quiz>,
    notifications: HashMap<NotificationId, Notification>,
}

impl Tables {
    fn remove_tip_cascade(&mut self, tip_id: TipId) -> bool {
        let existed = self.tips.remove(&tip_id).is_some();
        self.comments.retain(|_, c| c.tip_id != tip_id);
        self.reactions.retain(|(_, _, t), _| *t != tip_id);
        self.notifications.retain(|_, n| n.tip_id != tip_id);
        existed
    }
}

/// In-memory store (dev/test).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| StoreError::Backend {
            operation: "read",
            message: "lock poisoned".to_string(),
        })
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| StoreError::Backend {
            operation: "write",
            message: "lock poisoned".to_string(),
        })
    }
}

/// Sort newest first; UUIDv7 ids break timestamp ties in creation order.
fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.users.values().any(|u| u.email == user.email) || t.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate("users"));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>> {
        let t = self.read()?;
        Ok(ids.iter().filter_map(|id| t.users.get(id).cloned()).collect())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut t = self.write()?;
        if let Some(loc) = user.location_id {
            if !t.locations.contains_key(&loc) {
                return Err(StoreError::MissingReference("users.location_id"));
            }
        }
        match t.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut t = self.write()?;
        let existed = t.users.remove(&id).is_some();
        let owned: Vec<TipId> = t
            .tips
            .values()
            .filter(|tip| tip.author_id == id)
            .map(|tip| tip.id)
            .collect();
        for tip_id in owned {
            t.remove_tip_cascade(tip_id);
        }
        t.comments.retain(|_, c| c.author_id != id);
        t.reactions.retain(|(_, u, _), _| *u != id);
        t.bookmarks.retain(|(u, _), _| *u != id);
        t.notifications
            .retain(|_, n| n.recipient_id != id && n.actor_id != id);
        Ok(existed)
    }
}

#[async_trait]
impl TipRepository for InMemoryStore {
    async fn insert_tip(&self, tip: &Tip) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.users.contains_key(&tip.author_id) {
            return Err(StoreError::MissingReference("tips.author_id"));
        }
        if t.tips.contains_key(&tip.id) {
            return Err(StoreError::Duplicate("tips"));
        }
        t.tips.insert(tip.id, tip.clone());
        Ok(())
    }

    async fn find_tip(&self, id: TipId) -> StoreResult<Option<Tip>> {
        Ok(self.read()?.tips.get(&id).cloned())
    }

    async fn list_tips(&self, query: &TipQuery) -> StoreResult<Vec<Tip>> {
        let t = self.read()?;
        let mut tips: Vec<Tip> = t.tips.values().filter(|tip| query.matches(tip)).cloned().collect();
        newest_first(&mut tips, |tip| (tip.created_at, tip.id));
        Ok(query.page.slice(tips))
    }

    async fn update_tip(&self, tip: &Tip) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.tips.get_mut(&tip.id) {
            Some(existing) => {
                *existing = tip.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tip(&self, id: TipId) -> StoreResult<bool> {
        Ok(self.write()?.remove_tip_cascade(id))
    }

    async fn tip_stats(&self, id: TipId) -> StoreResult<TipStats> {
        let t = self.read()?;
        let count = |kind: ReactionKind| {
            t.reactions
                .keys()
                .filter(|(k, _, tip)| *k == kind && *tip == id)
                .count() as u64
        };
        Ok(TipStats {
            likes: count(ReactionKind::Like),
            saves: count(ReactionKind::Save),
            comments: t.comments.values().filter(|c| c.tip_id == id).count() as u64,
        })
    }

    async fn popular_hashtags(&self, limit: u32) -> StoreResult<Vec<HashtagCount>> {
        let t = self.read()?;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for tag in t.tips.values().flat_map(|tip| tip.hashtags.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
        let mut out: Vec<HashtagCount> = counts
            .into_iter()
            .map(|(tag, count)| HashtagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        out.truncate(limit as usize);
        Ok(out)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.tips.contains_key(&comment.tip_id) {
            return Err(StoreError::MissingReference("comments.tip_id"));
        }
        if !t.users.contains_key(&comment.author_id) {
            return Err(StoreError::MissingReference("comments.author_id"));
        }
        t.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        Ok(self.read()?.comments.get(&id).cloned())
    }

    async fn list_comments(&self, tip_id: TipId, page: Page) -> StoreResult<Vec<Comment>> {
        let t = self.read()?;
        let mut comments: Vec<Comment> = t
            .comments
            .values()
            .filter(|c| c.tip_id == tip_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(page.slice(comments))
    }

    async fn delete_comment(&self, id: CommentId) -> StoreResult<bool> {
        Ok(self.write()?.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl ReactionRepository for InMemoryStore {
    async fn reaction_exists(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> StoreResult<bool> {
        Ok(self.read()?.reactions.contains_key(&(kind, user_id, tip_id)))
    }

    async fn insert_reaction(&self, reaction: &Reaction) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.tips.contains_key(&reaction.tip_id) {
            return Err(StoreError::MissingReference("reactions.tip_id"));
        }
        if !t.users.contains_key(&reaction.user_id) {
            return Err(StoreError::MissingReference("reactions.user_id"));
        }
        let key = (reaction.kind, reaction.user_id, reaction.tip_id);
        if t.reactions.contains_key(&key) {
            return Err(StoreError::Duplicate(match reaction.kind {
                ReactionKind::Like => "tip_likes",
                ReactionKind::Save => "tip_saves",
            }));
        }
        t.reactions.insert(key, reaction.clone());
        Ok(())
    }

    async fn delete_reaction(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> StoreResult<bool> {
        Ok(self
            .write()?
            .reactions
            .remove(&(kind, user_id, tip_id))
            .is_some())
    }

    async fn count_reactions(&self, kind: ReactionKind, tip_id: TipId) -> StoreResult<u64> {
        Ok(self
            .read()?
            .reactions
            .keys()
            .filter(|(k, _, t)| *k == kind && *t == tip_id)
            .count() as u64)
    }

    async fn reacted_tips(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        page: Page,
    ) -> StoreResult<Vec<Tip>> {
        let t = self.read()?;
        let mut reactions: Vec<&Reaction> = t
            .reactions
            .values()
            .filter(|r| r.kind == kind && r.user_id == user_id)
            .collect();
        newest_first(&mut reactions, |r| (r.created_at, r.tip_id));
        Ok(page.slice(
            reactions
                .into_iter()
                .filter_map(|r| t.tips.get(&r.tip_id).cloned()),
        ))
    }
}

#[async_trait]
impl PolicyRepository for InMemoryStore {
    async fn insert_organization(&self, organization: &Organization) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.organizations.values().any(|o| o.name == organization.name) {
            return Err(StoreError::Duplicate("organizations"));
        }
        t.organizations.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn find_organization(&self, id: OrganizationId) -> StoreResult<Option<Organization>> {
        Ok(self.read()?.organizations.get(&id).cloned())
    }

    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let mut out: Vec<Organization> = self.read()?.organizations.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn insert_location(&self, location: &Location) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.locations.values().any(|l| l.name == location.name) {
            return Err(StoreError::Duplicate("locations"));
        }
        t.locations.insert(location.id, location.clone());
        Ok(())
    }

    async fn find_location(&self, id: LocationId) -> StoreResult<Option<Location>> {
        Ok(self.read()?.locations.get(&id).cloned())
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        let mut out: Vec<Location> = self.read()?.locations.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn insert_policy(&self, policy: &Policy) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.organizations.contains_key(&policy.organization_id) {
            return Err(StoreError::MissingReference("policies.organization_id"));
        }
        if !t.locations.contains_key(&policy.location_id) {
            return Err(StoreError::MissingReference("policies.location_id"));
        }
        t.policies.insert(policy.id, policy.clone());
        Ok(())
    }

    async fn find_policy(&self, id: PolicyId) -> StoreResult<Option<Policy>> {
        Ok(self.read()?.policies.get(&id).cloned())
    }

    async fn list_policies(&self, query: &PolicyQuery) -> StoreResult<Vec<Policy>> {
        let t = self.read()?;
        let mut policies: Vec<Policy> = t
            .policies
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        newest_first(&mut policies, |p| (p.created_at, p.id));
        Ok(query.page.slice(policies))
    }

    async fn bookmark_exists(&self, user_id: UserId, policy_id: PolicyId) -> StoreResult<bool> {
        Ok(self.read()?.bookmarks.contains_key(&(user_id, policy_id)))
    }

    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.policies.contains_key(&bookmark.policy_id) {
            return Err(StoreError::MissingReference("policy_bookmarks.policy_id"));
        }
        if !t.users.contains_key(&bookmark.user_id) {
            return Err(StoreError::MissingReference("policy_bookmarks.user_id"));
        }
        let key = (bookmark.user_id, bookmark.policy_id);
        if t.bookmarks.contains_key(&key) {
            return Err(StoreError::Duplicate("policy_bookmarks"));
        }
        t.bookmarks.insert(key, bookmark.clone());
        Ok(())
    }

    async fn delete_bookmark(&self, user_id: UserId, policy_id: PolicyId) -> StoreResult<bool> {
        Ok(self.write()?.bookmarks.remove(&(user_id, policy_id)).is_some())
    }

    async fn bookmarked_policies(&self, user_id: UserId, page: Page) -> StoreResult<Vec<Policy>> {
        let t = self.read()?;
        let mut marks: Vec<&Bookmark> = t
            .bookmarks
            .values()
            .filter(|b| b.user_id == user_id)
            .collect();
        newest_first(&mut marks, |b| (b.created_at, b.policy_id));
        Ok(page.slice(
            marks
                .into_iter()
                .filter_map(|b| t.policies.get(&b.policy_id).cloned()),
        ))
    }
}

#[async_trait]
impl QuizRepository for InMemoryStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> StoreResult<()> {
        self.write()?.quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn find_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>> {
        Ok(self.read()?.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self, page: Page) -> StoreResult<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = self.read()?.quizzes.values().cloned().collect();
        newest_first(&mut quizzes, |q| (q.created_at, q.id));
        Ok(page.slice(quizzes))
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.users.contains_key(&notification.recipient_id) {
            return Err(StoreError::MissingReference("notifications.recipient_id"));
        }
        t.notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        recipient_id: UserId,
        page: Page,
    ) -> StoreResult<Vec<Notification>> {
        let mut out: Vec<Notification> = self
            .read()?
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        newest_first(&mut out, |n| (n.created_at, n.id));
        Ok(page.slice(out))
    }

    async fn mark_notification_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
    ) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.notifications.get_mut(&id) {
            Some(n) if n.recipient_id == recipient_id => {
                n.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use lifetip_auth::Signup;
    use lifetip_community::{NewComment, NewTip, NotificationKind};

    use super::*;

    async fn user(store: &InMemoryStore, email: &str) -> User {
        let signup = Signup::new(email, "password123", "nick").unwrap();
        let user = User::register(signup, "hash".to_string(), Utc::now());
        store.insert_user(&user).await.unwrap();
        user
    }

    async fn tip(store: &InMemoryStore, author: &User, title: &str, tags: &[&str]) -> Tip {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        let tip = Tip::create(author.id, NewTip::new(title, "body", &tags).unwrap(), Utc::now());
        store.insert_tip(&tip).await.unwrap();
        tip
    }

    #[tokio::test]
    async fn email_is_unique() {
        let store = InMemoryStore::new();
        user(&store, "dup@tips.kr").await;

        let again = User::register(
            Signup::new("dup@tips.kr", "password123", "other").unwrap(),
            "hash".to_string(),
            Utc::now(),
        );
        assert_eq!(
            store.insert_user(&again).await,
            Err(StoreError::Duplicate("users"))
        );
    }

    #[tokio::test]
    async fn reaction_is_unique_per_user_and_tip() {
        let store = InMemoryStore::new();
        let author = user(&store, "a@tips.kr").await;
        let t = tip(&store, &author, "t", &[]).await;

        let like = Reaction::new(ReactionKind::Like, author.id, t.id, Utc::now());
        store.insert_reaction(&like).await.unwrap();
        assert_eq!(
            store.insert_reaction(&like).await,
            Err(StoreError::Duplicate("tip_likes"))
        );

        // A save is a different reaction kind.
        let save = Reaction::new(ReactionKind::Save, author.id, t.id, Utc::now());
        store.insert_reaction(&save).await.unwrap();

        let stats = store.tip_stats(t.id).await.unwrap();
        assert_eq!((stats.likes, stats.saves, stats.comments), (1, 1, 0));
    }

    #[tokio::test]
    async fn list_tips_is_newest_first_and_paged() {
        let store = InMemoryStore::new();
        let author = user(&store, "a@tips.kr").await;
        let first = tip(&store, &author, "first", &["money"]).await;
        let second = tip(&store, &author, "second", &["money"]).await;
        tip(&store, &author, "third", &["food"]).await;

        let query = TipQuery::new(Some("money"), None, None, Page::new(None, Some(10))).unwrap();
        let ids: Vec<TipId> = store.list_tips(&query).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let paged = TipQuery::new(None, None, None, Page::new(Some(1), Some(1))).unwrap();
        assert_eq!(store.list_tips(&paged).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn popular_hashtags_counts_and_orders() {
        let store = InMemoryStore::new();
        let author = user(&store, "a@tips.kr").await;
        tip(&store, &author, "1", &["rent", "youth"]).await;
        tip(&store, &author, "2", &["rent"]).await;
        tip(&store, &author, "3", &["food"]).await;

        let tags = store.popular_hashtags(2).await.unwrap();
        assert_eq!(tags[0], HashtagCount { tag: "rent".into(), count: 2 });
        assert_eq!(tags[1].tag, "food");
        assert_eq!(tags.len(), 2);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() {
        let store = InMemoryStore::new();
        let author = user(&store, "a@tips.kr").await;
        let reader = user(&store, "r@tips.kr").await;
        let t = tip(&store, &author, "t", &[]).await;

        let comment = Comment::create(t.id, reader.id, NewComment::new("hi").unwrap(), Utc::now());
        store.insert_comment(&comment).await.unwrap();
        store
            .insert_reaction(&Reaction::new(ReactionKind::Like, reader.id, t.id, Utc::now()))
            .await
            .unwrap();
        let n = Notification::for_activity(author.id, reader.id, NotificationKind::Like, t.id, Utc::now())
            .unwrap();
        store.insert_notification(&n).await.unwrap();

        assert!(store.delete_user(author.id).await.unwrap());

        assert!(store.find_tip(t.id).await.unwrap().is_none());
        assert!(store.find_comment(comment.id).await.unwrap().is_none());
        assert_eq!(
            store
                .reacted_tips(ReactionKind::Like, reader.id, Page::default())
                .await
                .unwrap(),
            vec![]
        );
        assert!(
            store
                .list_notifications(author.id, Page::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(!store.delete_user(author.id).await.unwrap());
    }

    #[tokio::test]
    async fn comment_on_missing_tip_is_missing_reference() {
        let store = InMemoryStore::new();
        let author = user(&store, "a@tips.kr").await;
        let comment = Comment::create(TipId::new(), author.id, NewComment::new("x").unwrap(), Utc::now());
        assert_eq!(
            store.insert_comment(&comment).await,
            Err(StoreError::MissingReference("comments.tip_id"))
        );
    }

    #[tokio::test]
    async fn only_recipient_can_mark_read() {
        let store = InMemoryStore::new();
        let author = user(&store, "a@tips.kr").await;
        let reader = user(&store, "r@tips.kr").await;
        let t = tip(&store, &author, "t", &[]).await;
        let n = Notification::for_activity(author.id, reader.id, NotificationKind::Comment, t.id, Utc::now())
            .unwrap();
        store.insert_notification(&n).await.unwrap();

        assert!(!store.mark_notification_read(reader.id, n.id).await.unwrap());
        assert!(store.mark_notification_read(author.id, n.id).await.unwrap());
        let listed = store.list_notifications(author.id, Page::default()).await.unwrap();
        assert!(listed[0].read);
    }
}
