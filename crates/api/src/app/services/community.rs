//! Comments, likes, saves, and the notifications they trigger.

use std::collections::HashMap;

use chrono::Utc;

use lifetip_community::{Comment, NewComment, Notification, NotificationKind, Reaction, ReactionKind};
use lifetip_core::{CommentId, NotificationId, Page, TipId, Toggled, UserId};
use lifetip_infra::StoreError;

use super::{AppServices, ServiceResult};
use crate::app::errors::ApiError;

#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author_nickname: Option<String>,
}

/// State after toggling a like.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

impl AppServices {
    /// Comments on a tip, oldest first.
    pub async fn list_comments(&self, tip_id: TipId, page: Page) -> ServiceResult<Vec<CommentView>> {
        self.find_tip(tip_id).await?;
        let comments = self.store.list_comments(tip_id, page).await?;

        let mut ids: Vec<UserId> = comments.iter().map(|c| c.author_id).collect();
        ids.sort();
        ids.dedup();
        let nicknames: HashMap<UserId, String> = self
            .store
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.nickname))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                author_nickname: nicknames.get(&comment.author_id).cloned(),
                comment,
            })
            .collect())
    }

    pub async fn add_comment(
        &self,
        author_id: UserId,
        tip_id: TipId,
        new: NewComment,
    ) -> ServiceResult<CommentView> {
        let tip = self.find_tip(tip_id).await?;
        let comment = Comment::create(tip_id, author_id, new, Utc::now());
        match self.store.insert_comment(&comment).await {
            Ok(()) => {}
            Err(StoreError::MissingReference(_)) => {
                return Err(self.missing_parent(author_id, "tip").await);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(comment_id = %comment.id, tip_id = %tip_id, "comment added");

        self.notify(tip.author_id, author_id, NotificationKind::Comment, tip_id)
            .await;

        let author_nickname = self.store.find_user(author_id).await?.map(|u| u.nickname);
        Ok(CommentView {
            comment,
            author_nickname,
        })
    }

    pub async fn delete_comment(&self, user_id: UserId, comment_id: CommentId) -> ServiceResult<()> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or(ApiError::NotFound("comment"))?;
        if !comment.is_authored_by(user_id) {
            return Err(ApiError::Forbidden(
                "only the author can delete this comment".to_string(),
            ));
        }
        if !self.store.delete_comment(comment_id).await? {
            return Err(ApiError::NotFound("comment"));
        }
        tracing::info!(comment_id = %comment_id, "comment deleted");
        Ok(())
    }

    /// Like if not liked, unlike otherwise. Liking notifies the tip author.
    pub async fn toggle_like(&self, user_id: UserId, tip_id: TipId) -> ServiceResult<LikeState> {
        let tip = self.find_tip(tip_id).await?;
        let state = self.toggle_reaction(ReactionKind::Like, user_id, tip_id).await?;
        if state.is_on() {
            self.notify(tip.author_id, user_id, NotificationKind::Like, tip_id)
                .await;
        }
        let like_count = self.store.count_reactions(ReactionKind::Like, tip_id).await?;
        Ok(LikeState {
            liked: state.is_on(),
            like_count,
        })
    }

    pub async fn toggle_save(&self, user_id: UserId, tip_id: TipId) -> ServiceResult<Toggled> {
        self.find_tip(tip_id).await?;
        self.toggle_reaction(ReactionKind::Save, user_id, tip_id).await
    }

    pub async fn list_notifications(
        &self,
        user_id: UserId,
        page: Page,
    ) -> ServiceResult<Vec<Notification>> {
        Ok(self.store.list_notifications(user_id, page).await?)
    }

    pub async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> ServiceResult<()> {
        if !self
            .store
            .mark_notification_read(user_id, notification_id)
            .await?
        {
            return Err(ApiError::NotFound("notification"));
        }
        Ok(())
    }

    /// Delete the reaction if present, insert it otherwise.
    ///
    /// A duplicate on insert means a concurrent request won the race; the
    /// reaction exists either way, so the state is `On`.
    async fn toggle_reaction(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> ServiceResult<Toggled> {
        if self.store.reaction_exists(kind, user_id, tip_id).await? {
            self.store.delete_reaction(kind, user_id, tip_id).await?;
            tracing::info!(kind = kind.as_str(), tip_id = %tip_id, user_id = %user_id, "reaction removed");
            return Ok(Toggled::Off);
        }

        let reaction = Reaction::new(kind, user_id, tip_id, Utc::now());
        match self.store.insert_reaction(&reaction).await {
            Ok(()) | Err(StoreError::Duplicate(_)) => {}
            Err(StoreError::MissingReference(_)) => {
                return Err(self.missing_parent(user_id, "tip").await);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(kind = kind.as_str(), tip_id = %tip_id, user_id = %user_id, "reaction added");
        Ok(Toggled::On)
    }

    /// Best effort: a failed notification never fails the triggering request.
    async fn notify(&self, recipient: UserId, actor: UserId, kind: NotificationKind, tip_id: TipId) {
        let Some(notification) = Notification::for_activity(recipient, actor, kind, tip_id, Utc::now())
        else {
            return;
        };
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::warn!(error = %e, kind = kind.as_str(), tip_id = %tip_id, "notification not stored");
        }
    }
}
