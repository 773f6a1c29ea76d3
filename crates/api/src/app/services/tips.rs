use std::collections::HashMap;

use chrono::Utc;

use lifetip_community::{HashtagCount, NewTip, Tip, TipQuery, TipStats, TipUpdate};
use lifetip_core::{TipId, UserId};

use super::{AppServices, ServiceResult};
use crate::app::errors::ApiError;

pub const DEFAULT_HASHTAG_LIMIT: u32 = 10;
pub const MAX_HASHTAG_LIMIT: u32 = 50;

/// A tip with its author's display name.
#[derive(Debug, Clone)]
pub struct TipView {
    pub tip: Tip,
    /// `None` if the author disappeared between queries.
    pub author_nickname: Option<String>,
}

/// Tip detail page: the tip plus its counters.
#[derive(Debug, Clone)]
pub struct TipDetail {
    pub view: TipView,
    pub stats: TipStats,
}

impl AppServices {
    pub async fn list_tips(&self, query: &TipQuery) -> ServiceResult<Vec<TipView>> {
        let tips = self.store.list_tips(query).await?;
        self.with_authors(tips).await
    }

    pub async fn get_tip(&self, tip_id: TipId) -> ServiceResult<TipDetail> {
        let tip = self.find_tip(tip_id).await?;
        let stats = self.store.tip_stats(tip_id).await?;
        let mut views = self.with_authors(vec![tip]).await?;
        let view = views.pop().ok_or(ApiError::NotFound("tip"))?;
        Ok(TipDetail { view, stats })
    }

    pub async fn create_tip(&self, author_id: UserId, new: NewTip) -> ServiceResult<TipView> {
        let tip = Tip::create(author_id, new, Utc::now());
        self.store.insert_tip(&tip).await.map_err(|e| match e {
            lifetip_infra::StoreError::MissingReference(_) => ApiError::NotFound("user"),
            other => other.into(),
        })?;
        tracing::info!(tip_id = %tip.id, author_id = %author_id, "tip created");
        let mut views = self.with_authors(vec![tip]).await?;
        views.pop().ok_or(ApiError::NotFound("tip"))
    }

    pub async fn update_tip(
        &self,
        user_id: UserId,
        tip_id: TipId,
        update: TipUpdate,
    ) -> ServiceResult<TipView> {
        let mut tip = self.find_tip(tip_id).await?;
        if !tip.is_authored_by(user_id) {
            return Err(ApiError::Forbidden("only the author can edit this tip".to_string()));
        }
        if tip.apply(update, Utc::now()) {
            if !self.store.update_tip(&tip).await? {
                return Err(ApiError::NotFound("tip"));
            }
            tracing::info!(tip_id = %tip.id, "tip updated");
        }
        let mut views = self.with_authors(vec![tip]).await?;
        views.pop().ok_or(ApiError::NotFound("tip"))
    }

    pub async fn delete_tip(&self, user_id: UserId, tip_id: TipId) -> ServiceResult<()> {
        let tip = self.find_tip(tip_id).await?;
        if !tip.is_authored_by(user_id) {
            return Err(ApiError::Forbidden("only the author can delete this tip".to_string()));
        }
        if !self.store.delete_tip(tip_id).await? {
            return Err(ApiError::NotFound("tip"));
        }
        tracing::info!(tip_id = %tip_id, "tip deleted");
        Ok(())
    }

    pub async fn popular_hashtags(&self, limit: Option<u32>) -> ServiceResult<Vec<HashtagCount>> {
        let limit = limit
            .unwrap_or(DEFAULT_HASHTAG_LIMIT)
            .clamp(1, MAX_HASHTAG_LIMIT);
        Ok(self.store.popular_hashtags(limit).await?)
    }

    pub(super) async fn find_tip(&self, tip_id: TipId) -> ServiceResult<Tip> {
        self.store
            .find_tip(tip_id)
            .await?
            .ok_or(ApiError::NotFound("tip"))
    }

    /// Attach author nicknames with one batched lookup.
    pub(super) async fn with_authors(&self, tips: Vec<Tip>) -> ServiceResult<Vec<TipView>> {
        let mut ids: Vec<UserId> = tips.iter().map(|t| t.author_id).collect();
        ids.sort();
        ids.dedup();
        let nicknames: HashMap<UserId, String> = self
            .store
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.nickname))
            .collect();
        Ok(tips
            .into_iter()
            .map(|tip| TipView {
                author_nickname: nicknames.get(&tip.author_id).cloned(),
                tip,
            })
            .collect())
    }
}
