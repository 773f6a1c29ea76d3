use chrono::Utc;

use lifetip_auth::{
    IssuedTokens, ProfileUpdate, Signup, User, hash_password, user::normalize_email,
    verify_password,
};
use lifetip_community::ReactionKind;
use lifetip_core::{LocationId, Page, UserId};
use lifetip_infra::StoreError;
use lifetip_policies::Policy;

use super::tips::TipView;
use super::{AppServices, ServiceResult};
use crate::app::errors::ApiError;

/// Successful login: the account plus a fresh token pair.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub tokens: IssuedTokens,
}

impl AppServices {
    pub async fn signup(&self, email: &str, password: &str, nickname: &str) -> ServiceResult<User> {
        let signup = Signup::new(email, password, nickname)?;
        if self.store.find_user_by_email(&signup.email).await?.is_some() {
            return Err(ApiError::Duplicate("email already registered".to_string()));
        }

        let hash = hash_off_runtime(signup.password.clone()).await?;
        let user = User::register(signup, hash, Utc::now());
        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(ApiError::Duplicate("email already registered".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let email = normalize_email(email).map_err(|_| ApiError::InvalidCredentials)?;
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_off_runtime(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        let tokens = self.tokens.issue(user.id, &user.email, Utc::now())?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(Session { user, tokens })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Returns the token and its lifetime in seconds.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<(String, i64)> {
        let now = Utc::now();
        let claims = self.tokens.validate_refresh(refresh_token, now)?;
        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(ApiError::TokenInvalid)?;
        let access = self.tokens.issue_access(user.id, &user.email, now)?;
        Ok((access, self.tokens.access_ttl().num_seconds()))
    }

    pub async fn me(&self, user_id: UserId) -> ServiceResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(ApiError::NotFound("user"))
    }

    pub async fn update_me(
        &self,
        user_id: UserId,
        nickname: Option<&str>,
        location_id: Option<Option<LocationId>>,
    ) -> ServiceResult<User> {
        let update = ProfileUpdate::new(nickname, location_id)?;
        if let Some(Some(location_id)) = update.location_id {
            if self.store.find_location(location_id).await?.is_none() {
                return Err(ApiError::NotFound("location"));
            }
        }

        let mut user = self.me(user_id).await?;
        if user.apply(update, Utc::now()) {
            if !self.store.update_user(&user).await? {
                return Err(ApiError::NotFound("user"));
            }
            tracing::info!(user_id = %user.id, "profile updated");
        }
        Ok(user)
    }

    pub async fn delete_me(&self, user_id: UserId) -> ServiceResult<()> {
        if !self.store.delete_user(user_id).await? {
            return Err(ApiError::NotFound("user"));
        }
        tracing::info!(user_id = %user_id, "account deleted");
        Ok(())
    }

    pub async fn my_saves(&self, user_id: UserId, page: Page) -> ServiceResult<Vec<TipView>> {
        let tips = self
            .store
            .reacted_tips(ReactionKind::Save, user_id, page)
            .await?;
        self.with_authors(tips).await
    }

    pub async fn my_bookmarks(&self, user_id: UserId, page: Page) -> ServiceResult<Vec<Policy>> {
        Ok(self.store.bookmarked_policies(user_id, page).await?)
    }
}

// argon2 is CPU and memory heavy; keep it off the async workers.
async fn hash_off_runtime(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn verify_off_runtime(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password verification task failed: {e}")))?
        .map_err(ApiError::from)
}
