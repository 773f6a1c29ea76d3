//! Application services: one method per use case.
//!
//! Handlers parse input, call exactly one service method, and wrap the
//! result. Services own existence, duplicate, and ownership checks and talk
//! to storage only through [`Store`].

use std::sync::Arc;

use lifetip_auth::Hs256Jwt;
use lifetip_core::UserId;
use lifetip_infra::{ChatClient, Store};

use crate::app::errors::ApiError;

pub mod chat;
pub mod community;
pub mod policies;
pub mod quizzes;
pub mod tips;
pub mod users;

pub type ServiceResult<T> = Result<T, ApiError>;

pub struct AppServices {
    store: Arc<dyn Store>,
    tokens: Arc<Hs256Jwt>,
    chat: ChatClient,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<Hs256Jwt>, chat: ChatClient) -> Self {
        Self {
            store,
            tokens,
            chat,
        }
    }
}

impl AppServices {
    /// Name the missing side of a rejected foreign-key insert: the acting
    /// user (a valid token for a deleted account) or the target record.
    pub(super) async fn missing_parent(&self, user_id: UserId, target: &'static str) -> ApiError {
        match self.store.find_user(user_id).await {
            Ok(None) => ApiError::NotFound("user"),
            Ok(Some(_)) => ApiError::NotFound(target),
            Err(e) => e.into(),
        }
    }
}
