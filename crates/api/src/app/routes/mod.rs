//! Route tables.
//!
//! Each module exposes `public()` and/or `protected()` routers with full
//! paths. Protected routers are merged, then wrapped with the auth layer in
//! `app::build_app`. A path may appear in both (GET public, POST protected);
//! `Router::merge` combines the method routers.

use axum::Router;

pub mod chat;
pub mod comments;
pub mod directory;
pub mod notifications;
pub mod policies;
pub mod quizzes;
pub mod reactions;
pub mod system;
pub mod tips;
pub mod users;

/// Endpoints reachable without a token.
pub fn public() -> Router {
    Router::new()
        .merge(users::public())
        .merge(tips::public())
        .merge(comments::public())
        .merge(directory::public())
        .merge(policies::public())
        .merge(quizzes::public())
}

/// Endpoints that require a valid access token.
pub fn protected() -> Router {
    Router::new()
        .merge(users::protected())
        .merge(tips::protected())
        .merge(comments::protected())
        .merge(reactions::protected())
        .merge(directory::protected())
        .merge(policies::protected())
        .merge(quizzes::protected())
        .merge(notifications::protected())
        .merge(chat::protected())
}
