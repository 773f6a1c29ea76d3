//! `lifetip-core`: shared domain building blocks.
//!
//! Pure domain primitives only (no storage or HTTP concerns).

pub mod error;
pub mod id;
pub mod page;
pub mod text;
pub mod toggle;

pub use error::{DomainError, DomainResult};
pub use id::{CommentId, LocationId, NotificationId, OrganizationId, PolicyId, QuizId, TipId, UserId};
pub use page::Page;
pub use toggle::Toggled;
