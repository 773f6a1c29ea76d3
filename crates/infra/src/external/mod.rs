//! External service clients.

pub mod chat;

pub use chat::{ChatClient, ChatError};
