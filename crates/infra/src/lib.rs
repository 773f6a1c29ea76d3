//! Infrastructure layer: configuration, storage backends, external services.

pub mod config;
pub mod external;
pub mod repository;

pub use config::{AppConfig, AuthConfig, ChatConfig, ConfigError, DatabaseConfig};
pub use external::{ChatClient, ChatError};
pub use repository::{InMemoryStore, PostgresStore, Store, StoreError, StoreResult, open_store};
