//! Shared types, error model, and configuration for SourceChat.
//!
//! This crate is the foundation depended on by all other SourceChat crates.
//! It provides:
//! - [`DataError`]: the closed error taxonomy every API call resolves to
//! - [`ClientError`]: infrastructure errors (config, I/O, storage)
//! - Domain types ([`Chat`], [`Project`], [`KnowledgeSource`], [`UserProfile`])
//! - Configuration ([`AppConfig`], [`ClientConfig`], config loading)

pub mod config;
pub mod error;
pub mod messages;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, ClientConfig, DEFAULT_PUBLIC_PATHS, StorageConfig, config_dir,
    config_file_path, credentials_db_path, init_config, load_config, load_config_from,
};
pub use error::{
    ApiResult, AuthError, ClientError, DataError, EmptyResult, LocalError, NetworkError,
    ProjectError, Result, UserError,
};
pub use messages::FALLBACK_MESSAGE;
pub use types::{
    AuthTokens, Chat, ChatMessage, KnowledgeSource, MessageRole, NewChat, NewProject,
    ProfileUpdate, Project, ProjectUpdate, SourceKind, SourceStatus, UserProfile,
};
