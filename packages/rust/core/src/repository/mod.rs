//! Repositories: one per backend resource family.
//!
//! Each repository owns an [`ApiClient`] handle, maps wire DTOs into domain
//! types and returns [`ApiResult`]. None of them retry; the caller decides.

pub mod auth;
pub mod chat;
pub mod project;
pub mod source;
pub mod user;

use serde::de::IgnoredAny;
use sourcechat_net::{ApiClient, SuccessEnvelope};
use sourcechat_shared::{ApiResult, ClientError, DataError, EmptyResult, LocalError, NetworkError};
use tracing::warn;

pub use auth::AuthRepository;
pub use chat::ChatRepository;
pub use project::ProjectRepository;
pub use source::KnowledgeSourceRepository;
pub use user::UserRepository;

/// All repositories, sharing one client.
#[derive(Clone)]
pub struct Repositories {
    pub auth: AuthRepository,
    pub chats: ChatRepository,
    pub projects: ProjectRepository,
    pub sources: KnowledgeSourceRepository,
    pub users: UserRepository,
}

impl Repositories {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthRepository::new(client.clone()),
            chats: ChatRepository::new(client.clone()),
            projects: ProjectRepository::new(client.clone()),
            sources: KnowledgeSourceRepository::new(client.clone()),
            users: UserRepository::new(client),
        }
    }
}

/// Payload of a success envelope, or `EmptyResponse` when the server sent
/// none for an operation that needs one.
pub(crate) fn require_data<T>(envelope: SuccessEnvelope<T>) -> ApiResult<T> {
    envelope
        .data
        .ok_or(DataError::Network(NetworkError::EmptyResponse))
}

/// Collapse a success envelope whose payload is irrelevant.
pub(crate) fn discard_data(result: ApiResult<SuccessEnvelope<IgnoredAny>>) -> EmptyResult {
    result.map(|_| ())
}

/// Credential-store failures surface as a local persistence error.
pub(crate) fn store_failure(error: ClientError) -> DataError {
    warn!(error = %error, "credential store operation failed");
    DataError::Local(LocalError::SqlError)
}
