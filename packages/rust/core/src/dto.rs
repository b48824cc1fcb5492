//! Wire DTOs for the SourceChat API and their mapping into domain types.
//!
//! Response DTOs are lenient (optional fields, server-side nulls); the
//! `From` impls resolve those into the stricter domain shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sourcechat_shared::{
    AuthTokens, Chat, ChatMessage, KnowledgeSource, MessageRole, Project, SourceKind,
    SourceStatus, UserProfile,
};

/// Title given to chats the server returns without one.
pub const UNTITLED_CHAT: &str = "New chat";

/// Name given to sources the server returns without one.
pub const UNTITLED_SOURCE: &str = "Untitled source";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Optional `?projectId=` filter for list endpoints.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct SendOtpRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest<'a> {
    pub id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct RenameChatRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateProjectRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProjectRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLinkRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenDto> for AuthTokens {
    fn from(dto: TokenDto) -> Self {
        Self {
            access_token: dto.access_token,
            refresh_token: dto.refresh_token,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDto {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ChatDto> for Chat {
    fn from(dto: ChatDto) -> Self {
        Self {
            id: dto.id,
            title: non_blank(dto.title).unwrap_or_else(|| UNTITLED_CHAT.to_string()),
            project_id: dto.project_id,
            last_message: dto.last_message,
            created_at: dto.created_at,
            updated_at: dto.updated_at.unwrap_or(dto.created_at),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageDto {
    /// Map into a domain message, filling a missing `chatId` from the
    /// chat the message was fetched under.
    pub fn into_domain(self, chat_id: &str) -> ChatMessage {
        ChatMessage {
            id: self.id,
            chat_id: self.chat_id.unwrap_or_else(|| chat_id.to_string()),
            role: self.role,
            content: self.content,
            source_ids: self.source_ids,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_count: u32,
    #[serde(default)]
    pub chat_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ProjectDto> for Project {
    fn from(dto: ProjectDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            description: non_blank(dto.description),
            source_count: dto.source_count,
            chat_count: dto.chat_count,
            created_at: dto.created_at,
            updated_at: dto.updated_at.unwrap_or(dto.created_at),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDto {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub status: Option<SourceStatus>,
    pub created_at: DateTime<Utc>,
}

impl From<SourceDto> for KnowledgeSource {
    fn from(dto: SourceDto) -> Self {
        let name = non_blank(dto.name)
            .or_else(|| dto.url.clone())
            .unwrap_or_else(|| UNTITLED_SOURCE.to_string());
        Self {
            id: dto.id,
            project_id: dto.project_id,
            name,
            kind: dto.kind,
            url: dto.url,
            size_bytes: dto.size_bytes,
            status: dto.status.unwrap_or(SourceStatus::Pending),
            created_at: dto.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserDto> for UserProfile {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            email: dto.email,
            display_name: non_blank(dto.display_name),
            avatar_url: non_blank(dto.avatar_url),
            created_at: dto.created_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
