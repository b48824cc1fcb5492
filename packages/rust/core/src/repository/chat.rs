//! Chats and their message threads.

use serde::de::IgnoredAny;
use sourcechat_net::ApiClient;
use sourcechat_shared::{ApiResult, Chat, ChatMessage, EmptyResult, NewChat};
use tracing::{debug, instrument};

use super::{discard_data, require_data};
use crate::dto::{
    ChatDto, CreateChatRequest, MessageDto, ProjectQuery, RenameChatRequest, SendMessageRequest,
};

const CHATS: &str = "/api/v1/chats";

#[derive(Clone)]
pub struct ChatRepository {
    client: ApiClient,
}

impl ChatRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Chats, most recently updated first, optionally scoped to a project.
    #[instrument(skip(self))]
    pub async fn list_chats(&self, project_id: Option<&str>) -> ApiResult<Vec<Chat>> {
        let envelope = self
            .client
            .get_with_query::<Vec<ChatDto>, _>(CHATS, &ProjectQuery { project_id })
            .await?;

        let mut chats: Vec<Chat> = require_data(envelope)?
            .into_iter()
            .map(Chat::from)
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        debug!(count = chats.len(), "chats listed");
        Ok(chats)
    }

    #[instrument(skip(self))]
    pub async fn get_chat(&self, chat_id: &str) -> ApiResult<Chat> {
        let envelope = self.client.get::<ChatDto>(&chat_path(chat_id)).await?;
        require_data(envelope).map(Chat::from)
    }

    #[instrument(skip_all)]
    pub async fn create_chat(&self, new: &NewChat) -> ApiResult<Chat> {
        let body = CreateChatRequest {
            title: new.title.as_deref(),
            project_id: new.project_id.as_deref(),
        };
        let envelope = self.client.post::<_, ChatDto>(CHATS, &body).await?;
        require_data(envelope).map(Chat::from)
    }

    #[instrument(skip(self, title))]
    pub async fn rename_chat(&self, chat_id: &str, title: &str) -> ApiResult<Chat> {
        let envelope = self
            .client
            .patch::<_, ChatDto>(&chat_path(chat_id), &RenameChatRequest { title })
            .await?;
        require_data(envelope).map(Chat::from)
    }

    #[instrument(skip(self))]
    pub async fn delete_chat(&self, chat_id: &str) -> EmptyResult {
        discard_data(self.client.delete::<IgnoredAny>(&chat_path(chat_id)).await)
    }

    /// Messages of a chat, oldest first.
    #[instrument(skip(self))]
    pub async fn list_messages(&self, chat_id: &str) -> ApiResult<Vec<ChatMessage>> {
        let envelope = self
            .client
            .get::<Vec<MessageDto>>(&messages_path(chat_id))
            .await?;

        let mut messages: Vec<ChatMessage> = require_data(envelope)?
            .into_iter()
            .map(|dto| dto.into_domain(chat_id))
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    /// Post a user message; returns the assistant's reply.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn send_message(&self, chat_id: &str, content: &str) -> ApiResult<ChatMessage> {
        let envelope = self
            .client
            .post::<_, MessageDto>(&messages_path(chat_id), &SendMessageRequest { content })
            .await?;
        require_data(envelope).map(|dto| dto.into_domain(chat_id))
    }
}

fn chat_path(chat_id: &str) -> String {
    format!("{CHATS}/{chat_id}")
}

fn messages_path(chat_id: &str) -> String {
    format!("{CHATS}/{chat_id}/messages")
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sourcechat_shared::{DataError, MessageRole, NetworkError};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::dto::UNTITLED_CHAT;
    use crate::repository::test_support::{client_for, ok, signed_in};

    fn chats_fixture() -> String {
        std::fs::read_to_string("../../../fixtures/json/chats.fixture.json")
            .expect("fixture should exist")
    }

    #[tokio::test]
    async fn list_chats_sorts_by_recency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CHATS))
            .respond_with(ResponseTemplate::new(200).set_body_string(chats_fixture()))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let chats = repo.list_chats(None).await.expect("chats");

        let ids: Vec<&str> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["chat-newest", "chat-untitled", "chat-older"]);
        assert_eq!(chats[1].title, UNTITLED_CHAT);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn list_chats_forwards_project_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CHATS))
            .and(query_param("projectId", "proj-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!([]))))
            .expect(1)
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        assert!(repo.list_chats(Some("proj-1")).await.expect("chats").is_empty());
    }

    #[tokio::test]
    async fn list_messages_oldest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/chats/c1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!([
                {
                    "id": "m2",
                    "role": "assistant",
                    "content": "Hello!",
                    "createdAt": "2026-03-01T10:00:05Z"
                },
                { "id": "m1", "role": "user", "content": "Hi", "createdAt": "2026-03-01T10:00:00Z" }
            ]))))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let messages = repo.list_messages("c1").await.expect("messages");

        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[0].role, MessageRole::User);
        assert!(messages.iter().all(|m| m.chat_id == "c1"));
    }

    #[tokio::test]
    async fn send_message_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chats/c1/messages"))
            .and(body_json(json!({ "content": "What changed?" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "id": "m9",
                "chatId": "c1",
                "role": "assistant",
                "content": "Three fixes landed.",
                "sourceIds": ["s1"],
                "createdAt": "2026-03-01T10:01:00Z"
            }))))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let reply = repo.send_message("c1", "What changed?").await.expect("reply");

        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.source_ids, ["s1"]);
    }

    #[tokio::test]
    async fn create_and_rename_send_expected_bodies() {
        let server = MockServer::start().await;
        let chat = json!({ "id": "c2", "title": "Roadmap", "createdAt": "2026-03-01T10:00:00Z" });
        Mock::given(method("POST"))
            .and(path(CHATS))
            .and(body_json(json!({ "projectId": "p1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(chat.clone())))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/chats/c2"))
            .and(body_json(json!({ "title": "Roadmap" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(chat)))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let created = repo
            .create_chat(&NewChat {
                title: None,
                project_id: Some("p1".into()),
            })
            .await
            .expect("created");
        let renamed = repo.rename_chat(&created.id, "Roadmap").await.expect("renamed");
        assert_eq!(renamed.title, "Roadmap");
    }

    #[tokio::test]
    async fn get_chat_without_data_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/chats/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let err = repo.get_chat("c1").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::EmptyResponse));
    }

    #[tokio::test]
    async fn delete_chat_accepts_any_payload() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/chats/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({ "deleted": true }))))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        repo.delete_chat("c1").await.expect("deleted");
    }

    #[tokio::test]
    async fn list_chats_without_data_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let err = repo.list_chats(None).await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::EmptyResponse));
    }

    #[tokio::test]
    async fn list_messages_without_data_field_is_empty_response() {
        let server = MockServer::start().await;
        let mut body = ok(json!([]));
        body.as_object_mut().expect("object").remove("data");
        Mock::given(method("GET"))
            .and(path("/api/v1/chats/c1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let repo = ChatRepository::new(client_for(&server, signed_in()));
        let err = repo.list_messages("c1").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::EmptyResponse));
    }
}
