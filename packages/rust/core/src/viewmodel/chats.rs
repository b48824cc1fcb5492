//! Chat list and conversation screen.

use sourcechat_shared::{Chat, ChatMessage, MessageRole, NewChat};

use super::{EventQueue, Loadable, UiEvent};
use crate::repository::ChatRepository;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatsState {
    pub chats: Loadable<Vec<Chat>>,
    /// Chat whose thread is open, if any.
    pub open_chat: Option<String>,
    pub messages: Loadable<Vec<ChatMessage>>,
    pub sending: bool,
}

pub struct ChatsViewModel {
    repo: ChatRepository,
    state: ChatsState,
    events: EventQueue,
}

impl ChatsViewModel {
    pub fn new(repo: ChatRepository) -> Self {
        Self {
            repo,
            state: ChatsState::default(),
            events: EventQueue::default(),
        }
    }

    pub fn state(&self) -> &ChatsState {
        &self.state
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub async fn load(&mut self, project_id: Option<&str>) {
        self.state.chats = Loadable::Loading;
        let result = self.repo.list_chats(project_id).await;
        if let Err(error) = &result {
            self.events.report(*error);
        }
        self.state.chats = result.into();
    }

    /// Open a chat's thread.
    pub async fn open(&mut self, chat_id: &str) {
        self.state.open_chat = Some(chat_id.to_string());
        self.state.messages = Loadable::Loading;
        let result = self.repo.list_messages(chat_id).await;
        if let Err(error) = &result {
            self.events.report(*error);
        }
        self.state.messages = result.into();
    }

    /// Create a chat and put it at the top of the list.
    pub async fn create(&mut self, new: &NewChat) -> Option<Chat> {
        match self.repo.create_chat(new).await {
            Ok(chat) => {
                if let Some(chats) = self.state.chats.ready_mut() {
                    chats.insert(0, chat.clone());
                }
                Some(chat)
            }
            Err(error) => {
                self.events.report(error);
                None
            }
        }
    }

    pub async fn rename(&mut self, chat_id: &str, title: &str) -> Option<Chat> {
        let title = title.trim();
        if title.is_empty() {
            self.events.message("Chat title can't be empty.");
            return None;
        }

        match self.repo.rename_chat(chat_id, title).await {
            Ok(chat) => {
                if let Some(existing) = self
                    .state
                    .chats
                    .ready_mut()
                    .and_then(|chats| chats.iter_mut().find(|c| c.id == chat.id))
                {
                    *existing = chat.clone();
                }
                Some(chat)
            }
            Err(error) => {
                self.events.report(error);
                None
            }
        }
    }

    pub async fn delete(&mut self, chat_id: &str) -> bool {
        match self.repo.delete_chat(chat_id).await {
            Ok(()) => {
                if let Some(chats) = self.state.chats.ready_mut() {
                    chats.retain(|c| c.id != chat_id);
                }
                if self.state.open_chat.as_deref() == Some(chat_id) {
                    self.state.open_chat = None;
                    self.state.messages = Loadable::Idle;
                }
                true
            }
            Err(error) => {
                self.events.report(error);
                false
            }
        }
    }

    /// Send `content` to the open chat and append the reply.
    ///
    /// The user's message is added locally once the server accepted it;
    /// on failure the thread is left untouched.
    pub async fn send(&mut self, content: &str) -> Option<ChatMessage> {
        let content = content.trim();
        let Some(chat_id) = self.state.open_chat.clone() else {
            self.events.message("Open a chat first.");
            return None;
        };
        if content.is_empty() {
            return None;
        }

        self.state.sending = true;
        let result = self.repo.send_message(&chat_id, content).await;
        self.state.sending = false;

        match result {
            Ok(reply) => {
                if let Some(messages) = self.state.messages.ready_mut() {
                    messages.push(ChatMessage {
                        id: format!("local-{}", messages.len()),
                        chat_id: chat_id.clone(),
                        role: MessageRole::User,
                        content: content.to_string(),
                        source_ids: Vec::new(),
                        created_at: reply.created_at,
                    });
                    messages.push(reply.clone());
                }
                Some(reply)
            }
            Err(error) => {
                self.events.report(error);
                None
            }
        }
    }
}
