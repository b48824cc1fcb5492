//! Per-screen state holders.
//!
//! A view model calls one repository, branches on the `ApiResult` and
//! updates its state. Errors become user-facing text through
//! `DataError::user_message`; session-expiry errors become a
//! [`UiEvent::SessionExpired`] instead, so the front end can route to login.

pub mod chats;
pub mod login;
pub mod profile;
pub mod projects;
pub mod sources;

use std::collections::VecDeque;

use sourcechat_shared::{ApiResult, DataError};

pub use chats::{ChatsState, ChatsViewModel};
pub use login::{LoginState, LoginStep, LoginViewModel};
pub use profile::{ProfileState, ProfileViewModel};
pub use projects::{ProjectsState, ProjectsViewModel};
pub use sources::{SourcesState, SourcesViewModel};

/// A value a screen is waiting on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(DataError),
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<DataError> {
        match self {
            Self::Failed(error) => Some(*error),
            _ => None,
        }
    }
}

impl<T> From<ApiResult<T>> for Loadable<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(error) => Self::Failed(error),
        }
    }
}

/// One-shot notification, consumed once by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Transient text (snackbar / toast / stderr line).
    Message(String),
    SignedIn,
    SignedOut,
    /// The session is gone; the user must sign in again.
    SessionExpired,
}

/// FIFO of pending [`UiEvent`]s.
#[derive(Debug, Default)]
pub(crate) struct EventQueue(VecDeque<UiEvent>);

impl EventQueue {
    pub(crate) fn push(&mut self, event: UiEvent) {
        self.0.push_back(event);
    }

    pub(crate) fn message(&mut self, text: impl Into<String>) {
        self.push(UiEvent::Message(text.into()));
    }

    /// Surface `error` to the user.
    pub(crate) fn report(&mut self, error: DataError) {
        if error.is_session_expired() {
            self.push(UiEvent::SessionExpired);
        } else {
            self.message(error.user_message());
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<UiEvent> {
        self.0.drain(..).collect()
    }
}
