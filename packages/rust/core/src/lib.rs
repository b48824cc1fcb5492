//! Client-side domain logic for SourceChat.
//!
//! Sits on top of `sourcechat-net`: repositories turn envelopes into domain
//! types, and view models turn repository results into screen state.
//!
//! - [`repository`]: auth, chats, projects, knowledge sources, user
//! - [`signin`]: third-party identity provider seam
//! - [`viewmodel`]: per-screen state holders
//! - [`dto`]: wire shapes and their mapping

pub mod dto;
pub mod repository;
pub mod signin;
pub mod viewmodel;

pub use repository::{
    AuthRepository, ChatRepository, KnowledgeSourceRepository, ProjectRepository, Repositories,
    UserRepository,
};
pub use signin::{IdentityProvider, SignInError, StaticIdentityProvider};
pub use viewmodel::{Loadable, UiEvent};
