//! Profile / account screen.

use sourcechat_shared::{ProfileUpdate, UserProfile};

use super::{EventQueue, Loadable, UiEvent};
use crate::repository::UserRepository;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileState {
    pub profile: Loadable<UserProfile>,
    pub saving: bool,
}

pub struct ProfileViewModel {
    repo: UserRepository,
    state: ProfileState,
    events: EventQueue,
}

impl ProfileViewModel {
    pub fn new(repo: UserRepository) -> Self {
        Self {
            repo,
            state: ProfileState::default(),
            events: EventQueue::default(),
        }
    }

    pub fn state(&self) -> &ProfileState {
        &self.state
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub async fn load(&mut self) {
        self.state.profile = Loadable::Loading;
        let result = self.repo.get_profile().await;
        if let Err(error) = &result {
            self.events.report(*error);
        }
        self.state.profile = result.into();
    }

    /// Save changes. On failure the previously loaded profile stays shown.
    pub async fn save(&mut self, update: &ProfileUpdate) -> bool {
        self.state.saving = true;
        let result = self.repo.update_profile(update).await;
        self.state.saving = false;

        match result {
            Ok(profile) => {
                self.state.profile = Loadable::Ready(profile);
                self.events.message("Profile saved.");
                true
            }
            Err(error) => {
                self.events.report(error);
                false
            }
        }
    }

    pub async fn delete_account(&mut self) -> bool {
        match self.repo.delete_account().await {
            Ok(()) => {
                self.state = ProfileState::default();
                self.events.push(UiEvent::SignedOut);
                true
            }
            Err(error) => {
                self.events.report(error);
                false
            }
        }
    }
}
