//! Sign-in screen: email OTP flow and third-party sign-in.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{EventQueue, UiEvent};
use crate::repository::AuthRepository;
use crate::signin::IdentityProvider;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
});

static OTP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}$").expect("valid regex"));

pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_OTP: &str = "Enter the 6-digit code from your email.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginStep {
    #[default]
    EnterEmail,
    EnterOtp,
    SignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginState {
    pub email: String,
    pub step: LoginStep,
    pub busy: bool,
    /// Inline error under the form, cleared on the next attempt.
    pub error: Option<String>,
}

pub struct LoginViewModel {
    auth: AuthRepository,
    state: LoginState,
    events: EventQueue,
}

impl LoginViewModel {
    pub fn new(auth: AuthRepository) -> Self {
        Self {
            auth,
            state: LoginState::default(),
            events: EventQueue::default(),
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub fn set_email(&mut self, email: &str) {
        self.state.email = email.trim().to_string();
        self.state.error = None;
    }

    /// Request an OTP for the current email. Returns whether it was sent.
    pub async fn request_otp(&mut self) -> bool {
        if !EMAIL_RE.is_match(&self.state.email) {
            self.state.error = Some(INVALID_EMAIL.to_string());
            return false;
        }

        self.begin();
        let result = self.auth.send_otp(&self.state.email).await;
        self.state.busy = false;

        match result {
            Ok(()) => {
                self.state.step = LoginStep::EnterOtp;
                self.events.message(format!("We sent a code to {}.", self.state.email));
                true
            }
            Err(error) => {
                self.state.error = Some(error.user_message().to_string());
                false
            }
        }
    }

    /// Submit the emailed code. Returns whether the user is now signed in.
    pub async fn verify(&mut self, otp: &str) -> bool {
        let otp = otp.trim();
        if !OTP_RE.is_match(otp) {
            self.state.error = Some(INVALID_OTP.to_string());
            return false;
        }

        self.begin();
        let result = self.auth.verify_otp(&self.state.email, otp).await;
        self.finish(result.map(|_| ()))
    }

    /// Sign in through an external identity provider.
    pub async fn sign_in_with(&mut self, provider: &dyn IdentityProvider) -> bool {
        self.begin();
        let result = self.auth.sign_in_with(provider).await;
        self.finish(result.map(|_| ()))
    }

    pub async fn sign_out(&mut self) {
        self.begin();
        let result = self.auth.logout().await;
        self.state.busy = false;
        match result {
            Ok(()) => {
                self.state = LoginState::default();
                self.events.push(UiEvent::SignedOut);
            }
            Err(error) => self.events.report(error),
        }
    }

    fn begin(&mut self) {
        self.state.busy = true;
        self.state.error = None;
    }

    fn finish(&mut self, result: sourcechat_shared::EmptyResult) -> bool {
        self.state.busy = false;
        match result {
            Ok(()) => {
                debug!("signed in");
                self.state.step = LoginStep::SignedIn;
                self.events.push(UiEvent::SignedIn);
                true
            }
            Err(error) => {
                self.state.error = Some(error.user_message().to_string());
                false
            }
        }
    }
}
