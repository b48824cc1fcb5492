//! Third-party sign-in seam.
//!
//! The identity SDK is external; all the client needs from it is an opaque
//! ID token, or a failure. That token is handed to the backend's Google
//! login endpoint.

use async_trait::async_trait;

/// Why the identity provider could not produce a token.
#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    /// The user dismissed the sign-in flow.
    #[error("sign-in was cancelled")]
    Cancelled,

    /// The provider failed for any other reason.
    #[error("sign-in failed: {0}")]
    Failed(String),
}

/// Source of third-party identity tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn id_token(&self) -> Result<String, SignInError>;
}

/// Provider backed by a token obtained out of band (flag, env var, file).
#[derive(Clone)]
pub struct StaticIdentityProvider {
    token: String,
}

impl StaticIdentityProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticIdentityProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn id_token(&self) -> Result<String, SignInError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(SignInError::Failed("empty identity token".into()));
        }
        Ok(token.to_string())
    }
}
