//! Composition root: config, credential store, transport and session bus.

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::Result;
use sourcechat_core::Repositories;
use sourcechat_net::{ApiClient, SessionEvent, SessionEvents};
use sourcechat_shared::{
    AppConfig, AuthError, ClientConfig, DataError, credentials_db_path, load_config,
};
use sourcechat_storage::{Storage, TokenStore};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything a network command needs, wired once per process.
pub(crate) struct AppContext {
    pub config: AppConfig,
    pub repos: Repositories,
    listener: JoinHandle<()>,
}

impl AppContext {
    /// Load config, open the credential database and build the client.
    pub(crate) async fn open(api_url: Option<&str>) -> Result<Self> {
        let config = resolve_config(api_url)?;
        let client_config = ClientConfig::try_from(&config)?;

        let db_path = credentials_db_path(&config)?;
        debug!(path = %db_path.display(), "opening credential store");
        let store: Arc<dyn TokenStore> = Arc::new(Storage::open(&db_path).await?);

        let session = SessionEvents::new();
        let listener = spawn_session_listener(&session, Arc::clone(&store));
        let client = ApiClient::new(&client_config, store, session)?;

        Ok(Self {
            config,
            repos: Repositories::new(client),
            listener,
        })
    }

    /// Drop every transport handle so the session bus closes, then let the
    /// listener finish whatever it was handling.
    pub(crate) async fn close(self) {
        let Self { repos, listener, .. } = self;
        drop(repos);
        if let Err(e) = listener.await {
            warn!(error = %e, "session listener ended abnormally");
        }
    }
}

/// Config file plus the `--api-url` / `SOURCECHAT_API_URL` override.
pub(crate) fn resolve_config(api_url: Option<&str>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(url) = api_url {
        config.api.base_url = url.to_string();
    }
    Ok(config)
}

/// Whether credentials are stored, without creating or migrating anything.
pub(crate) async fn has_stored_session(db_path: &Path) -> Result<bool> {
    if !db_path.exists() {
        return Ok(false);
    }
    let storage = Storage::open_readonly(db_path).await?;
    Ok(storage.access_token().await?.is_some())
}

/// React to session expiry reported by the transport.
///
/// An expired access token can still be refreshed, so only a hint is logged.
/// Any other session-ending cause makes the stored credentials useless, and
/// they are cleared.
fn spawn_session_listener(session: &SessionEvents, store: Arc<dyn TokenStore>) -> JoinHandle<()> {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::Expired { cause }) if is_refreshable(cause) => {
                    info!(%cause, "access token expired; `sourcechat auth refresh` can renew it");
                }
                Ok(SessionEvent::Expired { cause }) => {
                    warn!(%cause, "session ended, clearing stored credentials");
                    if let Err(e) = store.clear().await {
                        warn!(error = %e, "failed to clear credentials");
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "session listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn is_refreshable(cause: DataError) -> bool {
    matches!(cause, DataError::Auth(AuthError::JwtTokenExpired))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sourcechat_shared::{AuthTokens, NetworkError};
    use sourcechat_storage::MemoryTokenStore;

    fn tokens() -> AuthTokens {
        AuthTokens {
            access_token: "a".into(),
            refresh_token: "r".into(),
        }
    }

    #[tokio::test]
    async fn listener_clears_on_terminal_expiry() {
        let store = Arc::new(MemoryTokenStore::with_tokens(tokens()));
        let session = SessionEvents::new();
        let listener = spawn_session_listener(&session, store.clone());

        session.notify_expired(DataError::Auth(AuthError::TokenBlacklisted));
        drop(session);
        listener.await.expect("listener");

        assert!(store.access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listener_keeps_refreshable_session() {
        let store = Arc::new(MemoryTokenStore::with_tokens(tokens()));
        let session = SessionEvents::new();
        let listener = spawn_session_listener(&session, store.clone());

        session.notify_expired(DataError::Auth(AuthError::JwtTokenExpired));
        drop(session);
        listener.await.expect("listener");

        assert!(store.refresh_token().await.unwrap().is_some());
    }

    #[test]
    fn only_expired_jwt_is_refreshable() {
        assert!(is_refreshable(DataError::Auth(AuthError::JwtTokenExpired)));
        assert!(!is_refreshable(DataError::Network(NetworkError::Unauthorized)));
        assert!(!is_refreshable(DataError::Auth(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn missing_database_means_signed_out() {
        let name = format!("sourcechat-none-{}.db", uuid::Uuid::now_v7());
        let path = std::env::temp_dir().join(name);
        assert!(!has_stored_session(&path).await.expect("status"));
    }
}
