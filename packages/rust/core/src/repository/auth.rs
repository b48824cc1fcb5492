//! Authentication: OTP, Google sign-in, token refresh and logout.
//!
//! Every successful token response is persisted to the credential store
//! before the tokens are handed back. A store failure at that point fails
//! the whole operation with `Local::SqlError`.

use serde::de::IgnoredAny;
use sourcechat_net::ApiClient;
use sourcechat_shared::{ApiResult, AuthError, AuthTokens, DataError, EmptyResult};
use tracing::{debug, info, instrument, warn};

use super::{discard_data, require_data, store_failure};
use crate::dto::{
    GoogleLoginRequest, RefreshTokenRequest, SendOtpRequest, TokenDto, VerifyOtpRequest,
};
use crate::signin::IdentityProvider;

const SEND_OTP: &str = "/api/v1/auth/send-otp";
const VERIFY_OTP: &str = "/api/v1/auth/verify-otp";
const GOOGLE_LOGIN: &str = "/api/v1/auth/google";
const REFRESH: &str = "/api/v1/auth/refresh";
const LOGOUT: &str = "/api/v1/auth/logout";

#[derive(Clone)]
pub struct AuthRepository {
    client: ApiClient,
}

impl AuthRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Ask the backend to email a one-time password to `email`.
    #[instrument(skip_all)]
    pub async fn send_otp(&self, email: &str) -> EmptyResult {
        let result = self
            .client
            .post::<_, IgnoredAny>(SEND_OTP, &SendOtpRequest { email })
            .await;
        discard_data(result)
    }

    /// Exchange an emailed OTP for a token pair and persist it.
    #[instrument(skip_all)]
    pub async fn verify_otp(&self, email: &str, otp: &str) -> ApiResult<AuthTokens> {
        let envelope = self
            .client
            .post::<_, TokenDto>(VERIFY_OTP, &VerifyOtpRequest { email, otp })
            .await?;
        self.persist(require_data(envelope)?).await
    }

    /// Exchange a Google ID token for a token pair and persist it.
    #[instrument(skip_all)]
    pub async fn login_with_google(&self, id_token: &str) -> ApiResult<AuthTokens> {
        let envelope = self
            .client
            .post::<_, TokenDto>(GOOGLE_LOGIN, &GoogleLoginRequest { id_token })
            .await?;
        self.persist(require_data(envelope)?).await
    }

    /// Run a third-party sign-in flow, then log in with its ID token.
    ///
    /// A provider failure never reaches the network and surfaces as
    /// `Auth::GoogleTokenInvalid`.
    #[instrument(skip_all)]
    pub async fn sign_in_with(&self, provider: &dyn IdentityProvider) -> ApiResult<AuthTokens> {
        let id_token = provider.id_token().await.map_err(|e| {
            warn!(error = %e, "identity provider failed");
            DataError::Auth(AuthError::GoogleTokenInvalid)
        })?;
        self.login_with_google(&id_token).await
    }

    /// Trade the stored refresh token for a new pair.
    ///
    /// Without a stored refresh token this fails with
    /// `Auth::InvalidRefreshToken` and makes no request.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> ApiResult<AuthTokens> {
        let refresh_token = self
            .client
            .tokens()
            .refresh_token()
            .await
            .map_err(store_failure)?
            .ok_or(DataError::Auth(AuthError::InvalidRefreshToken))?;

        let envelope = self
            .client
            .post::<_, TokenDto>(
                REFRESH,
                &RefreshTokenRequest {
                    refresh_token: &refresh_token,
                },
            )
            .await?;
        self.persist(require_data(envelope)?).await
    }

    /// Revoke the refresh token server-side and clear local credentials.
    ///
    /// With nothing stored there is nothing to revoke; the local clear still
    /// runs. Credentials are only cleared when the server accepted the
    /// logout, so a failed call leaves the session intact.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> EmptyResult {
        let store = self.client.tokens();
        let Some(refresh_token) = store.refresh_token().await.map_err(store_failure)? else {
            debug!("no session to revoke");
            return store.clear().await.map_err(store_failure);
        };

        let result = self
            .client
            .post::<_, IgnoredAny>(
                LOGOUT,
                &RefreshTokenRequest {
                    refresh_token: &refresh_token,
                },
            )
            .await;
        discard_data(result)?;

        store.clear().await.map_err(store_failure)?;
        info!("logged out");
        Ok(())
    }

    /// Whether an access token is stored. Store errors read as signed out.
    pub async fn is_logged_in(&self) -> bool {
        match self.client.tokens().access_token().await {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "credential store read failed");
                false
            }
        }
    }

    async fn persist(&self, dto: TokenDto) -> ApiResult<AuthTokens> {
        let tokens = AuthTokens::from(dto);
        self.client
            .tokens()
            .save_tokens(&tokens)
            .await
            .map_err(store_failure)?;
        info!("session tokens stored");
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use sourcechat_shared::{ClientError, NetworkError, Result as ClientResult};
    use sourcechat_storage::{MemoryTokenStore, TokenStore};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::repository::test_support::{client_for, failure, ok, signed_in};
    use crate::signin::{SignInError, StaticIdentityProvider};

    fn token_body(access: &str, refresh: &str) -> serde_json::Value {
        ok(json!({
            "accessToken": access,
            "refreshToken": refresh,
            "tokenType": "Bearer",
            "expiresIn": 900
        }))
    }

    #[tokio::test]
    async fn verify_otp_persists_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VERIFY_OTP))
            .and(body_json(json!({ "email": "ada@example.com", "otp": "123456" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a", "b")))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let repo = AuthRepository::new(client_for(&server, store.clone()));

        let tokens = repo.verify_otp("ada@example.com", "123456").await.expect("tokens");
        assert_eq!(tokens.access_token, "a");
        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("b"));
        assert!(repo.is_logged_in().await);
    }

    #[tokio::test]
    async fn verify_otp_maps_mismatch_and_keeps_store_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VERIFY_OTP))
            .respond_with(ResponseTemplate::new(400).set_body_json(failure(4101)))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let repo = AuthRepository::new(client_for(&server, store.clone()));

        let err = repo.verify_otp("ada@example.com", "000000").await.unwrap_err();
        assert_eq!(err, DataError::Auth(AuthError::OtpMismatch));
        assert!(store.access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn send_otp_is_public_and_accepts_null_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_OTP))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
            .mount(&server)
            .await;

        let repo = AuthRepository::new(client_for(&server, signed_in()));
        repo.send_otp("ada@example.com").await.expect("sent");

        let requests = server.received_requests().await.expect("recorded");
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn token_response_without_data_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GOOGLE_LOGIN))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
            .mount(&server)
            .await;

        let repo = AuthRepository::new(client_for(&server, Arc::new(MemoryTokenStore::new())));
        let err = repo.login_with_google("id-token").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::EmptyResponse));
    }

    #[tokio::test]
    async fn sign_in_with_provider_posts_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GOOGLE_LOGIN))
            .and(body_json(json!({ "idToken": "google-id" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("g-a", "g-r")))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let repo = AuthRepository::new(client_for(&server, store.clone()));
        let provider = StaticIdentityProvider::new("google-id");

        repo.sign_in_with(&provider).await.expect("signed in");
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("g-r"));
    }

    struct CancelledProvider;

    #[async_trait]
    impl IdentityProvider for CancelledProvider {
        async fn id_token(&self) -> std::result::Result<String, SignInError> {
            Err(SignInError::Cancelled)
        }
    }

    #[tokio::test]
    async fn provider_failure_is_google_token_invalid() {
        let server = MockServer::start().await;
        let repo = AuthRepository::new(client_for(&server, Arc::new(MemoryTokenStore::new())));

        let err = repo.sign_in_with(&CancelledProvider).await.unwrap_err();
        assert_eq!(err, DataError::Auth(AuthError::GoogleTokenInvalid));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_without_token_skips_network() {
        let server = MockServer::start().await;
        let repo = AuthRepository::new(client_for(&server, Arc::new(MemoryTokenStore::new())));

        let err = repo.refresh().await.unwrap_err();
        assert_eq!(err, DataError::Auth(AuthError::InvalidRefreshToken));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_rotates_stored_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH))
            .and(body_json(json!({ "refreshToken": "refresh-1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")),
            )
            .mount(&server)
            .await;

        let store = signed_in();
        let repo = AuthRepository::new(client_for(&server, store.clone()));

        repo.refresh().await.expect("refreshed");
        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn logout_clears_only_after_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGOUT))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
            .mount(&server)
            .await;

        let store = signed_in();
        let repo = AuthRepository::new(client_for(&server, store.clone()));

        let err = repo.logout().await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::ServerError));
        assert!(repo.is_logged_in().await);

        repo.logout().await.expect("logged out");
        assert!(!repo.is_logged_in().await);
    }

    #[tokio::test]
    async fn logout_without_session_is_local_only() {
        let server = MockServer::start().await;
        let repo = AuthRepository::new(client_for(&server, Arc::new(MemoryTokenStore::new())));

        repo.logout().await.expect("noop logout");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    struct BrokenStore;

    #[async_trait]
    impl TokenStore for BrokenStore {
        async fn access_token(&self) -> ClientResult<Option<String>> {
            Ok(None)
        }
        async fn refresh_token(&self) -> ClientResult<Option<String>> {
            Ok(None)
        }
        async fn save_tokens(&self, _tokens: &AuthTokens) -> ClientResult<()> {
            Err(ClientError::Storage("disk I/O error".into()))
        }
        async fn clear(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn store_failure_after_login_is_sql_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VERIFY_OTP))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a", "b")))
            .mount(&server)
            .await;

        let repo = AuthRepository::new(client_for(&server, Arc::new(BrokenStore)));
        let err = repo.verify_otp("ada@example.com", "123456").await.unwrap_err();
        assert_eq!(err, DataError::Local(sourcechat_shared::LocalError::SqlError));
    }
}
