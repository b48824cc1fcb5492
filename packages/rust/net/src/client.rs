//! Reqwest-backed transport client for the SourceChat API.
//!
//! Owns transport details only: URL building, bearer attachment, timeouts and
//! body collection. Every request goes through [`safe_call`], so each method
//! returns an [`ApiResult`] and never an error of its own.

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sourcechat_shared::{ApiResult, ClientConfig, ClientError, DataError, NetworkError, Result};
use sourcechat_storage::TokenStore;
use tracing::{debug, instrument, warn};

use crate::envelope::{SuccessEnvelope, TransportResponse};
use crate::safe_call::safe_call;
use crate::session::SessionEvents;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("SourceChat/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one backend, one token store and one session bus.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    public_paths: Arc<[String]>,
    tokens: Arc<dyn TokenStore>,
    session: SessionEvents,
}

impl ApiClient {
    /// Build a client with the timeouts and allowlist from `config`.
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        session: SessionEvents,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            public_paths: config.public_paths.clone().into(),
            tokens,
            session,
        })
    }

    /// The credential store requests are authorised from.
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// The session bus this client reports expiry on.
    pub fn session(&self) -> &SessionEvents {
        &self.session
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    pub async fn get<T>(&self, path: &str) -> ApiResult<SuccessEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        self.send(path, |http, url| http.get(url)).await
    }

    /// `GET` with query parameters; `None` values are omitted.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<SuccessEnvelope<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(path, |http, url| http.get(url).query(query)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<SuccessEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, |http, url| http.post(url).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<SuccessEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, |http, url| http.put(url).json(body)).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ApiResult<SuccessEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, |http, url| http.patch(url).json(body)).await
    }

    pub async fn delete<T>(&self, path: &str) -> ApiResult<SuccessEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        self.send(path, |http, url| http.delete(url)).await
    }

    /// `POST` a multipart form (file uploads).
    pub async fn post_multipart<T>(&self, path: &str, form: Form) -> ApiResult<SuccessEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        self.send(path, |http, url| http.post(url).multipart(form)).await
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Build, authorise and execute one request, then report session expiry.
    #[instrument(skip_all, fields(path = %path))]
    async fn send<T, F>(&self, path: &str, build: F) -> ApiResult<SuccessEnvelope<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(&Client, Url) -> RequestBuilder,
    {
        let url = self.endpoint(path)?;
        let bearer = self.bearer_for(path).await;

        let result = safe_call(|| async move {
            let mut request = build(&self.http, url);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok(TransportResponse::new(status, body.to_vec()))
        })
        .await;

        if let Err(error) = &result {
            if error.is_session_expired() {
                self.session.notify_expired(*error);
            }
        }
        result
    }

    /// Absolute URL for `path`, keeping any path prefix of the base URL.
    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| {
            warn!(%joined, error = %e, "could not build request URL");
            DataError::Network(NetworkError::Unknown)
        })
    }

    /// Access token to attach, unless `path` is public or none is stored.
    async fn bearer_for(&self, path: &str) -> Option<String> {
        if is_public_path(path, &self.public_paths) {
            debug!("public endpoint, no bearer");
            return None;
        }

        match self.tokens.access_token().await {
            Ok(Some(token)) => Some(token),
            Ok(None) => {
                debug!("no access token stored");
                None
            }
            Err(e) => {
                warn!(error = %e, "credential store read failed, sending unauthenticated");
                None
            }
        }
    }
}

/// Whether `path` is on the public allowlist. Query strings and a trailing
/// slash are ignored.
pub fn is_public_path(path: &str, allowlist: &[String]) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    let path = normalize(path);
    allowlist.iter().any(|public| normalize(public) == path)
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde::Deserialize;
    use sourcechat_shared::{AuthError, AuthTokens, DEFAULT_PUBLIC_PATHS};
    use sourcechat_storage::MemoryTokenStore;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::session::SessionEvent;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Echo {
        value: String,
    }

    fn signed_in_store() -> Arc<dyn TokenStore> {
        Arc::new(MemoryTokenStore::with_tokens(AuthTokens {
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
        }))
    }

    fn client_for(server: &MockServer, tokens: Arc<dyn TokenStore>) -> ApiClient {
        let config = ClientConfig::new(&server.uri()).expect("config");
        ApiClient::new(&config, tokens, SessionEvents::new()).expect("client")
    }

    fn ok_body(value: &str) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "message": "ok",
            "data": { "value": value },
            "status": 200,
            "timestamp": "2026-03-02T09:15:00Z"
        })
    }

    #[test]
    fn public_path_matching() {
        let allow: Vec<String> = DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect();
        assert!(is_public_path("/api/v1/auth/send-otp", &allow));
        assert!(is_public_path("/api/v1/auth/send-otp/", &allow));
        assert!(is_public_path("/api/v1/auth/login?next=1", &allow));
        assert!(!is_public_path("/api/v1/auth/logout", &allow));
        assert!(!is_public_path("/api/v1/auth/send-otp/extra", &allow));
        assert!(!is_public_path("/api/v1/chats", &allow));
    }

    #[tokio::test]
    async fn endpoint_keeps_base_path_prefix() {
        let config = ClientConfig::new("https://example.com/backend/").expect("config");
        let client = ApiClient::new(&config, signed_in_store(), SessionEvents::new()).unwrap();
        let url = client.endpoint("/api/v1/chats").unwrap();
        assert_eq!(url.as_str(), "https://example.com/backend/api/v1/chats");
    }

    #[tokio::test]
    async fn protected_requests_carry_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/chats"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("a")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        let env = client.get::<Echo>("/api/v1/chats").await.expect("ok");
        assert_eq!(env.data.unwrap().value, "a");
    }

    #[tokio::test]
    async fn public_requests_carry_no_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/send-otp"))
            .and(body_json(serde_json::json!({ "email": "a@b.c" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("sent")))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        client
            .post::<_, Echo>("/api/v1/auth/send-otp", &serde_json::json!({ "email": "a@b.c" }))
            .await
            .expect("ok");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn signed_out_requests_carry_no_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("me")))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryTokenStore::new()));
        client.get::<Echo>("/api/v1/users/me").await.expect("ok");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn query_parameters_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sources"))
            .and(query_param("projectId", "p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("q")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        client
            .get_with_query::<Echo, _>("/api/v1/sources", &[("projectId", "p1")])
            .await
            .expect("ok");
    }

    #[tokio::test]
    async fn envelope_status_wins_and_session_expiry_is_broadcast() {
        let server = MockServer::start().await;
        let fixture = std::fs::read_to_string("../../../fixtures/json/jwt_expired.fixture.json")
            .expect("read fixture");
        Mock::given(method("GET"))
            .and(path("/api/v1/chats"))
            .respond_with(ResponseTemplate::new(401).set_body_string(fixture))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        let mut events = client.session().subscribe();

        let err = client.get::<Echo>("/api/v1/chats").await.unwrap_err();
        assert_eq!(err, DataError::Auth(AuthError::JwtTokenExpired));

        let event = events.recv().await.expect("event");
        assert_eq!(event, SessionEvent::Expired { cause: err });
    }

    #[tokio::test]
    async fn non_session_errors_are_not_broadcast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/projects/x"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false, "message": "missing", "status": 6001, "timestamp": ""
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        let mut events = client.session().subscribe();

        let err = client.get::<Echo>("/api/v1/projects/x").await.unwrap_err();
        assert_eq!(err.namespace(), "project");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_200_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        let err = client.get::<Echo>("/api/v1/chats").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::EmptyResponse));
    }

    #[tokio::test]
    async fn unparseable_500_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Bad Gateway</h1>"))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in_store());
        let err = client.get::<Echo>("/api/v1/chats").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::ServerError));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = ClientConfig::new(&server.uri()).expect("config");
        config.timeout = Duration::from_millis(200);
        let client = ApiClient::new(&config, signed_in_store(), SessionEvents::new()).unwrap();

        let err = client.get::<Echo>("/api/v1/chats").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::RequestTimeout));
    }

    #[tokio::test]
    async fn refused_connection_is_no_internet() {
        // Grab a free port, then release it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::new(&format!("http://127.0.0.1:{port}")).unwrap();
        let client = ApiClient::new(&config, signed_in_store(), SessionEvents::new()).unwrap();

        let err = client.get::<Echo>("/api/v1/chats").await.unwrap_err();
        assert_eq!(err, DataError::Network(NetworkError::NoInternet));
    }
}
