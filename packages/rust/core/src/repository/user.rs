//! The signed-in user's profile and account.

use serde::de::IgnoredAny;
use sourcechat_net::ApiClient;
use sourcechat_shared::{ApiResult, EmptyResult, ProfileUpdate, UserProfile};
use tracing::{info, instrument};

use super::{discard_data, require_data, store_failure};
use crate::dto::{UpdateProfileRequest, UserDto};

const ME: &str = "/api/v1/users/me";

#[derive(Clone)]
pub struct UserRepository {
    client: ApiClient,
}

impl UserRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip_all)]
    pub async fn get_profile(&self) -> ApiResult<UserProfile> {
        let envelope = self.client.get::<UserDto>(ME).await?;
        require_data(envelope).map(UserProfile::from)
    }

    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        let body = UpdateProfileRequest {
            display_name: update.display_name.as_deref(),
            avatar_url: update.avatar_url.as_deref(),
        };
        let envelope = self.client.put::<_, UserDto>(ME, &body).await?;
        require_data(envelope).map(UserProfile::from)
    }

    /// Delete the account, then drop the now-useless local credentials.
    #[instrument(skip_all)]
    pub async fn delete_account(&self) -> EmptyResult {
        discard_data(self.client.delete::<IgnoredAny>(ME).await)?;
        self.client.tokens().clear().await.map_err(store_failure)?;
        info!("account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sourcechat_shared::{DataError, UserError};
    use sourcechat_storage::TokenStore;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::repository::test_support::{client_for, failure, ok, signed_in};

    fn profile_json(name: &str) -> serde_json::Value {
        json!({
            "id": "u1",
            "email": "ada@example.com",
            "displayName": name,
            "avatarUrl": null,
            "createdAt": "2026-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn get_profile_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ME))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(profile_json("Ada"))))
            .expect(1)
            .mount(&server)
            .await;

        let repo = UserRepository::new(client_for(&server, signed_in()));
        let profile = repo.get_profile().await.expect("profile");
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.avatar_url, None);
    }

    #[tokio::test]
    async fn update_profile_maps_duplicate_email() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(ME))
            .and(body_json(json!({ "displayName": "Ada L." })))
            .respond_with(ResponseTemplate::new(409).set_body_json(failure(5202)))
            .mount(&server)
            .await;

        let repo = UserRepository::new(client_for(&server, signed_in()));
        let update = ProfileUpdate {
            display_name: Some("Ada L.".into()),
            avatar_url: None,
        };
        let err = repo.update_profile(&update).await.unwrap_err();
        assert_eq!(err, DataError::User(UserError::DuplicateEmail));
    }

    #[tokio::test]
    async fn delete_account_clears_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(ME))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
            .mount(&server)
            .await;

        let store = signed_in();
        let repo = UserRepository::new(client_for(&server, store.clone()));
        repo.delete_account().await.expect("deleted");
        assert!(store.access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(ME))
            .respond_with(ResponseTemplate::new(403).set_body_json(failure(5101)))
            .mount(&server)
            .await;

        let store = signed_in();
        let repo = UserRepository::new(client_for(&server, store.clone()));
        let err = repo.delete_account().await.unwrap_err();
        assert_eq!(err, DataError::User(UserError::InsufficientPermissions));
        assert!(store.access_token().await.unwrap().is_some());
    }
}
