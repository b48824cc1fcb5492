//! Knowledge-source screen for one project (or all sources).

use std::path::Path;

use sourcechat_shared::{ApiResult, KnowledgeSource};
use tracing::debug;

use super::{EventQueue, Loadable, UiEvent};
use crate::repository::KnowledgeSourceRepository;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourcesState {
    pub project_id: Option<String>,
    pub sources: Loadable<Vec<KnowledgeSource>>,
    pub uploading: bool,
}

pub struct SourcesViewModel {
    repo: KnowledgeSourceRepository,
    state: SourcesState,
    events: EventQueue,
}

impl SourcesViewModel {
    pub fn new(repo: KnowledgeSourceRepository, project_id: Option<String>) -> Self {
        Self {
            repo,
            state: SourcesState {
                project_id,
                ..SourcesState::default()
            },
            events: EventQueue::default(),
        }
    }

    pub fn state(&self) -> &SourcesState {
        &self.state
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub async fn load(&mut self) {
        self.state.sources = Loadable::Loading;
        let result = self.repo.list_sources(self.state.project_id.as_deref()).await;
        if let Err(error) = &result {
            self.events.report(*error);
        }
        self.state.sources = result.into();
    }

    pub async fn upload(&mut self, path: &Path) -> Option<KnowledgeSource> {
        self.state.uploading = true;
        let result = self
            .repo
            .upload_file(self.state.project_id.as_deref(), path)
            .await;
        self.state.uploading = false;
        self.accept(result)
    }

    pub async fn add_link(&mut self, url: &str) -> Option<KnowledgeSource> {
        let url = url.trim();
        if url::Url::parse(url).is_err() {
            self.events.message("Enter a valid link.");
            return None;
        }
        let result = self.repo.add_link(self.state.project_id.as_deref(), url).await;
        self.accept(result)
    }

    pub async fn delete(&mut self, source_id: &str) -> bool {
        match self.repo.delete_source(source_id).await {
            Ok(()) => {
                if let Some(sources) = self.state.sources.ready_mut() {
                    sources.retain(|s| s.id != source_id);
                }
                true
            }
            Err(error) => {
                self.events.report(error);
                false
            }
        }
    }

    /// New sources are the newest, so they go first.
    fn accept(&mut self, result: ApiResult<KnowledgeSource>) -> Option<KnowledgeSource> {
        match result {
            Ok(source) => {
                debug!(id = %source.id, "source added");
                if let Some(sources) = self.state.sources.ready_mut() {
                    sources.insert(0, source.clone());
                }
                self.events.message(format!("Added \"{}\".", source.name));
                Some(source)
            }
            Err(error) => {
                self.events.report(error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sourcechat_shared::{DataError, LocalError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::repository::test_support::{client_for, ok, signed_in};

    #[tokio::test]
    async fn add_link_prepends_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!([
                { "id": "s1", "type": "file", "name": "a.pdf", "createdAt": "2026-01-01T00:00:00Z" }
            ]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sources/link"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
                "id": "s2",
                "type": "link",
                "url": "https://docs.rs/",
                "createdAt": "2026-03-01T00:00:00Z"
            }))))
            .mount(&server)
            .await;

        let repo = KnowledgeSourceRepository::new(client_for(&server, signed_in()));
        let mut vm = SourcesViewModel::new(repo, Some("p1".into()));
        vm.load().await;
        vm.add_link("https://docs.rs/").await.expect("added");

        let sources = vm.state().sources.ready().expect("loaded");
        assert_eq!(sources[0].id, "s2");
    }

    #[tokio::test]
    async fn invalid_link_is_rejected_locally() {
        let server = MockServer::start().await;
        let repo = KnowledgeSourceRepository::new(client_for(&server, signed_in()));
        let mut vm = SourcesViewModel::new(repo, None);

        assert!(vm.add_link("not a url").await.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_upload_reports_local_error() {
        let server = MockServer::start().await;
        let repo = KnowledgeSourceRepository::new(client_for(&server, signed_in()));
        let mut vm = SourcesViewModel::new(repo, None);

        let missing = std::env::temp_dir().join("sourcechat-definitely-missing.bin");
        assert!(vm.upload(&missing).await.is_none());
        assert!(!vm.state().uploading);

        let expected = DataError::Local(LocalError::Unknown).user_message();
        assert_eq!(vm.take_events(), [UiEvent::Message(expected.into())]);
    }
}
