//! Project list screen.

use sourcechat_shared::{NewProject, Project, ProjectUpdate};

use super::{EventQueue, Loadable, UiEvent};
use crate::repository::ProjectRepository;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectsState {
    pub projects: Loadable<Vec<Project>>,
    /// Detail view, loaded on demand.
    pub selected: Loadable<Project>,
}

pub struct ProjectsViewModel {
    repo: ProjectRepository,
    state: ProjectsState,
    events: EventQueue,
}

impl ProjectsViewModel {
    pub fn new(repo: ProjectRepository) -> Self {
        Self {
            repo,
            state: ProjectsState::default(),
            events: EventQueue::default(),
        }
    }

    pub fn state(&self) -> &ProjectsState {
        &self.state
    }

    pub fn take_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }

    pub async fn load(&mut self) {
        self.state.projects = Loadable::Loading;
        let result = self.repo.list_projects().await;
        if let Err(error) = &result {
            self.events.report(*error);
        }
        self.state.projects = result.into();
    }

    pub async fn select(&mut self, project_id: &str) {
        self.state.selected = Loadable::Loading;
        let result = self.repo.get_project(project_id).await;
        if let Err(error) = &result {
            self.events.report(*error);
        }
        self.state.selected = result.into();
    }

    pub async fn create(&mut self, new: &NewProject) -> Option<Project> {
        if new.name.trim().is_empty() {
            self.events.message("Project name can't be empty.");
            return None;
        }

        match self.repo.create_project(new).await {
            Ok(project) => {
                if let Some(projects) = self.state.projects.ready_mut() {
                    projects.insert(0, project.clone());
                }
                self.events.message(format!("Created \"{}\".", project.name));
                Some(project)
            }
            Err(error) => {
                self.events.report(error);
                None
            }
        }
    }

    pub async fn update(&mut self, project_id: &str, update: &ProjectUpdate) -> Option<Project> {
        match self.repo.update_project(project_id, update).await {
            Ok(project) => {
                if let Some(projects) = self.state.projects.ready_mut() {
                    projects.retain(|p| p.id != project.id);
                    projects.insert(0, project.clone());
                }
                if matches!(&self.state.selected, Loadable::Ready(p) if p.id == project.id) {
                    self.state.selected = Loadable::Ready(project.clone());
                }
                Some(project)
            }
            Err(error) => {
                self.events.report(error);
                None
            }
        }
    }

    pub async fn delete(&mut self, project_id: &str) -> bool {
        match self.repo.delete_project(project_id).await {
            Ok(()) => {
                if let Some(projects) = self.state.projects.ready_mut() {
                    projects.retain(|p| p.id != project_id);
                }
                if matches!(&self.state.selected, Loadable::Ready(p) if p.id == project_id) {
                    self.state.selected = Loadable::Idle;
                }
                true
            }
            Err(error) => {
                self.events.report(error);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sourcechat_shared::{DataError, ProjectError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::repository::test_support::{client_for, failure, ok, signed_in};

    fn project(id: &str, name: &str, updated: &str) -> serde_json::Value {
        json!({ "id": id, "name": name, "createdAt": "2026-01-01T00:00:00Z", "updatedAt": updated })
    }

    #[tokio::test]
    async fn update_moves_project_to_top() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!([
                project("p1", "Docs", "2026-02-01T00:00:00Z"),
                project("p2", "API", "2026-01-15T00:00:00Z")
            ]))))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/projects/p2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok(project("p2", "Public API", "2026-03-01T00:00:00Z"))),
            )
            .mount(&server)
            .await;

        let repo = ProjectRepository::new(client_for(&server, signed_in()));
        let mut vm = ProjectsViewModel::new(repo);
        vm.load().await;
        let update = ProjectUpdate {
            name: Some("Public API".into()),
            description: None,
        };
        vm.update("p2", &update).await.expect("updated");

        let projects = vm.state().projects.ready().expect("loaded");
        assert_eq!(projects[0].name, "Public API");
        assert_eq!(projects.len(), 2);
    }

    #[tokio::test]
    async fn select_missing_project_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/projects/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(failure(6001)))
            .mount(&server)
            .await;

        let repo = ProjectRepository::new(client_for(&server, signed_in()));
        let mut vm = ProjectsViewModel::new(repo);
        vm.select("gone").await;

        assert_eq!(
            vm.state().selected.error(),
            Some(DataError::Project(ProjectError::ProjectNotFound))
        );
        assert_eq!(vm.take_events().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_locally() {
        let server = MockServer::start().await;
        let repo = ProjectRepository::new(client_for(&server, signed_in()));
        let mut vm = ProjectsViewModel::new(repo);

        let created = vm
            .create(&NewProject {
                name: "   ".into(),
                description: None,
            })
            .await;
        assert!(created.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
