//! Projects: named groupings of chats and knowledge sources.

use serde::de::IgnoredAny;
use sourcechat_net::ApiClient;
use sourcechat_shared::{ApiResult, EmptyResult, NewProject, Project, ProjectUpdate};
use tracing::instrument;

use super::{discard_data, require_data};
use crate::dto::{CreateProjectRequest, ProjectDto, UpdateProjectRequest};

const PROJECTS: &str = "/api/v1/projects";

#[derive(Clone)]
pub struct ProjectRepository {
    client: ApiClient,
}

impl ProjectRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All projects, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let envelope = self.client.get::<Vec<ProjectDto>>(PROJECTS).await?;
        let mut projects: Vec<Project> = require_data(envelope)?
            .into_iter()
            .map(Project::from)
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    #[instrument(skip(self))]
    pub async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        let envelope = self
            .client
            .get::<ProjectDto>(&project_path(project_id))
            .await?;
        require_data(envelope).map(Project::from)
    }

    #[instrument(skip_all, fields(name = %new.name))]
    pub async fn create_project(&self, new: &NewProject) -> ApiResult<Project> {
        let body = CreateProjectRequest {
            name: &new.name,
            description: new.description.as_deref(),
        };
        let envelope = self.client.post::<_, ProjectDto>(PROJECTS, &body).await?;
        require_data(envelope).map(Project::from)
    }

    #[instrument(skip(self, update))]
    pub async fn update_project(
        &self,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> ApiResult<Project> {
        let body = UpdateProjectRequest {
            name: update.name.as_deref(),
            description: update.description.as_deref(),
        };
        let envelope = self
            .client
            .put::<_, ProjectDto>(&project_path(project_id), &body)
            .await?;
        require_data(envelope).map(Project::from)
    }

    #[instrument(skip(self))]
    pub async fn delete_project(&self, project_id: &str) -> EmptyResult {
        discard_data(
            self.client
                .delete::<IgnoredAny>(&project_path(project_id))
                .await,
        )
    }
}

fn project_path(project_id: &str) -> String {
    format!("{PROJECTS}/{project_id}")
}
