//! Knowledge sources: uploaded files and linked web pages.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::de::IgnoredAny;
use sourcechat_net::ApiClient;
use sourcechat_shared::{ApiResult, DataError, EmptyResult, KnowledgeSource, LocalError};
use tracing::{info, instrument, warn};

use super::{discard_data, require_data};
use crate::dto::{AddLinkRequest, ProjectQuery, SourceDto};

const SOURCES: &str = "/api/v1/sources";
const UPLOAD: &str = "/api/v1/sources/upload";
const LINK: &str = "/api/v1/sources/link";

#[derive(Clone)]
pub struct KnowledgeSourceRepository {
    client: ApiClient,
}

impl KnowledgeSourceRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sources, newest first, optionally scoped to a project.
    #[instrument(skip(self))]
    pub async fn list_sources(&self, project_id: Option<&str>) -> ApiResult<Vec<KnowledgeSource>> {
        let envelope = self
            .client
            .get_with_query::<Vec<SourceDto>, _>(SOURCES, &ProjectQuery { project_id })
            .await?;

        let mut sources: Vec<KnowledgeSource> = require_data(envelope)?
            .into_iter()
            .map(KnowledgeSource::from)
            .collect();
        sources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sources)
    }

    /// Upload a local file as a multipart `file` part.
    ///
    /// A file that cannot be read fails with `Local::Unknown` before any
    /// request is made.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_file(
        &self,
        project_id: Option<&str>,
        path: &Path,
    ) -> ApiResult<KnowledgeSource> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            warn!(error = %e, "could not read upload");
            DataError::Local(LocalError::Unknown)
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type_for(path))
            .map_err(|e| {
                warn!(error = %e, "invalid upload content type");
                DataError::Local(LocalError::Unknown)
            })?;

        let mut form = Form::new().part("file", part);
        if let Some(project_id) = project_id {
            form = form.text("projectId", project_id.to_string());
        }

        let envelope = self.client.post_multipart::<SourceDto>(UPLOAD, form).await?;
        let source = require_data(envelope).map(KnowledgeSource::from)?;
        info!(id = %source.id, bytes = size, "file uploaded");
        Ok(source)
    }

    /// Register a web page as a source.
    #[instrument(skip(self))]
    pub async fn add_link(
        &self,
        project_id: Option<&str>,
        url: &str,
    ) -> ApiResult<KnowledgeSource> {
        let envelope = self
            .client
            .post::<_, SourceDto>(LINK, &AddLinkRequest { url, project_id })
            .await?;
        require_data(envelope).map(KnowledgeSource::from)
    }

    #[instrument(skip(self))]
    pub async fn delete_source(&self, source_id: &str) -> EmptyResult {
        let path = format!("{SOURCES}/{source_id}");
        discard_data(self.client.delete::<IgnoredAny>(&path).await)
    }
}

/// MIME type from the file extension; unknown types go as raw bytes.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md" | "markdown") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        Some("json") => "application/json",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
