//! Portal backend HTTP client.

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sahayak_core::CaptureArtifact;
use std::time::Duration;

use crate::projects::{CreatedProject, NewProject, ProjectRecord};

/// Description attached to every proof photo.
pub const VERIFICATION_PHOTO_DESCRIPTION: &str = "Site Verification Photo";

/// Client for the portal's project API.
#[derive(Debug, Clone)]
pub struct PortalClient {
    pub(crate) base_url: String,
    pub(crate) client: Client,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create portal HTTP client")?;
        Ok(Self { base_url, client })
    }

    /// Fetch a project, including its stored route endpoints.
    pub async fn fetch_project(&self, project_id: &str) -> Result<ProjectRecord> {
        let url = format!("{}/projects/{}", self.base_url, project_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to load project {}", project_id))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to load project {}: {}", project_id, response.status());
        }

        let project = response
            .json()
            .await
            .context("Failed to parse project record")?;
        Ok(project)
    }

    /// Create a project on behalf of an official.
    pub async fn create_project(
        &self,
        official_id: &str,
        project: &NewProject,
    ) -> Result<CreatedProject> {
        let url = format!("{}/projects/", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("official_id", official_id)])
            .json(project)
            .send()
            .await
            .context("Failed to create project")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to create project: {}", response.status());
        }

        let created: CreatedProject = response
            .json()
            .await
            .context("Failed to parse created project")?;
        tracing::info!(project_id = %created.id, "Project created");
        Ok(created)
    }

    /// Upload a proof photo for a project as the given contractor.
    ///
    /// Returns the HTTP status on success.
    pub async fn upload_project_image(
        &self,
        project_id: &str,
        contractor_id: &str,
        artifact: CaptureArtifact,
    ) -> Result<u16> {
        let url = format!("{}/projects/{}/upload-image", self.base_url, project_id);
        let CaptureArtifact {
            file_name,
            content_type,
            bytes,
        } = artifact;
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&content_type)
            .with_context(|| format!("Invalid content type {}", content_type))?;
        let form = Form::new()
            .part("file", part)
            .text("description", VERIFICATION_PHOTO_DESCRIPTION);

        let response = self
            .client
            .post(&url)
            .query(&[("contractor_id", contractor_id)])
            .multipart(form)
            .send()
            .await
            .context("Failed to send proof image")?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            anyhow::bail!(UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(project_id, bytes = size, "Proof image uploaded");
        Ok(status.as_u16())
    }
}

/// Non-success answer from the upload endpoint.
#[derive(Debug, Clone, thiserror::Error)]
#[error("upload rejected with HTTP {status}: {message}")]
pub struct UploadRejected {
    pub status: u16,
    pub message: String,
}
