//! Capture uploader that posts proof photos to the portal.

use sahayak_core::{CaptureArtifact, CaptureUploader, UploadError};

use crate::client::{PortalClient, UploadRejected};

/// Uploads verification photos for one project and contractor.
#[derive(Debug, Clone)]
pub struct ProjectImageUploader {
    client: PortalClient,
    project_id: String,
    contractor_id: String,
}

impl ProjectImageUploader {
    pub fn new(
        client: PortalClient,
        project_id: impl Into<String>,
        contractor_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            contractor_id: contractor_id.into(),
        }
    }
}

impl CaptureUploader for ProjectImageUploader {
    async fn upload(&self, artifact: CaptureArtifact) -> Result<(), UploadError> {
        self.client
            .upload_project_image(&self.project_id, &self.contractor_id, artifact)
            .await
            .map(|_| ())
            .map_err(into_upload_error)
    }
}

fn into_upload_error(err: anyhow::Error) -> UploadError {
    match err.downcast_ref::<UploadRejected>() {
        Some(rejected) => UploadError::Rejected {
            status: rejected.status,
            message: rejected.message.clone(),
        },
        None => UploadError::Transport(format!("{:#}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::time::Duration;

    #[test]
    fn rejected_uploads_keep_status() {
        let err = anyhow::Error::new(UploadRejected {
            status: 413,
            message: "too large".to_string(),
        });
        assert_eq!(
            into_upload_error(err),
            UploadError::Rejected {
                status: 413,
                message: "too large".to_string()
            }
        );

        let err = Err::<(), _>(std::io::Error::other("reset"))
            .context("Failed to send proof image")
            .unwrap_err();
        assert_eq!(
            into_upload_error(err),
            UploadError::Transport("Failed to send proof image: reset".to_string())
        );
    }

    #[tokio::test]
    async fn unreachable_portal_fails_upload() {
        let client = PortalClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let uploader = ProjectImageUploader::new(client, "42", "C-1");
        let result = uploader
            .upload(CaptureArtifact::new("site.jpg", "image/jpeg", vec![1, 2, 3]))
            .await;
        assert!(result.is_err());
    }
}
