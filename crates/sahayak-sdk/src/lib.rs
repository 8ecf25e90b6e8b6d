//! Sahayak SDK - portal backend integration
//!
//! Fetches project records, creates projects with authored routes and uploads
//! site verification photos.

pub mod client;
pub mod projects;
pub mod upload;

pub use client::{PortalClient, UploadRejected, VERIFICATION_PHOTO_DESCRIPTION};
pub use projects::{
    CreatedProject, NewProject, ProjectId, ProjectImage, ProjectRecord, ProjectRouteError,
};
pub use upload::ProjectImageUploader;
