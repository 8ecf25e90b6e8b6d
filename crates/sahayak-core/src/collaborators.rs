//! Seams to the outside world: routing, device location, uploads and authoring.

use std::future::Future;

use crate::error::{GeometryError, LocationError, UploadError};
use crate::models::{CaptureArtifact, GeoPoint, RoutePath};

/// Resolves the road geometry connecting two points.
pub trait GeometryProvider: Send + Sync {
    fn resolve_path(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> impl Future<Output = Result<RoutePath, GeometryError>> + Send;
}

/// Supplies a single live position fix on request.
pub trait LocationSource: Send + Sync {
    fn current_location(&self) -> impl Future<Output = Result<GeoPoint, LocationError>> + Send;
}

/// Receives the proof artifact once capture is unlocked.
pub trait CaptureUploader: Send + Sync {
    fn upload(
        &self,
        artifact: CaptureArtifact,
    ) -> impl Future<Output = Result<(), UploadError>> + Send;
}

/// Told about the chosen start/end pair once a route has been authored.
pub trait RouteAuthoringSink {
    fn route_selected(&mut self, start: GeoPoint, end: GeoPoint);
}

impl RouteAuthoringSink for () {
    fn route_selected(&mut self, _start: GeoPoint, _end: GeoPoint) {}
}

/// Placeholder for collaborators a session mode never calls.
///
/// Authoring sessions never probe location or upload; verifying sessions
/// never author.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl LocationSource for Detached {
    async fn current_location(&self) -> Result<GeoPoint, LocationError> {
        Err(LocationError::Unavailable(
            "no location source attached".to_string(),
        ))
    }
}

impl CaptureUploader for Detached {
    async fn upload(&self, _artifact: CaptureArtifact) -> Result<(), UploadError> {
        Err(UploadError::Transport("no uploader attached".to_string()))
    }
}
