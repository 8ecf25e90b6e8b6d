//! Core data models for site verification.

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// A captured geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    /// Serialized as `lng`, the form the portal backend stores.
    #[serde(rename = "lng", alias = "lon")]
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        let point = Self { lat, lon };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(CoordinateError::OutOfRange { lat, lon })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Ordered road geometry between a start and an end point.
///
/// An empty path means no route could be resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePath {
    points: Vec<GeoPoint>,
}

impl RoutePath {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.last()
    }

    /// Total great-circle length of the polyline in meters.
    pub fn length_m(&self) -> f64 {
        crate::spatial::path_length_m(&self.points)
    }
}

impl From<Vec<GeoPoint>> for RoutePath {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self::new(points)
    }
}

/// A point on the route the field user must physically visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionCheckpoint {
    pub id: u32,
    pub location: GeoPoint,
    /// Distance along the route path, in meters, where this checkpoint was placed.
    #[serde(default)]
    pub offset_m: f64,
    #[serde(default)]
    pub verified: bool,
}

impl InspectionCheckpoint {
    pub fn new(id: u32, location: GeoPoint, offset_m: f64) -> Self {
        Self {
            id,
            location,
            offset_m,
            verified: false,
        }
    }
}

/// A resolved path together with the checkpoint batch derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSurvey {
    pub path: RoutePath,
    pub checkpoints: Vec<InspectionCheckpoint>,
}

impl RouteSurvey {
    pub fn verified_count(&self) -> usize {
        self.checkpoints.iter().filter(|c| c.verified).count()
    }
}

/// Proof-of-work artifact captured once the camera is unlocked.
///
/// The core never looks inside `bytes`; it only routes the artifact to the uploader.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl CaptureArtifact {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for CaptureArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureArtifact")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
