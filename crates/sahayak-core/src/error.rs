//! Failure taxonomy for site verification.

use thiserror::Error;

/// Failures from the geometry (routing) provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// No road connects the two points. The user should pick different points.
    #[error("no route between the selected points: {0}")]
    RouteUnavailable(String),
    /// The routing service could not be reached or answered garbage. Retryable.
    #[error("routing service unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckpointError {
    #[error("route path has zero length ({vertices} vertices)")]
    DegeneratePath { vertices: usize },
}

/// Failures from the live-location source. Never treated as a proximity miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("upload failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate out of range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RulesError {
    #[error("tolerance must be a positive finite number of meters, got {0}")]
    InvalidTolerance(f64),
    #[error("checkpoint count must be at least 1")]
    NoCheckpoints,
}

/// Umbrella error covering every failure the verification flow can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

impl VerificationError {
    /// Whether repeating the same user action may succeed without changing inputs.
    pub fn is_retryable(&self) -> bool {
        match self {
            VerificationError::Geometry(GeometryError::Transport(_)) => true,
            // A missing road is fixed by choosing other points, but re-clicking is the retry.
            VerificationError::Geometry(GeometryError::RouteUnavailable(_)) => true,
            VerificationError::Location(_) => true,
            VerificationError::Upload(_) => true,
            VerificationError::Checkpoint(_) => false,
            VerificationError::Coordinate(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_degenerate_and_range_errors_are_final() {
        let retryable: Vec<VerificationError> = vec![
            GeometryError::Transport("timeout".into()).into(),
            GeometryError::RouteUnavailable("NoRoute".into()).into(),
            LocationError::PermissionDenied.into(),
            UploadError::Transport("reset".into()).into(),
        ];
        assert!(retryable.iter().all(VerificationError::is_retryable));

        let degenerate: VerificationError = CheckpointError::DegeneratePath { vertices: 1 }.into();
        assert!(!degenerate.is_retryable());
        let range: VerificationError = CoordinateError::OutOfRange { lat: 99.0, lon: 0.0 }.into();
        assert!(!range.is_retryable());
    }
}
