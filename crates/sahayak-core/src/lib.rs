pub mod checkpoints;
pub mod collaborators;
pub mod driver;
pub mod error;
pub mod models;
pub mod proximity;
pub mod rules;
pub mod session;
pub mod spatial;

pub use checkpoints::generate_checkpoints;
pub use collaborators::{
    CaptureUploader, Detached, GeometryProvider, LocationSource, RouteAuthoringSink,
};
pub use driver::SessionDriver;
pub use error::{
    CheckpointError, CoordinateError, GeometryError, LocationError, RulesError, UploadError,
    VerificationError,
};
pub use models::{CaptureArtifact, GeoPoint, InspectionCheckpoint, RoutePath, RouteSurvey};
pub use proximity::{check_proximity, ProximityOutcome};
pub use rules::{VerificationRules, DEFAULT_CHECKPOINT_COUNT, DEFAULT_TOLERANCE_M};
pub use session::{
    SessionEffect, SessionEvent, SessionMode, SessionState, Ticket, VerificationSession,
};
pub use spatial::haversine_distance;
