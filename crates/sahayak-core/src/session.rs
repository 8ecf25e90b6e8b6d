//! Verification session state machine.
//!
//! One [`VerificationSession`] backs one open verification view. All changes go
//! through [`VerificationSession::apply`], which returns the side effects the
//! caller must run (route resolution, location fixes, uploads, authoring
//! notifications). Long-latency effects carry a [`Ticket`]; a completion whose
//! ticket is no longer current is dropped, so the latest request always wins.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::checkpoints::generate_checkpoints;
use crate::error::{GeometryError, LocationError, UploadError, VerificationError};
use crate::models::{CaptureArtifact, GeoPoint, RoutePath, RouteSurvey};
use crate::proximity::check_proximity;
use crate::rules::VerificationRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// An official picks start and end points on the map.
    Authoring,
    /// A contractor proves presence along an existing project route.
    Verifying,
}

/// Identifies one outstanding long-latency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Authoring: the next click sets the start point.
    AwaitingStart,
    /// Authoring: start chosen, the next click proposes the end point.
    AwaitingEnd { start: GeoPoint },
    /// Verifying: stored endpoints known, path not resolved yet.
    LoadingRoute { start: GeoPoint, end: GeoPoint },
    PathReady {
        start: GeoPoint,
        end: GeoPoint,
        survey: RouteSurvey,
    },
    CaptureUnlocked {
        start: GeoPoint,
        end: GeoPoint,
        survey: RouteSurvey,
        /// Checkpoints matched by any probe so far; never empty.
        matched: Vec<u32>,
    },
    /// Proof uploaded. Terminal for this session.
    Reported {
        start: GeoPoint,
        end: GeoPoint,
        survey: RouteSurvey,
        reported_at: DateTime<Utc>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::AwaitingStart => "awaiting_start",
            SessionState::AwaitingEnd { .. } => "awaiting_end",
            SessionState::LoadingRoute { .. } => "loading_route",
            SessionState::PathReady { .. } => "path_ready",
            SessionState::CaptureUnlocked { .. } => "capture_unlocked",
            SessionState::Reported { .. } => "reported",
        }
    }
}

/// Inputs to the state machine: user actions and collaborator completions.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    MapClicked(GeoPoint),
    /// Load (or reload after a failure) the stored route in verifying mode.
    RouteRequested,
    RouteResolved {
        ticket: Ticket,
        result: Result<RoutePath, GeometryError>,
    },
    LocationRequested,
    LocationReported {
        ticket: Ticket,
        result: Result<GeoPoint, LocationError>,
    },
    CaptureSubmitted(CaptureArtifact),
    UploadFinished(Result<(), UploadError>),
}

/// Work the session asks its driver to perform.
#[derive(Debug, Clone)]
pub enum SessionEffect {
    ResolveRoute {
        ticket: Ticket,
        start: GeoPoint,
        end: GeoPoint,
    },
    AcquireLocation { ticket: Ticket },
    UploadCapture { artifact: CaptureArtifact },
    NotifyRouteAuthored { start: GeoPoint, end: GeoPoint },
}

#[derive(Debug, Clone, Copy)]
struct RouteRequest {
    ticket: Ticket,
    start: GeoPoint,
    end: GeoPoint,
}

pub struct VerificationSession<R = StdRng> {
    mode: SessionMode,
    state: SessionState,
    rules: VerificationRules,
    live_location: Option<GeoPoint>,
    status_message: String,
    next_ticket: u64,
    route_request: Option<RouteRequest>,
    probe_request: Option<Ticket>,
    upload_in_flight: bool,
    rng: R,
}

impl VerificationSession<StdRng> {
    /// Start an authoring session waiting for the start point.
    pub fn authoring(rules: VerificationRules) -> Self {
        Self::authoring_with_rng(rules, StdRng::from_os_rng())
    }

    /// Start a verifying session for a project's stored endpoints.
    ///
    /// [`VerificationSession::start`] issues the route resolution;
    /// [`SessionEvent::RouteRequested`] retries it after a failure.
    pub fn verifying(start: GeoPoint, end: GeoPoint, rules: VerificationRules) -> Self {
        Self::verifying_with_rng(start, end, rules, StdRng::from_os_rng())
    }

    /// Start a verifying session from a survey generated earlier.
    ///
    /// Checkpoints already marked verified keep capture unlocked.
    pub fn from_survey(
        start: GeoPoint,
        end: GeoPoint,
        survey: RouteSurvey,
        rules: VerificationRules,
    ) -> Self {
        let mut session = Self::verifying(start, end, rules);
        let matched: Vec<u32> = survey
            .checkpoints
            .iter()
            .filter(|c| c.verified)
            .map(|c| c.id)
            .collect();
        if matched.is_empty() {
            session.state = SessionState::PathReady { start, end, survey };
            session.status_message =
                "Route loaded. Check your location at an inspection point.".to_string();
        } else {
            session.state = SessionState::CaptureUnlocked {
                start,
                end,
                survey,
                matched,
            };
            session.status_message = "Location verified! Camera unlocked.".to_string();
        }
        session
    }
}

impl<R: Rng> VerificationSession<R> {
    pub fn authoring_with_rng(rules: VerificationRules, rng: R) -> Self {
        Self::with_parts(
            SessionMode::Authoring,
            SessionState::AwaitingStart,
            rules,
            "Click map to set start point.",
            rng,
        )
    }

    pub fn verifying_with_rng(
        start: GeoPoint,
        end: GeoPoint,
        rules: VerificationRules,
        rng: R,
    ) -> Self {
        Self::with_parts(
            SessionMode::Verifying,
            SessionState::LoadingRoute { start, end },
            rules,
            "Loading project route...",
            rng,
        )
    }

    fn with_parts(
        mode: SessionMode,
        state: SessionState,
        rules: VerificationRules,
        status: &str,
        rng: R,
    ) -> Self {
        Self {
            mode,
            state,
            rules,
            live_location: None,
            status_message: status.to_string(),
            next_ticket: 0,
            route_request: None,
            probe_request: None,
            upload_in_flight: false,
            rng,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn rules(&self) -> &VerificationRules {
        &self.rules
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn live_location(&self) -> Option<GeoPoint> {
        self.live_location
    }

    pub fn start_point(&self) -> Option<GeoPoint> {
        match &self.state {
            SessionState::AwaitingStart => None,
            SessionState::AwaitingEnd { start }
            | SessionState::LoadingRoute { start, .. }
            | SessionState::PathReady { start, .. }
            | SessionState::CaptureUnlocked { start, .. }
            | SessionState::Reported { start, .. } => Some(*start),
        }
    }

    /// Committed end point. A pending, unresolved click is not committed.
    pub fn end_point(&self) -> Option<GeoPoint> {
        match &self.state {
            SessionState::AwaitingStart | SessionState::AwaitingEnd { .. } => None,
            SessionState::LoadingRoute { end, .. }
            | SessionState::PathReady { end, .. }
            | SessionState::CaptureUnlocked { end, .. }
            | SessionState::Reported { end, .. } => Some(*end),
        }
    }

    pub fn survey(&self) -> Option<&RouteSurvey> {
        match &self.state {
            SessionState::PathReady { survey, .. }
            | SessionState::CaptureUnlocked { survey, .. }
            | SessionState::Reported { survey, .. } => Some(survey),
            _ => None,
        }
    }

    pub fn capture_unlocked(&self) -> bool {
        matches!(self.state, SessionState::CaptureUnlocked { .. })
    }

    pub fn route_pending(&self) -> bool {
        self.route_request.is_some()
    }

    pub fn probe_pending(&self) -> bool {
        self.probe_request.is_some()
    }

    /// Effects to run when the view opens.
    ///
    /// A verifying session resolves its stored route straight away. Calling
    /// this again while that request is pending, or in any other state, does
    /// nothing.
    pub fn start(&mut self) -> Vec<SessionEffect> {
        match &self.state {
            SessionState::LoadingRoute { start, end } if self.route_request.is_none() => {
                let (start, end) = (*start, *end);
                self.request_route(start, end)
            }
            _ => Vec::new(),
        }
    }

    /// Apply one event and return the effects to run.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        match event {
            SessionEvent::MapClicked(point) => self.on_map_click(point),
            SessionEvent::RouteRequested => self.on_route_requested(),
            SessionEvent::RouteResolved { ticket, result } => {
                self.on_route_resolved(ticket, result)
            }
            SessionEvent::LocationRequested => self.on_location_requested(),
            SessionEvent::LocationReported { ticket, result } => {
                self.on_location_reported(ticket, result);
                Vec::new()
            }
            SessionEvent::CaptureSubmitted(artifact) => self.on_capture_submitted(artifact),
            SessionEvent::UploadFinished(result) => {
                self.on_upload_finished(result);
                Vec::new()
            }
        }
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn request_route(&mut self, start: GeoPoint, end: GeoPoint) -> Vec<SessionEffect> {
        let ticket = self.issue_ticket();
        if let Some(previous) = self.route_request.replace(RouteRequest { ticket, start, end }) {
            tracing::debug!(superseded = ?previous.ticket, "Superseding pending route request");
        }
        vec![SessionEffect::ResolveRoute { ticket, start, end }]
    }

    fn on_map_click(&mut self, point: GeoPoint) -> Vec<SessionEffect> {
        if self.mode != SessionMode::Authoring {
            tracing::debug!("Ignoring map click outside authoring mode");
            return Vec::new();
        }
        if let Err(err) = GeoPoint::try_new(point.lat, point.lon) {
            self.fail(err.into());
            return Vec::new();
        }

        match &self.state {
            SessionState::AwaitingStart => {
                self.state = SessionState::AwaitingEnd { start: point };
                self.status_message = "Start set. Click end point.".to_string();
                Vec::new()
            }
            SessionState::AwaitingEnd { start } => {
                let start = *start;
                self.status_message = "Resolving route...".to_string();
                self.request_route(start, point)
            }
            SessionState::PathReady { .. } => {
                tracing::info!("Re-authoring route from a new start point");
                self.route_request = None;
                self.state = SessionState::AwaitingEnd { start: point };
                self.status_message = "Route cleared. Start set, click end point.".to_string();
                Vec::new()
            }
            SessionState::LoadingRoute { .. }
            | SessionState::CaptureUnlocked { .. }
            | SessionState::Reported { .. } => Vec::new(),
        }
    }

    fn on_route_requested(&mut self) -> Vec<SessionEffect> {
        if self.route_request.is_some() {
            tracing::debug!("Route resolution already in flight");
            return Vec::new();
        }
        match &self.state {
            SessionState::LoadingRoute { start, end } => {
                let (start, end) = (*start, *end);
                self.status_message = "Loading project route...".to_string();
                self.request_route(start, end)
            }
            _ => {
                tracing::debug!(state = self.state.name(), "Route already settled");
                Vec::new()
            }
        }
    }

    fn on_route_resolved(
        &mut self,
        ticket: Ticket,
        result: Result<RoutePath, GeometryError>,
    ) -> Vec<SessionEffect> {
        let request = match self.route_request {
            Some(request) if request.ticket == ticket => request,
            _ => {
                tracing::debug!(?ticket, "Dropping stale route resolution");
                return Vec::new();
            }
        };
        self.route_request = None;

        let path = match result {
            Ok(path) if path.is_empty() => {
                self.fail(
                    GeometryError::RouteUnavailable(
                        "routing service returned an empty path".to_string(),
                    )
                    .into(),
                );
                return Vec::new();
            }
            Ok(path) => path,
            Err(err) => {
                self.fail(err.into());
                return Vec::new();
            }
        };

        let checkpoints =
            match generate_checkpoints(&path, self.rules.checkpoint_count, &mut self.rng) {
                Ok(checkpoints) => checkpoints,
                Err(err) => {
                    self.fail(err.into());
                    return Vec::new();
                }
            };

        let RouteRequest { start, end, .. } = request;
        let count = checkpoints.len();
        self.state = SessionState::PathReady {
            start,
            end,
            survey: RouteSurvey { path, checkpoints },
        };
        tracing::info!(mode = ?self.mode, checkpoints = count, "Route ready");

        match self.mode {
            SessionMode::Authoring => {
                self.status_message =
                    format!("End set. Route generated with {} inspection points.", count);
                vec![SessionEffect::NotifyRouteAuthored { start, end }]
            }
            SessionMode::Verifying => {
                self.status_message =
                    "Route loaded. Check your location at an inspection point.".to_string();
                Vec::new()
            }
        }
    }

    /// Log a failed step and tell the user what to do next.
    ///
    /// Retryable failures get a hint to repeat the same action; the rest ask
    /// for different points.
    fn fail(&mut self, err: VerificationError) {
        let retryable = err.is_retryable();
        tracing::warn!(state = self.state.name(), retryable, "Verification step failed: {}", err);

        let summary = match &err {
            VerificationError::Geometry(GeometryError::RouteUnavailable(_)) => match self.mode {
                SessionMode::Authoring => "No road found between these points.".to_string(),
                SessionMode::Verifying => "No road found for this project's route.".to_string(),
            },
            VerificationError::Geometry(GeometryError::Transport(_)) => {
                "Routing service unavailable.".to_string()
            }
            VerificationError::Location(err) => format!("Could not get your location ({}).", err),
            VerificationError::Upload(err) => format!("Upload failed ({}).", err),
            VerificationError::Checkpoint(err) => format!("{}.", capitalize(&err.to_string())),
            VerificationError::Coordinate(err) => format!("{}.", capitalize(&err.to_string())),
        };
        let next_step = if retryable {
            match (&err, self.mode) {
                (
                    VerificationError::Geometry(GeometryError::RouteUnavailable(_)),
                    SessionMode::Authoring,
                ) => "Click a different end point.",
                (VerificationError::Geometry(_), SessionMode::Authoring) => {
                    "Click the end point again to retry."
                }
                (VerificationError::Geometry(_), SessionMode::Verifying) => {
                    "Reload the route to retry."
                }
                (VerificationError::Upload(_), _) => "You can retry.",
                _ => "Try again.",
            }
        } else {
            "Select different points on the map."
        };
        self.status_message = format!("{} {}", summary, next_step);
    }

    fn on_location_requested(&mut self) -> Vec<SessionEffect> {
        if self.mode != SessionMode::Verifying {
            tracing::debug!("Ignoring location probe outside verifying mode");
            return Vec::new();
        }
        match self.state {
            SessionState::PathReady { .. } | SessionState::CaptureUnlocked { .. } => {
                let ticket = self.issue_ticket();
                if let Some(previous) = self.probe_request.replace(ticket) {
                    tracing::debug!(superseded = ?previous, "Superseding pending location probe");
                }
                self.status_message = "Checking your location...".to_string();
                vec![SessionEffect::AcquireLocation { ticket }]
            }
            SessionState::Reported { .. } => {
                self.status_message = "Proof already uploaded for this visit.".to_string();
                Vec::new()
            }
            _ => {
                self.status_message = "Route not loaded yet.".to_string();
                Vec::new()
            }
        }
    }

    fn on_location_reported(&mut self, ticket: Ticket, result: Result<GeoPoint, LocationError>) {
        if self.probe_request != Some(ticket) {
            tracing::debug!(?ticket, "Dropping stale location fix");
            return;
        }
        self.probe_request = None;

        let live = match result {
            Ok(live) => live,
            Err(err) => {
                self.fail(err.into());
                return;
            }
        };
        self.live_location = Some(live);

        let tolerance_m = self.rules.tolerance_m;
        let state = std::mem::replace(&mut self.state, SessionState::AwaitingStart);
        let (start, end, mut survey, mut matched) = match state {
            SessionState::PathReady { start, end, survey } => (start, end, survey, Vec::new()),
            SessionState::CaptureUnlocked {
                start,
                end,
                survey,
                matched,
            } => (start, end, survey, matched),
            other => {
                self.state = other;
                return;
            }
        };

        let outcome = check_proximity(&live, &survey.checkpoints, tolerance_m);
        if outcome.is_match() {
            survey.checkpoints = outcome.checkpoints;
            for id in outcome.matched_ids {
                if !matched.contains(&id) {
                    matched.push(id);
                }
            }
            matched.sort_unstable();
            tracing::info!(
                checkpoint = ?outcome.matched_checkpoint_id,
                verified = survey.verified_count(),
                "Location verified"
            );
            self.status_message = "Location verified! Camera unlocked.".to_string();
        } else {
            tracing::info!(
                nearest_m = ?outcome.nearest_distance_m,
                tolerance_m,
                "Location not near any checkpoint"
            );
            self.status_message = format!(
                "Not near any inspection point (must be within {}m).",
                tolerance_m
            );
        }

        self.state = if matched.is_empty() {
            SessionState::PathReady { start, end, survey }
        } else {
            SessionState::CaptureUnlocked {
                start,
                end,
                survey,
                matched,
            }
        };
    }

    fn on_capture_submitted(&mut self, artifact: CaptureArtifact) -> Vec<SessionEffect> {
        if !self.capture_unlocked() {
            self.status_message = match self.state {
                SessionState::Reported { .. } => {
                    "Proof already uploaded for this visit.".to_string()
                }
                _ => "Camera locked. Verify your location at an inspection point first."
                    .to_string(),
            };
            return Vec::new();
        }
        if self.upload_in_flight {
            tracing::debug!("Upload already in flight");
            return Vec::new();
        }
        self.upload_in_flight = true;
        self.status_message = "Uploading proof...".to_string();
        vec![SessionEffect::UploadCapture { artifact }]
    }

    fn on_upload_finished(&mut self, result: Result<(), UploadError>) {
        if !self.upload_in_flight {
            tracing::debug!("Dropping unexpected upload completion");
            return;
        }
        self.upload_in_flight = false;

        if let Err(err) = result {
            self.fail(err.into());
            return;
        }

        let state = std::mem::replace(&mut self.state, SessionState::AwaitingStart);
        self.state = match state {
            SessionState::CaptureUnlocked {
                start, end, survey, ..
            } => {
                tracing::info!("Proof uploaded");
                self.status_message = "Image uploaded successfully!".to_string();
                SessionState::Reported {
                    start,
                    end,
                    survey,
                    reported_at: Utc::now(),
                }
            }
            other => other,
        };
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
