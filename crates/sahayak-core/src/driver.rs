//! Async driver that runs session effects against real collaborators.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::collaborators::{CaptureUploader, GeometryProvider, LocationSource, RouteAuthoringSink};
use crate::error::{GeometryError, LocationError, UploadError};
use crate::session::{SessionEffect, SessionEvent, Ticket, VerificationSession};

/// Owns a session and its collaborators.
///
/// Route resolution, location fixes and uploads each run as a tokio task. A
/// newer request of the same kind aborts the older task; if a stale result
/// still arrives the session discards it by ticket. A task that panics is
/// reported to the session as a failed request. Must be used inside a tokio
/// runtime.
pub struct SessionDriver<G, L, U, A, R = StdRng> {
    session: VerificationSession<R>,
    geometry: Arc<G>,
    location: Arc<L>,
    uploader: Arc<U>,
    authoring: A,
    route_task: Option<Pending>,
    probe_task: Option<Pending>,
    upload_task: Option<Pending>,
}

/// Which request a spawned task answers.
#[derive(Debug, Clone, Copy)]
enum TaskKind {
    Route(Ticket),
    Probe(Ticket),
    Upload,
}

struct Pending {
    kind: TaskKind,
    task: JoinHandle<SessionEvent>,
}

impl Pending {
    /// Completion to apply when the task died without producing one.
    fn failed(&self, err: &JoinError) -> SessionEvent {
        let reason = format!("task failed: {}", err);
        match self.kind {
            TaskKind::Route(ticket) => SessionEvent::RouteResolved {
                ticket,
                result: Err(GeometryError::Transport(reason)),
            },
            TaskKind::Probe(ticket) => SessionEvent::LocationReported {
                ticket,
                result: Err(LocationError::Unavailable(reason)),
            },
            TaskKind::Upload => SessionEvent::UploadFinished(Err(UploadError::Transport(reason))),
        }
    }
}

enum Step {
    Event(SessionEvent),
    Closed,
}

impl<G, L, U, A, R> SessionDriver<G, L, U, A, R>
where
    G: GeometryProvider + 'static,
    L: LocationSource + 'static,
    U: CaptureUploader + 'static,
    A: RouteAuthoringSink,
    R: Rng,
{
    /// Wrap a session and run its entry effects.
    ///
    /// A verifying session starts resolving its route here.
    pub fn new(
        session: VerificationSession<R>,
        geometry: Arc<G>,
        location: Arc<L>,
        uploader: Arc<U>,
        authoring: A,
    ) -> Self {
        let mut driver = Self {
            session,
            geometry,
            location,
            uploader,
            authoring,
            route_task: None,
            probe_task: None,
            upload_task: None,
        };
        for effect in driver.session.start() {
            driver.execute(effect);
        }
        driver
    }

    pub fn session(&self) -> &VerificationSession<R> {
        &self.session
    }

    pub fn authoring(&self) -> &A {
        &self.authoring
    }

    /// Apply an event and start whatever work it asks for.
    pub fn dispatch(&mut self, event: SessionEvent) {
        for effect in self.session.apply(event) {
            self.execute(effect);
        }
        tracing::debug!(
            state = self.session.state().name(),
            status = self.session.status_message(),
            "Session updated"
        );
    }

    fn execute(&mut self, effect: SessionEffect) {
        match effect {
            SessionEffect::ResolveRoute { ticket, start, end } => {
                let geometry = Arc::clone(&self.geometry);
                replace_task(
                    &mut self.route_task,
                    TaskKind::Route(ticket),
                    tokio::spawn(async move {
                        let result = geometry.resolve_path(start, end).await;
                        SessionEvent::RouteResolved { ticket, result }
                    }),
                );
            }
            SessionEffect::AcquireLocation { ticket } => {
                let location = Arc::clone(&self.location);
                replace_task(
                    &mut self.probe_task,
                    TaskKind::Probe(ticket),
                    tokio::spawn(async move {
                        let result = location.current_location().await;
                        SessionEvent::LocationReported { ticket, result }
                    }),
                );
            }
            SessionEffect::UploadCapture { artifact } => {
                let uploader = Arc::clone(&self.uploader);
                replace_task(
                    &mut self.upload_task,
                    TaskKind::Upload,
                    tokio::spawn(async move {
                        SessionEvent::UploadFinished(uploader.upload(artifact).await)
                    }),
                );
            }
            SessionEffect::NotifyRouteAuthored { start, end } => {
                tracing::info!(?start, ?end, "Route authored");
                self.authoring.route_selected(start, end);
            }
        }
    }

    /// Wait for every in-flight task and apply its completion.
    pub async fn settle(&mut self) {
        loop {
            let pending = self
                .route_task
                .take()
                .or_else(|| self.probe_task.take())
                .or_else(|| self.upload_task.take());
            let Some(mut pending) = pending else {
                break;
            };
            if let Some(event) = finish(&mut pending).await {
                self.dispatch(event);
            }
        }
    }

    /// Drive the session from a stream of user actions until the sender closes.
    ///
    /// Completions are applied as they arrive, interleaved with new actions.
    pub async fn run(mut self, mut actions: mpsc::Receiver<SessionEvent>) -> Self {
        loop {
            let step = tokio::select! {
                action = actions.recv() => match action {
                    Some(event) => Step::Event(event),
                    None => Step::Closed,
                },
                Some(event) = join_task(&mut self.route_task) => Step::Event(event),
                Some(event) = join_task(&mut self.probe_task) => Step::Event(event),
                Some(event) = join_task(&mut self.upload_task) => Step::Event(event),
            };
            match step {
                Step::Event(event) => self.dispatch(event),
                Step::Closed => break,
            }
        }
        self.settle().await;
        self
    }
}

fn replace_task(slot: &mut Option<Pending>, kind: TaskKind, task: JoinHandle<SessionEvent>) {
    if let Some(previous) = slot.replace(Pending { kind, task }) {
        previous.task.abort();
    }
}

async fn finish(pending: &mut Pending) -> Option<SessionEvent> {
    match (&mut pending.task).await {
        Ok(event) => Some(event),
        Err(err) if err.is_cancelled() => None,
        Err(err) => {
            tracing::error!(kind = ?pending.kind, "Session task panicked: {}", err);
            Some(pending.failed(&err))
        }
    }
}

async fn join_task(slot: &mut Option<Pending>) -> Option<SessionEvent> {
    let Some(pending) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let event = finish(pending).await;
    *slot = None;
    event
}
