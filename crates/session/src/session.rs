use extract::{
    ExtractionError, ExtractionOutcome, ExtractionParameters, ParameterScheduler, Triplet,
    TripletExtractor,
};
use graph::{ExportError, GraphModel, RenderSink, build_graph};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::metrics::{MetricsSnapshot, SessionMetrics};
use crate::state::{Phase, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sent once at start-up; the answer is thrown away.
    pub warm_up_text: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warm_up_text: "Warm-up request.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitAck {
    Accepted(ExtractionParameters),
    /// A call was already in flight; nothing was queued.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    WarmedUp,
    Ready {
        triplets: usize,
        nodes: usize,
        edges: usize,
    },
    Failed(SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    WarmUp,
    Submission,
}

struct Pending {
    kind: PendingKind,
    handle: JoinHandle<Result<ExtractionOutcome, ExtractionError>>,
    fingerprint: String,
    started: Instant,
}

/// Drives one user's extraction session.
///
/// At most one extraction call is outstanding at any time. Calls are never
/// cancelled; each result is applied to whatever the state is when it
/// arrives.
pub struct Session {
    id: Uuid,
    state: SessionState,
    extractor: Arc<dyn TripletExtractor>,
    sink: Box<dyn RenderSink>,
    scheduler: ParameterScheduler,
    metrics: SessionMetrics,
    pending: Option<Pending>,
}

impl Session {
    /// Create the session and fire the warm-up call. Needs a tokio runtime.
    pub fn start(
        extractor: Arc<dyn TripletExtractor>,
        sink: Box<dyn RenderSink>,
        scheduler: ParameterScheduler,
        config: &SessionConfig,
    ) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            state: SessionState::new(),
            extractor,
            sink,
            scheduler,
            metrics: SessionMetrics::new(),
            pending: None,
        };

        let params = session.scheduler.warm_up();
        session.spawn(PendingKind::WarmUp, config.warm_up_text.clone(), params);
        info!(session_id = %session.id, "Session started, warming up extraction service");

        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn graph(&self) -> Option<&GraphModel> {
        self.state.graph.as_ref()
    }

    pub fn triplets(&self) -> &[Triplet] {
        &self.state.triplets
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.state.last_error.as_ref()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_submit(&self) -> bool {
        !self.state.phase.is_busy() && !self.state.text.trim().is_empty()
    }

    pub fn can_export(&self) -> bool {
        !self.state.triplets.is_empty()
    }

    /// Editing is allowed in every phase and never changes it.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.text = text.into();
    }

    pub fn submit(&mut self) -> Result<SubmitAck, SessionError> {
        if self.state.phase.is_busy() {
            self.metrics.record_ignored();
            debug!(
                session_id = %self.id,
                phase = self.state.phase.as_str(),
                "Submission ignored, extraction already in flight"
            );
            return Ok(SubmitAck::Ignored);
        }

        if self.state.text.trim().is_empty() {
            self.metrics.record_validation_rejection();
            self.state.last_error = Some(SessionError::Validation);
            return Err(SessionError::Validation);
        }

        let params = self.scheduler.compute(&self.state.text);
        self.metrics.record_accepted();
        self.state.transition(Phase::Submitting);
        self.spawn(PendingKind::Submission, self.state.text.clone(), params);

        info!(
            session_id = %self.id,
            chars = self.state.text.chars().count(),
            num_beams = params.beam_count,
            length_penalty = params.length_penalty,
            num_return_sequences = params.sequence_count,
            "Submitted text for extraction"
        );

        Ok(SubmitAck::Accepted(params))
    }

    /// Wait for the in-flight call and apply its result.
    ///
    /// Returns `None` when nothing is in flight. Cancel safe: dropping the
    /// future leaves the call pending.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let pending = self.pending.as_mut()?;
        let joined = (&mut pending.handle).await;
        let pending = self.pending.take()?;

        let result = joined.unwrap_or_else(|e| {
            Err(ExtractionError::RequestConstruction(format!(
                "extraction task failed: {}",
                e
            )))
        });

        let event = match pending.kind {
            PendingKind::WarmUp => self.finish_warm_up(result),
            PendingKind::Submission => self.finish_submission(result, &pending),
        };
        Some(event)
    }

    /// Drive events until no call is in flight; returns the last one.
    pub async fn wait_ready(&mut self) -> Option<SessionEvent> {
        let mut last = None;
        while let Some(event) = self.next_event().await {
            last = Some(event);
        }
        last
    }

    pub fn export_triplets(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = graph::export_triplets(&self.state.triplets, dir)?;
        info!(
            session_id = %self.id,
            path = %path.display(),
            triplets = self.state.triplets.len(),
            "Exported triplets"
        );
        Ok(path)
    }

    fn spawn(&mut self, kind: PendingKind, text: String, params: ExtractionParameters) {
        let extractor = Arc::clone(&self.extractor);
        let fingerprint = text_fingerprint(&text);
        let handle = tokio::spawn(async move { extractor.extract(&text, &params).await });

        self.pending = Some(Pending {
            kind,
            handle,
            fingerprint,
            started: Instant::now(),
        });
    }

    fn finish_warm_up(
        &mut self,
        result: Result<ExtractionOutcome, ExtractionError>,
    ) -> SessionEvent {
        match result {
            Ok(_) => debug!(session_id = %self.id, "Warm-up extraction finished"),
            Err(e) => warn!(session_id = %self.id, error = %e, "Warm-up extraction failed"),
        }
        self.state.transition(Phase::Idle);
        SessionEvent::WarmedUp
    }

    fn finish_submission(
        &mut self,
        result: Result<ExtractionOutcome, ExtractionError>,
        pending: &Pending,
    ) -> SessionEvent {
        let elapsed = pending.started.elapsed();

        // TODO: discard responses for edited text once submissions carry a generation id
        if text_fingerprint(&self.state.text) != pending.fingerprint {
            debug!(
                session_id = %self.id,
                submitted = %pending.fingerprint,
                "Applying extraction result for text that has since been edited"
            );
        }

        match result {
            Ok(outcome) => {
                self.metrics.record_extract(elapsed, true, outcome.len());

                let triplets = match outcome {
                    ExtractionOutcome::Triplets(triplets) => triplets,
                    ExtractionOutcome::Empty => Vec::new(),
                };
                let model = build_graph(&triplets);
                self.show(&model);

                let event = SessionEvent::Ready {
                    triplets: triplets.len(),
                    nodes: model.node_count(),
                    edges: model.edge_count(),
                };
                info!(
                    session_id = %self.id,
                    triplets = triplets.len(),
                    nodes = model.node_count(),
                    edges = model.edge_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Extraction finished"
                );

                self.state.apply_ready(triplets, model);
                event
            }
            Err(e) => {
                self.metrics.record_extract(elapsed, false, 0);
                warn!(
                    session_id = %self.id,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Extraction failed"
                );

                let error = SessionError::from(e);
                self.state.apply_failed(error.clone());
                SessionEvent::Failed(error)
            }
        }
    }

    /// First model creates the surface, later ones replace its data.
    /// An empty model only clears a surface that already exists.
    fn show(&mut self, model: &GraphModel) {
        if self.state.surface_created {
            if let Err(e) = self.sink.replace(model) {
                warn!(session_id = %self.id, error = %e, "Failed to update graph view");
            }
        } else if !model.is_empty() {
            match self.sink.create(model) {
                Ok(()) => self.state.surface_created = true,
                Err(e) => warn!(session_id = %self.id, error = %e, "Failed to create graph view"),
            }
        }
    }
}

/// Short stable id for a piece of text, used in logs.
pub fn text_fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}
