use extract::Triplet;
use graph::GraphModel;
use serde::Serialize;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    WarmingUp,
    Idle,
    Submitting,
    Ready,
    Failed,
}

impl Phase {
    /// An extraction call is in flight; submissions are dropped.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::WarmingUp | Self::Submitting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WarmingUp => "warming_up",
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Everything one session holds.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) phase: Phase,
    pub(crate) text: String,
    pub(crate) graph: Option<GraphModel>,
    pub(crate) triplets: Vec<Triplet>,
    pub(crate) last_error: Option<SessionError>,
    /// Whether the render sink has been created yet.
    pub(crate) surface_created: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::WarmingUp,
            text: String::new(),
            graph: None,
            triplets: Vec::new(),
            last_error: None,
            surface_created: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn graph(&self) -> Option<&GraphModel> {
        self.graph.as_ref()
    }

    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn surface_created(&self) -> bool {
        self.surface_created
    }

    pub(crate) fn transition(&mut self, to: Phase) {
        tracing::debug!(from = self.phase.as_str(), to = to.as_str(), "Session transition");
        self.phase = to;
    }

    /// Swap in the result of a successful submission.
    pub(crate) fn apply_ready(&mut self, triplets: Vec<Triplet>, graph: GraphModel) {
        self.triplets = triplets;
        self.graph = Some(graph);
        self.last_error = None;
        self.transition(Phase::Ready);
    }

    /// Keep the previous graph and triplets; only record the error.
    pub(crate) fn apply_failed(&mut self, error: SessionError) {
        self.last_error = Some(error);
        self.transition(Phase::Failed);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
