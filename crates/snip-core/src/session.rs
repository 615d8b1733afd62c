use std::fmt;
use std::time::{Duration, Instant};

use snip_types::{Region, SessionError, SessionId};

use crate::overlay::SelectionOverlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Selecting,
    Capturing,
    Recognizing,
    Writing,
    Finished,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Finished)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Selecting => "selecting",
            SessionState::Capturing => "capturing",
            SessionState::Recognizing => "recognizing",
            SessionState::Writing => "writing",
            SessionState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// One selection → capture → recognize → write run
#[derive(Debug)]
pub struct CaptureSession {
    id: SessionId,
    state: SessionState,
    started_at: Instant,
    step_started_at: Instant,
    pub(crate) overlay: Option<SelectionOverlay>,
    pub region: Option<Region>,
    pub result_text: Option<String>,
    pub error: Option<SessionError>,
}

impl CaptureSession {
    pub fn new(id: SessionId) -> Self {
        let now = Instant::now();
        Self {
            id,
            state: SessionState::Selecting,
            started_at: now,
            step_started_at: now,
            overlay: None,
            region: None,
            result_text: None,
            error: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn overlay(&self) -> Option<&SelectionOverlay> {
        self.overlay.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Move to `next`, logging how long the finished step took
    pub fn advance(&mut self, next: SessionState) {
        let step = self.step_started_at.elapsed();
        tracing::debug!(
            session = %self.id,
            step = %self.state,
            elapsed_ms = step.as_millis() as u64,
            "step finished"
        );
        self.state = next;
        self.step_started_at = Instant::now();
    }

    pub fn is(&self, state: SessionState) -> bool {
        self.state == state
    }
}
