//! Single-flight capture sessions.
//!
//! The coordinator owns the current [`CaptureSession`], its overlay and the
//! toast registry. It never performs I/O: collaborator calls are emitted as
//! effects and their results come back as [`LoopEvent`]s.

use snip_config::Config;
use snip_types::{Region, SessionError, SessionId, ToastId};

use crate::effects::{Effect, Effects, TimerKey};
use crate::events::LoopEvent;
use crate::overlay::{OverlayTimings, Resolution, SelectionOverlay};
use crate::session::{CaptureSession, SessionState};
use crate::stats::SessionStats;
use crate::toast::{NotificationToast, ToastRegistry, ToastTiming};

pub const SUCCESS_MESSAGE: &str = "Copied to clipboard";

#[derive(Debug)]
pub struct CaptureCoordinator {
    overlay_timings: OverlayTimings,
    toast_timing: ToastTiming,
    toasts: ToastRegistry,
    session: Option<CaptureSession>,
    /// Set at `start`, cleared one tick after completion
    busy: Option<SessionId>,
    stats: SessionStats,
}

impl CaptureCoordinator {
    pub fn new(config: &Config, toasts: ToastRegistry) -> Self {
        Self {
            overlay_timings: OverlayTimings::from(&config.overlay),
            toast_timing: ToastTiming::from(&config.toast),
            toasts,
            session: None,
            busy: None,
            stats: SessionStats::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn toasts(&self) -> &ToastRegistry {
        &self.toasts
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Begin a session over `display`, the screen frame the overlay covers.
    ///
    /// A rejected call reports only through the returned error.
    pub fn start(
        &mut self,
        display: Option<Region>,
        fx: &mut Effects,
    ) -> Result<SessionId, SessionError> {
        if let Some(active) = self.busy {
            self.stats.record_rejected();
            tracing::warn!(%active, "capture requested while a session is active");
            return Err(SessionError::SessionBusy);
        }

        let id = SessionId::new();
        self.busy = Some(id);
        self.stats.record_started();
        let mut session = CaptureSession::new(id);

        let Some(frame) = display else {
            tracing::error!(session = %id, "no capturable display");
            self.session = Some(session);
            self.complete(
                Err(SessionError::CaptureFailed("no capturable display".into())),
                fx,
            );
            return Ok(id);
        };

        tracing::info!(session = %id, %frame, "capture session started");
        let mut overlay = SelectionOverlay::new(id, frame, self.overlay_timings);
        overlay.present(fx);
        session.overlay = Some(overlay);
        self.session = Some(session);
        Ok(id)
    }

    /// Cancel the selection phase. Later phases run to completion.
    pub fn cancel(&mut self, fx: &mut Effects) {
        match self.session.as_mut() {
            Some(session) if session.is(SessionState::Selecting) => {
                if let Some(overlay) = session.overlay.as_mut() {
                    overlay.cancel(fx);
                }
            }
            Some(session) => {
                tracing::debug!(session = %session.id(), state = %session.state(), "cancel ignored");
            }
            None => tracing::debug!("cancel without an active session"),
        }
    }

    /// Finish whatever session is in flight so its completion still fires.
    /// A selection is cancelled; later phases are reported as interrupted.
    pub fn shutdown(&mut self, fx: &mut Effects) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let outcome = match session.overlay.take() {
            Some(mut overlay) if session.is(SessionState::Selecting) => {
                overlay.cancel(fx);
                SessionError::SelectionCancelled
            }
            _ => SessionError::Interrupted,
        };
        tracing::info!(session = %session.id(), state = %session.state(), "session ended by shutdown");
        self.complete(Err(outcome), fx);
    }

    pub fn show_toast(&mut self, message: impl Into<String>, fx: &mut Effects) -> ToastId {
        NotificationToast::show(&mut self.toasts, message, self.toast_timing, fx)
    }

    pub fn dismiss_toasts(&mut self, fx: &mut Effects) {
        self.toasts.dismiss_all(fx);
    }

    pub fn on_timer(&mut self, key: TimerKey, fx: &mut Effects) {
        match key {
            TimerKey::Overlay(id, timer) => {
                if let Some(overlay) = self.current_overlay(id) {
                    overlay.on_timer(timer, fx);
                }
            }
            TimerKey::Toast(id) => self.toasts.on_timer(id, fx),
        }
    }

    pub fn handle(&mut self, event: LoopEvent, fx: &mut Effects) {
        match event {
            LoopEvent::Overlay { session, input } => {
                if let Some(overlay) = self.current_overlay(session) {
                    overlay.handle(input, fx);
                }
            }
            LoopEvent::SelectionDelivered {
                session,
                resolution,
            } => self.on_selection(session, resolution, fx),
            LoopEvent::Captured { session, result } => {
                let Some(current) = self.current(session, SessionState::Capturing) else {
                    return;
                };
                match result {
                    Ok(image) => {
                        tracing::debug!(session = %session, ?image, "region captured");
                        current.advance(SessionState::Recognizing);
                        fx.push(Effect::Recognize(session, image));
                    }
                    Err(err) => {
                        self.complete(Err(SessionError::CaptureFailed(err.to_string())), fx)
                    }
                }
            }
            LoopEvent::Recognized { session, result } => {
                let Some(current) = self.current(session, SessionState::Recognizing) else {
                    return;
                };
                match result {
                    Ok(text) => {
                        let trimmed = text.content.trim();
                        if trimmed.is_empty() {
                            self.complete(Err(SessionError::NoTextRecognized), fx);
                            return;
                        }
                        let trimmed = trimmed.to_string();
                        current.result_text = Some(trimmed.clone());
                        current.advance(SessionState::Writing);
                        fx.push(Effect::Write(session, trimmed));
                    }
                    Err(err) => {
                        self.complete(Err(SessionError::RecognitionFailed(err.to_string())), fx)
                    }
                }
            }
            LoopEvent::Written { session, result } => {
                let Some(current) = self.current(session, SessionState::Writing) else {
                    return;
                };
                match result {
                    Ok(()) => {
                        let text = current.result_text.take().unwrap_or_default();
                        self.complete(Ok(text), fx);
                    }
                    Err(err) => {
                        self.complete(Err(SessionError::SinkWriteFailed(err.to_string())), fx)
                    }
                }
            }
            LoopEvent::ReleaseSession(id) => {
                if self.busy == Some(id) {
                    self.busy = None;
                    tracing::debug!(session = %id, "session released");
                }
            }
            LoopEvent::Toast { toast, input } => self.toasts.handle(toast, input, fx),
            other => tracing::trace!(event = other.name(), "not a coordinator event"),
        }
    }

    fn on_selection(&mut self, id: SessionId, resolution: Resolution, fx: &mut Effects) {
        let Some(session) = self.current(id, SessionState::Selecting) else {
            return;
        };
        // The surface is gone; drop the overlay before anything else runs
        session.overlay = None;

        match resolution {
            Resolution::Cancelled => self.complete(Err(SessionError::SelectionCancelled), fx),
            Resolution::Resolved(region) => {
                tracing::debug!(session = %id, %region, "region selected");
                session.region = Some(region);
                session.advance(SessionState::Capturing);
                fx.push(Effect::Capture(id, region));
            }
        }
    }

    fn complete(&mut self, outcome: Result<String, SessionError>, fx: &mut Effects) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let id = session.id();
        session.advance(SessionState::Finished);
        session.error = outcome.as_ref().err().cloned();

        let total_ms = session.elapsed().as_millis() as u64;
        match &outcome {
            Ok(text) => tracing::info!(session = %id, total_ms, chars = text.chars().count(), "capture succeeded"),
            Err(err) => tracing::info!(session = %id, total_ms, %err, "capture finished without text"),
        }

        self.stats.record_outcome(&outcome);
        match &outcome {
            Ok(_) => {
                self.show_toast(SUCCESS_MESSAGE, fx);
            }
            Err(err) if !err.is_silent() => {
                self.show_toast(err.to_string(), fx);
            }
            Err(_) => {}
        }

        fx.push(Effect::Complete {
            session: id,
            outcome,
        });
        fx.defer(LoopEvent::ReleaseSession(id));
    }

    fn current(&mut self, id: SessionId, expected: SessionState) -> Option<&mut CaptureSession> {
        match self.session.as_mut() {
            Some(session) if session.id() == id && session.is(expected) => Some(session),
            _ => {
                tracing::debug!(session = %id, ?expected, "stale session event ignored");
                None
            }
        }
    }

    fn current_overlay(&mut self, id: SessionId) -> Option<&mut SelectionOverlay> {
        self.session
            .as_mut()
            .filter(|session| session.id() == id)
            .and_then(|session| session.overlay.as_mut())
    }
}

/// `(success, message)` pair handed to the completion callback
pub fn completion_report(outcome: &Result<String, SessionError>) -> (bool, Option<String>) {
    match outcome {
        Ok(text) => (true, Some(text.clone())),
        Err(err) => (false, Some(err.to_string())),
    }
}
