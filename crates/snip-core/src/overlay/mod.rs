//! Full-screen drag-to-select overlay.
//!
//! The overlay is a pure state machine. It never touches a window itself; it
//! emits [`SurfaceCommand`]s and timers into an [`Effects`] outbox and is fed
//! back [`OverlayInput`]s and timer fires by the capture loop.

mod pointer;

use std::time::Duration;

use snip_config::overlay::OverlayConfig;
use snip_types::{Point, Region, SessionId};

use crate::effects::{Effects, OverlayTimer, SurfaceCommand, TimerKey};
use crate::events::{FocusSignals, LoopEvent, OverlayInput};

pub use pointer::{
    FallbackPointerTracking, NativePointerTracking, PointerMode, PointerTracking, TrackingContext,
};

/// Drags with either edge at or below this many pixels count as a cancel
pub const MIN_SELECTION_EDGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Region),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    AwaitingActivation,
    Normal,
    Fallback,
    Dragging,
    Resolved(Region),
    Cancelled,
}

impl OverlayState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OverlayState::Resolved(_) | OverlayState::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            OverlayState::Idle => 0,
            OverlayState::AwaitingActivation => 1,
            OverlayState::Normal | OverlayState::Fallback => 2,
            OverlayState::Dragging => 3,
            OverlayState::Resolved(_) | OverlayState::Cancelled => 4,
        }
    }

    /// States only move forward; fallback may be promoted to normal once
    pub fn allows(&self, next: &OverlayState) -> bool {
        match (self, next) {
            (OverlayState::Fallback, OverlayState::Normal) => true,
            _ if self.is_terminal() => false,
            _ => next.rank() > self.rank(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbePurpose {
    Activation,
    Promotion,
}

#[derive(Debug, Clone, Copy)]
pub struct OverlayTimings {
    pub activation_probe: Duration,
    pub promotion_probe: Duration,
    pub cursor_guard: Duration,
}

impl From<&OverlayConfig> for OverlayTimings {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            activation_probe: config.activation_probe(),
            promotion_probe: config.promotion_probe(),
            cursor_guard: config.cursor_guard(),
        }
    }
}

impl Default for OverlayTimings {
    fn default() -> Self {
        Self::from(&OverlayConfig::default())
    }
}

#[derive(Debug)]
pub struct SelectionOverlay {
    session: SessionId,
    frame: Region,
    timings: OverlayTimings,
    state: OverlayState,
    tracking: Option<Box<dyn PointerTracking>>,
    entered_fallback: bool,
    last_pointer: Option<Point>,
    drag_origin: Option<Point>,
    drag_current: Option<Point>,
    pending_probe: Option<ProbePurpose>,
    activation_armed: bool,
    promotion_armed: bool,
    resolution: Option<Resolution>,
    surface_closed: bool,
    delivered: bool,
}

impl SelectionOverlay {
    /// `frame` is the screen rectangle the surface covers
    pub fn new(session: SessionId, frame: Region, timings: OverlayTimings) -> Self {
        Self {
            session,
            frame,
            timings,
            state: OverlayState::Idle,
            tracking: None,
            entered_fallback: false,
            last_pointer: None,
            drag_origin: None,
            drag_current: None,
            pending_probe: None,
            activation_armed: false,
            promotion_armed: false,
            resolution: None,
            surface_closed: false,
            delivered: false,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn mode(&self) -> Option<PointerMode> {
        self.tracking.as_ref().map(|t| t.mode())
    }

    pub fn entered_fallback(&self) -> bool {
        self.entered_fallback
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Show the surface and start the activation wait
    pub fn present(&mut self, fx: &mut Effects) {
        if self.state != OverlayState::Idle {
            tracing::warn!(session = %self.session, state = ?self.state, "overlay already presented");
            return;
        }

        self.surface(fx, SurfaceCommand::Show { frame: self.frame });
        self.surface(fx, SurfaceCommand::RequestFocus);
        self.activation_armed = true;
        fx.start_timer(
            self.timer_key(OverlayTimer::ActivationProbe),
            self.timings.activation_probe,
            false,
        );
        self.advance(OverlayState::AwaitingActivation);
    }

    pub fn handle(&mut self, input: OverlayInput, fx: &mut Effects) {
        if input == OverlayInput::SurfaceClosed {
            self.on_surface_closed(fx);
            return;
        }
        if self.state.is_terminal() {
            tracing::trace!(session = %self.session, ?input, "input after resolution ignored");
            return;
        }

        match input {
            OverlayInput::FocusProbed(signals) => self.on_focus_probed(signals, fx),
            OverlayInput::PointerDown(at) => self.on_pointer_down(at, fx),
            OverlayInput::PointerDragged(at) => self.on_pointer_dragged(at, fx),
            OverlayInput::PointerUp(at) => self.on_pointer_up(at, fx),
            OverlayInput::PointerMoved(at) => self.track_pointer(at, fx),
            OverlayInput::GlobalPointer(screen) => {
                self.track_pointer(screen.relative_to(self.frame.origin()), fx)
            }
            OverlayInput::NativeCursorUpdated => {
                self.with_tracking(fx, |tracking, ctx| tracking.native_cursor_updated(ctx));
            }
            OverlayInput::CancelKey => self.finish(Resolution::Cancelled, fx),
            OverlayInput::SurfaceClosed => {}
        }
    }

    pub fn on_timer(&mut self, timer: OverlayTimer, fx: &mut Effects) {
        if self.state.is_terminal() {
            return;
        }

        match timer {
            OverlayTimer::ActivationProbe => {
                if self.activation_armed {
                    self.activation_armed = false;
                    self.request_probe(ProbePurpose::Activation, fx);
                }
            }
            OverlayTimer::PromotionProbe => {
                if self.promotion_armed {
                    self.promotion_armed = false;
                    self.request_probe(ProbePurpose::Promotion, fx);
                }
            }
            OverlayTimer::CursorGuard => {
                self.with_tracking(fx, |tracking, ctx| tracking.guard_tick(ctx));
            }
        }
    }

    /// External cancel request (Escape or caller)
    pub fn cancel(&mut self, fx: &mut Effects) {
        self.finish(Resolution::Cancelled, fx);
    }

    /// Resolve the overlay. Only the first call has any effect.
    pub fn finish(&mut self, resolution: Resolution, fx: &mut Effects) {
        if self.resolution.is_some() {
            tracing::debug!(session = %self.session, ?resolution, "overlay already resolved");
            return;
        }

        if self.activation_armed {
            self.activation_armed = false;
            fx.cancel_timer(self.timer_key(OverlayTimer::ActivationProbe));
        }
        if self.promotion_armed {
            self.promotion_armed = false;
            fx.cancel_timer(self.timer_key(OverlayTimer::PromotionProbe));
        }
        self.pending_probe = None;
        self.with_tracking(fx, |tracking, ctx| tracking.release(ctx));

        if self.drag_origin.is_some() {
            self.surface(fx, SurfaceCommand::DrawSelection(None));
        }

        self.resolution = Some(resolution);
        self.advance(match resolution {
            Resolution::Resolved(region) => OverlayState::Resolved(region),
            Resolution::Cancelled => OverlayState::Cancelled,
        });
        tracing::debug!(session = %self.session, ?resolution, "overlay resolved");

        if !self.surface_closed {
            self.surface(fx, SurfaceCommand::Close);
        }
    }

    fn on_surface_closed(&mut self, fx: &mut Effects) {
        if self.surface_closed {
            return;
        }
        self.surface_closed = true;

        // Surface went away underneath us (e.g. the window was closed by the OS)
        if self.resolution.is_none() {
            self.finish(Resolution::Cancelled, fx);
        }

        if let Some(resolution) = self.resolution
            && !self.delivered
        {
            self.delivered = true;
            fx.defer(LoopEvent::SelectionDelivered {
                session: self.session,
                resolution,
            });
        }
    }

    fn on_focus_probed(&mut self, signals: FocusSignals, fx: &mut Effects) {
        let Some(purpose) = self.pending_probe.take() else {
            tracing::trace!(session = %self.session, "unsolicited focus probe ignored");
            return;
        };
        tracing::debug!(session = %self.session, ?purpose, ?signals, "focus probed");

        match purpose {
            ProbePurpose::Activation => self.activate(signals, fx),
            ProbePurpose::Promotion => {
                if self.mode() != Some(PointerMode::Fallback) {
                    return;
                }
                if signals.acquired() {
                    self.promote(fx);
                } else {
                    self.arm_promotion_probe(fx);
                }
            }
        }
    }

    fn activate(&mut self, signals: FocusSignals, fx: &mut Effects) {
        let mut tracking: Box<dyn PointerTracking> = if signals.acquired() {
            Box::new(NativePointerTracking::new())
        } else {
            self.entered_fallback = true;
            Box::new(FallbackPointerTracking::new(self.last_pointer))
        };
        let mode = tracking.mode();
        tracing::info!(session = %self.session, %mode, "overlay activated");

        tracking.engage(&mut self.tracking_context(fx));
        self.tracking = Some(tracking);

        if self.state == OverlayState::AwaitingActivation {
            self.advance(match mode {
                PointerMode::Native => OverlayState::Normal,
                PointerMode::Fallback => OverlayState::Fallback,
            });
        }

        // The user was quicker than the probe and is already dragging
        if mode == PointerMode::Fallback && self.drag_origin.is_some() {
            self.begin_promotion(fx);
        }
    }

    fn promote(&mut self, fx: &mut Effects) {
        self.with_tracking(fx, |tracking, ctx| tracking.release(ctx));

        let mut native: Box<dyn PointerTracking> = Box::new(NativePointerTracking::new());
        native.engage(&mut self.tracking_context(fx));
        self.tracking = Some(native);
        tracing::info!(session = %self.session, "promoted to native pointer tracking");

        if self.state == OverlayState::Fallback {
            self.advance(OverlayState::Normal);
        }
    }

    fn begin_promotion(&mut self, fx: &mut Effects) {
        if self.promotion_armed || self.pending_probe == Some(ProbePurpose::Promotion) {
            return;
        }
        self.surface(fx, SurfaceCommand::RequestFocus);
        self.arm_promotion_probe(fx);
    }

    fn arm_promotion_probe(&mut self, fx: &mut Effects) {
        self.promotion_armed = true;
        fx.start_timer(
            self.timer_key(OverlayTimer::PromotionProbe),
            self.timings.promotion_probe,
            false,
        );
    }

    fn request_probe(&mut self, purpose: ProbePurpose, fx: &mut Effects) {
        self.pending_probe = Some(purpose);
        self.surface(fx, SurfaceCommand::ProbeFocus);
    }

    fn on_pointer_down(&mut self, at: Point, fx: &mut Effects) {
        if self.drag_origin.is_some() {
            return;
        }
        self.track_pointer(at, fx);
        self.drag_origin = Some(at);
        self.drag_current = Some(at);
        self.advance(OverlayState::Dragging);

        if self.mode() == Some(PointerMode::Fallback) {
            self.begin_promotion(fx);
        }
    }

    fn on_pointer_dragged(&mut self, at: Point, fx: &mut Effects) {
        self.track_pointer(at, fx);
        let Some(origin) = self.drag_origin else {
            return;
        };
        self.drag_current = Some(at);
        self.surface(
            fx,
            SurfaceCommand::DrawSelection(Some(Region::from_corners(origin, at))),
        );
    }

    fn on_pointer_up(&mut self, at: Point, fx: &mut Effects) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        self.drag_current = Some(at);

        let local = Region::from_corners(origin, at);
        let resolution = if local.exceeds(MIN_SELECTION_EDGE) {
            Resolution::Resolved(local.translate(self.frame.origin()))
        } else {
            tracing::debug!(session = %self.session, %local, "selection too small");
            Resolution::Cancelled
        };
        self.finish(resolution, fx);
    }

    fn track_pointer(&mut self, local: Point, fx: &mut Effects) {
        self.last_pointer = Some(local);
        self.with_tracking(fx, |tracking, ctx| tracking.pointer_at(local, ctx));
    }

    fn with_tracking(
        &mut self,
        fx: &mut Effects,
        f: impl FnOnce(&mut dyn PointerTracking, &mut TrackingContext<'_>),
    ) {
        let session = self.session;
        let cursor_guard = self.timings.cursor_guard;
        if let Some(tracking) = self.tracking.as_mut() {
            let mut ctx = TrackingContext {
                session,
                cursor_guard,
                fx,
            };
            f(tracking.as_mut(), &mut ctx);
        }
    }

    fn tracking_context<'a>(&self, fx: &'a mut Effects) -> TrackingContext<'a> {
        TrackingContext {
            session: self.session,
            cursor_guard: self.timings.cursor_guard,
            fx,
        }
    }

    fn advance(&mut self, next: OverlayState) {
        debug_assert!(
            self.state.allows(&next),
            "illegal overlay transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(session = %self.session, from = ?self.state, to = ?next, "overlay state");
        self.state = next;
    }

    fn surface(&self, fx: &mut Effects, command: SurfaceCommand) {
        fx.surface(self.session, command);
    }

    fn timer_key(&self, timer: OverlayTimer) -> TimerKey {
        TimerKey::Overlay(self.session, timer)
    }
}
