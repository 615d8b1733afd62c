use std::time::Duration;

use snip_types::{Point, RasterImage, Region, SessionError, SessionId, ToastId};

use crate::events::LoopEvent;

/// Commands for the full-screen selection surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Show { frame: Region },
    RequestFocus,
    /// Answered with `OverlayInput::FocusProbed`
    ProbeFocus,
    /// Let the toolkit manage a crosshair hover region
    SetNativeCrosshair(bool),
    /// Force the crosshair cursor right now
    AssertCrosshair,
    SetSystemPointerVisible(bool),
    /// Custom-drawn crosshair, surface-local
    DrawCrosshair(Option<Point>),
    /// Live selection rectangle, surface-local
    DrawSelection(Option<Region>),
    StartPointerMonitor,
    StopPointerMonitor,
    /// Answered with `OverlayInput::SurfaceClosed`
    Close,
}

/// Commands for a toast surface.
///
/// Alpha changes only ever target the content element; there is no command
/// to animate the top-level surface itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ToastCommand {
    /// Create the surface with fully transparent content
    Present { message: String },
    /// Answered with `ToastInput::FadedIn` or `ToastInput::FadedOut`
    AnimateContent { alpha: f32, over: Duration },
    /// Order the surface out without destroying it
    Hide,
    /// Drop the surface handle
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayTimer {
    ActivationProbe,
    PromotionProbe,
    CursorGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Overlay(SessionId, OverlayTimer),
    Toast(ToastId),
}

#[derive(Debug)]
pub enum Effect {
    Surface(SessionId, SurfaceCommand),
    Toast(ToastId, ToastCommand),
    StartTimer {
        key: TimerKey,
        after: Duration,
        repeat: bool,
    },
    CancelTimer(TimerKey),
    /// Post to the back of the loop queue
    Defer(LoopEvent),
    Capture(SessionId, Region),
    Recognize(SessionId, RasterImage),
    Write(SessionId, String),
    Complete {
        session: SessionId,
        outcome: Result<String, SessionError>,
    },
}

/// Outbox filled by the state machines and drained by the loop
#[derive(Debug, Default)]
pub struct Effects {
    queue: Vec<Effect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.queue.push(effect);
    }

    pub fn surface(&mut self, session: SessionId, command: SurfaceCommand) {
        self.push(Effect::Surface(session, command));
    }

    pub fn toast(&mut self, toast: ToastId, command: ToastCommand) {
        self.push(Effect::Toast(toast, command));
    }

    pub fn start_timer(&mut self, key: TimerKey, after: Duration, repeat: bool) {
        self.push(Effect::StartTimer { key, after, repeat });
    }

    pub fn cancel_timer(&mut self, key: TimerKey) {
        self.push(Effect::CancelTimer(key));
    }

    pub fn defer(&mut self, event: LoopEvent) {
        self.push(Effect::Defer(event));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.queue.iter()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Effect> {
        self.queue.drain(..)
    }

    /// Surface commands addressed to `session`, in emission order
    pub fn surface_commands(&self, session: SessionId) -> Vec<&SurfaceCommand> {
        self.queue
            .iter()
            .filter_map(|effect| match effect {
                Effect::Surface(id, command) if *id == session => Some(command),
                _ => None,
            })
            .collect()
    }
}
