use snip_types::{
    CaptureError, Point, RasterImage, RecognitionError, RecognizedText, SessionId, SinkError,
    ToastId,
};

use crate::effects::TimerKey;
use crate::overlay::Resolution;

/// Everything the capture loop reacts to
#[derive(Debug)]
pub enum LoopEvent {
    /// Hotkey or UI asked for a new session
    Trigger,
    /// External cancel request for the selection phase
    Cancel,
    Shutdown,
    Overlay {
        session: SessionId,
        input: OverlayInput,
    },
    /// Overlay resolution, posted one tick after the surface closed
    SelectionDelivered {
        session: SessionId,
        resolution: Resolution,
    },
    Captured {
        session: SessionId,
        result: Result<RasterImage, CaptureError>,
    },
    Recognized {
        session: SessionId,
        result: Result<RecognizedText, RecognitionError>,
    },
    Written {
        session: SessionId,
        result: Result<(), SinkError>,
    },
    /// Clears the single-flight flag one tick after completion
    ReleaseSession(SessionId),
    Toast {
        toast: ToastId,
        input: ToastInput,
    },
    Timer {
        key: TimerKey,
        generation: u64,
    },
}

/// Input reported by the selection surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayInput {
    FocusProbed(FocusSignals),
    /// Surface-local coordinates
    PointerDown(Point),
    PointerDragged(Point),
    PointerUp(Point),
    PointerMoved(Point),
    /// Screen coordinates from the global pointer monitor
    GlobalPointer(Point),
    /// The toolkit applied its own cursor for the hover region
    NativeCursorUpdated,
    CancelKey,
    SurfaceClosed,
}

/// The four independent signals checked before trusting native tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusSignals {
    pub process_active: bool,
    pub surface_key: bool,
    pub surface_visible: bool,
    pub on_active_workspace: bool,
}

impl FocusSignals {
    pub const ACQUIRED: FocusSignals = FocusSignals {
        process_active: true,
        surface_key: true,
        surface_visible: true,
        on_active_workspace: true,
    };

    pub fn acquired(&self) -> bool {
        self.process_active && self.surface_key && self.surface_visible && self.on_active_workspace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastInput {
    FadedIn,
    FadeOutDue,
    FadedOut,
    Dismiss,
    Dispose,
}

impl LoopEvent {
    pub fn overlay(session: SessionId, input: OverlayInput) -> Self {
        LoopEvent::Overlay { session, input }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoopEvent::Trigger => "trigger",
            LoopEvent::Cancel => "cancel",
            LoopEvent::Shutdown => "shutdown",
            LoopEvent::Overlay { .. } => "overlay",
            LoopEvent::SelectionDelivered { .. } => "selection-delivered",
            LoopEvent::Captured { .. } => "captured",
            LoopEvent::Recognized { .. } => "recognized",
            LoopEvent::Written { .. } => "written",
            LoopEvent::ReleaseSession(_) => "release-session",
            LoopEvent::Toast { .. } => "toast",
            LoopEvent::Timer { .. } => "timer",
        }
    }
}
