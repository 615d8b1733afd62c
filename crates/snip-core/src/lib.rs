//! Capture orchestration: selection overlay, toasts, and the single-flight
//! session pipeline, driven by one cooperative event loop.

pub mod coordinator;
pub mod effects;
pub mod event_loop;
pub mod events;
pub mod overlay;
pub mod pipeline;
pub mod session;
pub mod stats;
pub mod toast;

pub use coordinator::CaptureCoordinator;
pub use effects::{Effect, Effects, OverlayTimer, SurfaceCommand, TimerKey, ToastCommand};
pub use event_loop::{
    Collaborators, CompletionCallback, EventLoop, LoopHandle, OverlayPresenter, ToastPresenter,
};
pub use events::{FocusSignals, LoopEvent, OverlayInput, ToastInput};
pub use overlay::{PointerMode, Resolution, SelectionOverlay};
pub use pipeline::{CaptureBackend, DestinationSink, RecognitionEngine};
pub use session::{CaptureSession, SessionState};
pub use stats::SessionStats;
pub use toast::{NotificationToast, ToastRegistry, ToastState};

#[cfg(test)]
mod tests;
