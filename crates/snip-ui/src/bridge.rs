use kanal::{AsyncReceiver, Sender};
use snip_core::{OverlayPresenter, SurfaceCommand, ToastCommand, ToastPresenter};
use snip_types::{Region, SessionId, ToastId};

/// Commands travelling from the capture loop to the UI thread
#[derive(Debug)]
pub enum UiCommand {
    Surface(SessionId, SurfaceCommand),
    Toast(ToastId, ToastCommand),
    Quit,
}

pub type FrameSource = Box<dyn Fn() -> Option<Region> + Send>;

/// Loop-side end of the selection surface
pub struct SurfacePresenter {
    tx: Sender<UiCommand>,
    frame_source: FrameSource,
}

impl OverlayPresenter for SurfacePresenter {
    fn screen_frame(&self) -> Option<Region> {
        (self.frame_source)()
    }

    fn apply(&mut self, session: SessionId, command: SurfaceCommand) {
        if let Err(e) = self.tx.send(UiCommand::Surface(session, command)) {
            tracing::warn!("[UI_BRIDGE] surface command dropped: {}", e);
        }
    }
}

/// Loop-side end of the toast surfaces
pub struct ToastSurfacePresenter {
    tx: Sender<UiCommand>,
}

impl ToastPresenter for ToastSurfacePresenter {
    fn apply(&mut self, toast: ToastId, command: ToastCommand) {
        if let Err(e) = self.tx.send(UiCommand::Toast(toast, command)) {
            tracing::warn!("[UI_BRIDGE] toast command dropped: {}", e);
        }
    }
}

/// Asks the UI thread to leave its event loop
#[derive(Clone)]
pub struct UiQuitter {
    tx: Sender<UiCommand>,
}

impl UiQuitter {
    pub fn quit(&self) {
        let _ = self.tx.send(UiCommand::Quit);
    }
}

/// Bridge between the capture loop and the UI thread
pub struct UiBridge {
    pub surface: SurfacePresenter,
    pub toasts: ToastSurfacePresenter,
    pub quitter: UiQuitter,
    pub commands: AsyncReceiver<UiCommand>,
}

impl UiBridge {
    pub fn new(frame_source: FrameSource) -> Self {
        let (tx, rx) = kanal::unbounded();
        Self {
            surface: SurfacePresenter {
                tx: tx.clone(),
                frame_source,
            },
            toasts: ToastSurfacePresenter { tx: tx.clone() },
            quitter: UiQuitter { tx },
            commands: rx.to_async(),
        }
    }
}
