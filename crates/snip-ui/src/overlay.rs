use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use slint::{ComponentHandle, LogicalPosition, LogicalSize, Timer, TimerMode};
use snip_core::{LoopHandle, OverlayInput, SurfaceCommand};
use snip_types::{Point, Region, SessionId};

use crate::SelectionWindow;
use crate::platform;

/// Window title used to find the surface through the OS
pub const SURFACE_TITLE: &str = "snip-selection";

const MONITOR_PERIOD: Duration = Duration::from_millis(16);

type CurrentSession = Rc<Cell<Option<SessionId>>>;

fn local_point(x: f32, y: f32) -> Point {
    Point::new(x.round() as i32, y.round() as i32)
}

fn forward(
    handle: &LoopHandle,
    session: &CurrentSession,
    input: fn(Point) -> OverlayInput,
) -> impl Fn(f32, f32) + 'static {
    let handle = handle.clone();
    let session = session.clone();
    move |x, y| {
        if let Some(id) = session.get() {
            handle.overlay(id, input(local_point(x, y)));
        }
    }
}

/// UI-thread side of the selection overlay
pub(crate) struct OverlaySurface {
    window: SelectionWindow,
    handle: LoopHandle,
    session: CurrentSession,
    native_crosshair: Rc<Cell<bool>>,
    cursor_reported: Rc<Cell<bool>>,
    visible: bool,
    monitor: Timer,
}

impl OverlaySurface {
    pub fn new(handle: LoopHandle, dim_alpha: f32) -> Result<Self, slint::PlatformError> {
        let window = SelectionWindow::new()?;
        window.set_dim_alpha(dim_alpha);

        let session: CurrentSession = Rc::new(Cell::new(None));
        let native_crosshair = Rc::new(Cell::new(false));
        let cursor_reported = Rc::new(Cell::new(false));

        window.on_pointer_down(forward(&handle, &session, OverlayInput::PointerDown));
        window.on_pointer_dragged(forward(&handle, &session, OverlayInput::PointerDragged));
        window.on_pointer_up(forward(&handle, &session, OverlayInput::PointerUp));
        {
            let moved = forward(&handle, &session, OverlayInput::PointerMoved);
            let handle = handle.clone();
            let session = session.clone();
            let native_crosshair = native_crosshair.clone();
            let cursor_reported = cursor_reported.clone();
            window.on_pointer_moved(move |x, y| {
                moved(x, y);
                // Hovering with the crosshair enabled means the toolkit applied it
                if native_crosshair.get() && !cursor_reported.replace(true) {
                    if let Some(id) = session.get() {
                        handle.overlay(id, OverlayInput::NativeCursorUpdated);
                    }
                }
            });
        }
        {
            let handle = handle.clone();
            let session = session.clone();
            window.on_cancel_key(move || {
                if let Some(id) = session.get() {
                    handle.overlay(id, OverlayInput::CancelKey);
                }
            });
        }
        {
            let handle = handle.clone();
            let session = session.clone();
            window.window().on_close_requested(move || {
                if let Some(id) = session.get() {
                    handle.overlay(id, OverlayInput::CancelKey);
                }
                slint::CloseRequestResponse::KeepWindowShown
            });
        }

        Ok(Self {
            window,
            handle,
            session,
            native_crosshair,
            cursor_reported,
            visible: false,
            monitor: Timer::default(),
        })
    }

    pub fn apply(&mut self, session: SessionId, command: SurfaceCommand) {
        tracing::trace!(%session, ?command, "[SLINT] surface command");
        match command {
            SurfaceCommand::Show { frame } => self.show(session, frame),
            SurfaceCommand::RequestFocus => platform::request_focus(SURFACE_TITLE),
            SurfaceCommand::ProbeFocus => {
                let signals = platform::focus_signals(SURFACE_TITLE, self.visible);
                tracing::debug!(?signals, "[SLINT] focus probed");
                self.handle.overlay(session, OverlayInput::FocusProbed(signals));
            }
            SurfaceCommand::SetNativeCrosshair(enabled) => {
                self.native_crosshair.set(enabled);
                self.window.set_native_crosshair(enabled);
                if enabled {
                    platform::assert_crosshair();
                }
            }
            SurfaceCommand::AssertCrosshair => platform::assert_crosshair(),
            SurfaceCommand::SetSystemPointerVisible(visible) => {
                platform::set_pointer_visible(visible)
            }
            SurfaceCommand::DrawCrosshair(at) => {
                self.window.set_crosshair_visible(at.is_some());
                if let Some(at) = at {
                    self.window.set_crosshair_x(at.x as f32);
                    self.window.set_crosshair_y(at.y as f32);
                }
            }
            SurfaceCommand::DrawSelection(rect) => {
                self.window.set_selection_visible(rect.is_some());
                if let Some(rect) = rect {
                    self.window.set_selection_x(rect.x as f32);
                    self.window.set_selection_y(rect.y as f32);
                    self.window.set_selection_width(rect.width as f32);
                    self.window.set_selection_height(rect.height as f32);
                }
            }
            SurfaceCommand::StartPointerMonitor => self.start_monitor(session),
            SurfaceCommand::StopPointerMonitor => self.monitor.stop(),
            SurfaceCommand::Close => self.close(session),
        }
    }

    fn show(&mut self, session: SessionId, frame: Region) {
        self.session.set(Some(session));
        self.native_crosshair.set(false);
        self.cursor_reported.set(false);
        self.window.set_native_crosshair(false);
        self.window.set_crosshair_visible(false);
        self.window.set_selection_visible(false);

        let window = self.window.window();
        window.set_position(LogicalPosition::new(frame.x as f32, frame.y as f32));
        window.set_size(LogicalSize::new(frame.width as f32, frame.height as f32));
        match self.window.show() {
            Ok(()) => self.visible = true,
            Err(e) => tracing::error!("[SLINT] failed to show overlay: {}", e),
        }
    }

    fn close(&mut self, session: SessionId) {
        self.monitor.stop();
        if let Err(e) = self.window.hide() {
            tracing::warn!("[SLINT] failed to hide overlay: {}", e);
        }
        self.visible = false;
        self.session.set(None);
        self.handle.overlay(session, OverlayInput::SurfaceClosed);
    }

    /// Poll the global pointer and Escape while the surface lacks focus
    fn start_monitor(&mut self, session: SessionId) {
        if !platform::HAS_POINTER_MONITOR {
            tracing::debug!("[SLINT] no global pointer monitor on this platform");
            return;
        }

        let handle = self.handle.clone();
        let mut last: Option<Point> = None;
        let mut escape_was_down = false;
        self.monitor.start(TimerMode::Repeated, MONITOR_PERIOD, move || {
            if let Some(at) = platform::cursor_position()
                && last != Some(at)
            {
                last = Some(at);
                handle.overlay(session, OverlayInput::GlobalPointer(at));
            }

            let escape_down = platform::escape_down();
            if escape_down && !escape_was_down {
                handle.overlay(session, OverlayInput::CancelKey);
            }
            escape_was_down = escape_down;
        });
    }
}
