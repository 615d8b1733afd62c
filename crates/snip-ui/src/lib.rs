use kanal::AsyncReceiver;
use snip_config::Config;
use snip_core::LoopHandle;
use snip_types::Region;

use crate::overlay::OverlaySurface;
use crate::toast::ToastSurfaces;

mod bridge;
mod overlay;
mod platform;
mod toast;

pub use bridge::{FrameSource, SurfacePresenter, ToastSurfacePresenter, UiBridge, UiCommand, UiQuitter};
pub use overlay::SURFACE_TITLE;

slint::slint! {
    export component SelectionWindow inherits Window {
        in property <float> dim-alpha: 0.35;
        in property <bool> native-crosshair;
        in property <bool> crosshair-visible;
        in property <length> crosshair-x;
        in property <length> crosshair-y;
        in property <bool> selection-visible;
        in property <length> selection-x;
        in property <length> selection-y;
        in property <length> selection-width;
        in property <length> selection-height;

        callback pointer-down(length, length);
        callback pointer-dragged(length, length);
        callback pointer-up(length, length);
        callback pointer-moved(length, length);
        callback cancel-key();

        title: "snip-selection";
        no-frame: true;
        always-on-top: true;
        background: transparent;
        forward-focus: keys;

        Rectangle {
            background: rgba(0, 0, 0, root.dim-alpha);
        }

        Rectangle {
            visible: root.selection-visible;
            x: root.selection-x;
            y: root.selection-y;
            width: root.selection-width;
            height: root.selection-height;
            background: rgba(255, 255, 255, 0.12);
            border-width: 1px;
            border-color: white;
        }

        Rectangle {
            visible: root.crosshair-visible;
            x: 0px;
            y: root.crosshair-y;
            width: root.width;
            height: 1px;
            background: white;
        }

        Rectangle {
            visible: root.crosshair-visible;
            x: root.crosshair-x;
            y: 0px;
            width: 1px;
            height: root.height;
            background: white;
        }

        TouchArea {
            mouse-cursor: root.native-crosshair ? MouseCursor.crosshair : MouseCursor.none;

            pointer-event(event) => {
                if (event.button == PointerEventButton.left && event.kind == PointerEventKind.down) {
                    root.pointer-down(self.mouse-x, self.mouse-y);
                } else if (event.button == PointerEventButton.left && event.kind == PointerEventKind.up) {
                    root.pointer-up(self.mouse-x, self.mouse-y);
                }
            }
            moved => {
                root.pointer-dragged(self.mouse-x, self.mouse-y);
            }
            changed mouse-x => {
                if (!self.pressed) {
                    root.pointer-moved(self.mouse-x, self.mouse-y);
                }
            }
            changed mouse-y => {
                if (!self.pressed) {
                    root.pointer-moved(self.mouse-x, self.mouse-y);
                }
            }
        }

        keys := FocusScope {
            key-pressed(event) => {
                if (event.text == Key.Escape) {
                    root.cancel-key();
                    return accept;
                }
                return reject;
            }
        }
    }

    export component ToastWindow inherits Window {
        in property <string> message;
        in-out property <float> content-opacity: 0;

        no-frame: true;
        always-on-top: true;
        background: transparent;
        width: 320px;
        height: 48px;

        Rectangle {
            opacity: root.content-opacity;
            background: #202020e6;
            border-radius: 8px;

            Text {
                text: root.message;
                color: white;
                font-size: 14px;
                horizontal-alignment: center;
                vertical-alignment: center;
            }
        }
    }
}

/// Presentation settings for the UI thread
#[derive(Debug, Clone, Default)]
pub struct UiOptions {
    pub dim_alpha: f32,
    pub toast_top_offset: u32,
    /// Display the toasts are centred on; the origin when unknown
    pub toast_anchor: Option<Region>,
}

impl UiOptions {
    pub fn from_config(config: &Config, toast_anchor: Option<Region>) -> Self {
        Self {
            dim_alpha: config.overlay.dim_alpha,
            toast_top_offset: config.toast.top_offset,
            toast_anchor,
        }
    }
}

/// Run the UI on the current thread until `UiCommand::Quit` arrives or the
/// command channel closes.
pub fn run(
    commands: AsyncReceiver<UiCommand>,
    handle: LoopHandle,
    options: UiOptions,
) -> anyhow::Result<()> {
    let mut surface = OverlaySurface::new(handle.clone(), options.dim_alpha)?;
    let mut toasts = ToastSurfaces::new(handle, options.toast_anchor, options.toast_top_offset);

    slint::spawn_local(async move {
        while let Ok(command) = commands.recv().await {
            match command {
                UiCommand::Surface(session, command) => surface.apply(session, command),
                UiCommand::Toast(toast, command) => toasts.apply(toast, command),
                UiCommand::Quit => break,
            }
        }
        tracing::info!("[SLINT] command channel finished, leaving event loop");
        if let Err(e) = slint::quit_event_loop() {
            tracing::warn!("[SLINT] failed to quit event loop: {}", e);
        }
    })?;

    slint::run_event_loop_until_quit()?;
    Ok(())
}
