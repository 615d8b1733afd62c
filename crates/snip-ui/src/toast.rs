use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use slint::{ComponentHandle, LogicalPosition, Timer, TimerMode};
use snip_core::{LoopHandle, ToastCommand, ToastInput};
use snip_types::{Region, ToastId};

use crate::ToastWindow;

const TOAST_WIDTH: f32 = 320.0;
const TOAST_HEIGHT: f32 = 48.0;
const TOAST_GAP: f32 = 8.0;
const FRAME_PERIOD: Duration = Duration::from_millis(16);

struct ToastSlot {
    window: ToastWindow,
    fade: Rc<Timer>,
}

/// UI-thread side of the toasts. Only the content rectangle's opacity is
/// ever animated; the top-level window stays fully opaque.
pub(crate) struct ToastSurfaces {
    handle: LoopHandle,
    anchor: Option<Region>,
    top_offset: u32,
    slots: BTreeMap<ToastId, ToastSlot>,
}

impl ToastSurfaces {
    pub fn new(handle: LoopHandle, anchor: Option<Region>, top_offset: u32) -> Self {
        Self {
            handle,
            anchor,
            top_offset,
            slots: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, toast: ToastId, command: ToastCommand) {
        tracing::trace!(%toast, ?command, "[SLINT] toast command");
        match command {
            ToastCommand::Present { message } => self.present(toast, &message),
            ToastCommand::AnimateContent { alpha, over } => {
                if let Some(slot) = self.slots.get(&toast) {
                    animate_content(slot, toast, alpha, over, self.handle.clone());
                }
            }
            ToastCommand::Hide => {
                if let Some(slot) = self.slots.get(&toast) {
                    slot.fade.stop();
                    if let Err(e) = slot.window.hide() {
                        tracing::warn!("[SLINT] failed to hide toast: {}", e);
                    }
                }
            }
            ToastCommand::Release => {
                if let Some(slot) = self.slots.remove(&toast) {
                    slot.fade.stop();
                }
            }
        }
    }

    fn present(&mut self, toast: ToastId, message: &str) {
        let window = match ToastWindow::new() {
            Ok(window) => window,
            Err(e) => {
                tracing::error!("[SLINT] failed to create toast window: {}", e);
                return;
            }
        };
        window.set_message(message.into());
        window.set_content_opacity(0.0);
        window.window().set_position(self.position(self.slots.len()));

        if let Err(e) = window.show() {
            tracing::error!("[SLINT] failed to show toast: {}", e);
        }
        self.slots.insert(
            toast,
            ToastSlot {
                window,
                fade: Rc::new(Timer::default()),
            },
        );
    }

    /// Top-centre of the anchor display, stacked below earlier toasts
    fn position(&self, index: usize) -> LogicalPosition {
        let (x, y, width) = match self.anchor {
            Some(frame) => (frame.x as f32, frame.y as f32, frame.width as f32),
            None => (0.0, 0.0, TOAST_WIDTH),
        };
        LogicalPosition::new(
            x + (width - TOAST_WIDTH).max(0.0) / 2.0,
            y + self.top_offset as f32 + index as f32 * (TOAST_HEIGHT + TOAST_GAP),
        )
    }
}

fn animate_content(slot: &ToastSlot, toast: ToastId, alpha: f32, over: Duration, handle: LoopHandle) {
    let done = if alpha >= 0.5 {
        ToastInput::FadedIn
    } else {
        ToastInput::FadedOut
    };

    if over.is_zero() {
        slot.window.set_content_opacity(alpha);
        handle.toast(toast, done);
        return;
    }

    let from = slot.window.get_content_opacity();
    let started = Instant::now();
    let window = slot.window.as_weak();
    let timer = Rc::downgrade(&slot.fade);

    slot.fade.start(TimerMode::Repeated, FRAME_PERIOD, move || {
        let progress = (started.elapsed().as_secs_f32() / over.as_secs_f32()).min(1.0);
        if let Some(window) = window.upgrade() {
            window.set_content_opacity(from + (alpha - from) * progress);
        }
        if progress >= 1.0 {
            if let Some(timer) = timer.upgrade() {
                timer.stop();
            }
            handle.toast(toast, done);
        }
    });
}
