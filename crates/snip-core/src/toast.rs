//! Transient notification toasts.
//!
//! Each toast is a small FSM: `Hidden → FadingIn → Visible → FadingOut →
//! Disposed`. Live toasts are held by a [`ToastRegistry`] from `show` until
//! one loop tick after their fade-out animation completed, so the surface is
//! never released while an animation may still reference it.

use std::collections::BTreeMap;
use std::time::Duration;

use snip_config::toast::ToastConfig;
use snip_types::ToastId;

use crate::effects::{Effects, TimerKey, ToastCommand};
use crate::events::{LoopEvent, ToastInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTiming {
    /// From show until the fade-out starts
    pub duration: Duration,
    pub fade: Duration,
}

impl From<&ToastConfig> for ToastTiming {
    fn from(config: &ToastConfig) -> Self {
        Self {
            duration: config.duration(),
            fade: config.fade(),
        }
    }
}

impl Default for ToastTiming {
    fn default() -> Self {
        Self::from(&ToastConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastState {
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
    Disposed,
}

#[derive(Debug)]
pub struct NotificationToast {
    id: ToastId,
    message: String,
    timing: ToastTiming,
    state: ToastState,
    fade_out_armed: bool,
    disposal_pending: bool,
}

impl NotificationToast {
    /// Register a new toast and start showing it
    pub fn show(
        registry: &mut ToastRegistry,
        message: impl Into<String>,
        timing: ToastTiming,
        fx: &mut Effects,
    ) -> ToastId {
        let id = registry.allocate();
        let mut toast = NotificationToast {
            id,
            message: message.into(),
            timing,
            state: ToastState::Hidden,
            fade_out_armed: false,
            disposal_pending: false,
        };
        toast.fade_in(fx);
        tracing::debug!(toast = %id, message = %toast.message, "toast shown");
        registry.insert(toast);
        id
    }

    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn state(&self) -> ToastState {
        self.state
    }

    fn fade_in(&mut self, fx: &mut Effects) {
        fx.toast(
            self.id,
            ToastCommand::Present {
                message: self.message.clone(),
            },
        );
        fx.toast(
            self.id,
            ToastCommand::AnimateContent {
                alpha: 1.0,
                over: self.timing.fade,
            },
        );
        self.fade_out_armed = true;
        fx.start_timer(TimerKey::Toast(self.id), self.timing.duration, false);
        self.state = ToastState::FadingIn;
    }

    /// Start fading out now, whether or not the display timer has fired
    pub fn fade_out(&mut self, fx: &mut Effects) {
        if !matches!(self.state, ToastState::FadingIn | ToastState::Visible) {
            return;
        }
        if self.fade_out_armed {
            self.fade_out_armed = false;
            fx.cancel_timer(TimerKey::Toast(self.id));
        }
        self.begin_fade_out(fx);
    }

    fn begin_fade_out(&mut self, fx: &mut Effects) {
        fx.toast(
            self.id,
            ToastCommand::AnimateContent {
                alpha: 0.0,
                over: self.timing.fade,
            },
        );
        self.state = ToastState::FadingOut;
    }

    pub fn handle(&mut self, input: ToastInput, fx: &mut Effects) {
        match (self.state, input) {
            (ToastState::FadingIn, ToastInput::FadedIn) => {
                self.state = ToastState::Visible;
            }
            (ToastState::FadingIn | ToastState::Visible, ToastInput::FadeOutDue) => {
                if !self.fade_out_armed {
                    return;
                }
                self.fade_out_armed = false;
                self.begin_fade_out(fx);
            }
            (ToastState::FadingIn | ToastState::Visible, ToastInput::Dismiss) => {
                self.fade_out(fx);
            }
            (ToastState::FadingOut, ToastInput::FadedOut) if !self.disposal_pending => {
                self.disposal_pending = true;
                fx.toast(self.id, ToastCommand::Hide);
                fx.defer(LoopEvent::Toast {
                    toast: self.id,
                    input: ToastInput::Dispose,
                });
            }
            (ToastState::FadingOut, ToastInput::Dispose) if self.disposal_pending => {
                self.state = ToastState::Disposed;
                fx.toast(self.id, ToastCommand::Release);
                tracing::debug!(toast = %self.id, "toast disposed");
            }
            (state, input) => {
                tracing::trace!(toast = %self.id, ?state, ?input, "stale toast event ignored");
            }
        }
    }
}

/// Strong owner of every live toast
#[derive(Debug, Default)]
pub struct ToastRegistry {
    next_id: u64,
    live: BTreeMap<ToastId, NotificationToast>,
}

impl ToastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> ToastId {
        self.next_id += 1;
        ToastId(self.next_id)
    }

    fn insert(&mut self, toast: NotificationToast) {
        self.live.insert(toast.id, toast);
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn get(&self, id: ToastId) -> Option<&NotificationToast> {
        self.live.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ToastId> + '_ {
        self.live.keys().copied()
    }

    /// Route an input to its toast, dropping the toast once disposed
    pub fn handle(&mut self, id: ToastId, input: ToastInput, fx: &mut Effects) {
        let Some(toast) = self.live.get_mut(&id) else {
            tracing::trace!(toast = %id, ?input, "event for unknown toast");
            return;
        };
        toast.handle(input, fx);
        if toast.state() == ToastState::Disposed {
            self.live.remove(&id);
        }
    }

    pub fn on_timer(&mut self, id: ToastId, fx: &mut Effects) {
        self.handle(id, ToastInput::FadeOutDue, fx);
    }

    pub fn dismiss_all(&mut self, fx: &mut Effects) {
        for toast in self.live.values_mut() {
            toast.fade_out(fx);
        }
    }
}
