//! Pointer affordance strategies for the selection surface.
//!
//! `NativePointerTracking` lets the toolkit own the crosshair once the
//! surface has input focus. `FallbackPointerTracking` is used when focus
//! could not be acquired: the system pointer is hidden and the surface draws
//! its own crosshair wherever the global pointer monitor says the pointer is.

use std::fmt;
use std::time::Duration;

use snip_types::{Point, SessionId};

use crate::effects::{Effects, OverlayTimer, SurfaceCommand, TimerKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMode {
    Native,
    Fallback,
}

impl fmt::Display for PointerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerMode::Native => f.write_str("native"),
            PointerMode::Fallback => f.write_str("fallback"),
        }
    }
}

/// Where a strategy writes its surface commands and timers
pub struct TrackingContext<'a> {
    pub session: SessionId,
    pub cursor_guard: Duration,
    pub fx: &'a mut Effects,
}

impl TrackingContext<'_> {
    fn surface(&mut self, command: SurfaceCommand) {
        self.fx.surface(self.session, command);
    }

    fn guard_key(&self) -> TimerKey {
        TimerKey::Overlay(self.session, OverlayTimer::CursorGuard)
    }
}

pub trait PointerTracking: Send + fmt::Debug {
    fn mode(&self) -> PointerMode;

    /// Take over pointer affordance for the surface
    fn engage(&mut self, ctx: &mut TrackingContext<'_>);

    /// Latest pointer position in surface-local coordinates
    fn pointer_at(&mut self, _local: Point, _ctx: &mut TrackingContext<'_>) {}

    /// The toolkit reported its own cursor update
    fn native_cursor_updated(&mut self, _ctx: &mut TrackingContext<'_>) {}

    fn guard_tick(&mut self, _ctx: &mut TrackingContext<'_>) {}

    /// Undo everything `engage` did. Safe to call more than once.
    fn release(&mut self, ctx: &mut TrackingContext<'_>);
}

/// Toolkit-managed crosshair with a re-assert guard.
///
/// Some toolkits silently revert a freshly registered hover cursor to the
/// default arrow. The guard timer keeps forcing the crosshair until the first
/// native cursor update proves the toolkit has taken ownership.
#[derive(Debug, Default)]
pub struct NativePointerTracking {
    guard_armed: bool,
    confirmed: bool,
}

impl NativePointerTracking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    fn disarm(&mut self, ctx: &mut TrackingContext<'_>) {
        if self.guard_armed {
            self.guard_armed = false;
            let key = ctx.guard_key();
            ctx.fx.cancel_timer(key);
        }
    }
}

impl PointerTracking for NativePointerTracking {
    fn mode(&self) -> PointerMode {
        PointerMode::Native
    }

    fn engage(&mut self, ctx: &mut TrackingContext<'_>) {
        ctx.surface(SurfaceCommand::SetNativeCrosshair(true));
        ctx.surface(SurfaceCommand::AssertCrosshair);
        if !self.confirmed && !self.guard_armed {
            self.guard_armed = true;
            let key = ctx.guard_key();
            ctx.fx.start_timer(key, ctx.cursor_guard, true);
        }
    }

    fn native_cursor_updated(&mut self, ctx: &mut TrackingContext<'_>) {
        if !self.confirmed {
            tracing::debug!(session = %ctx.session, "toolkit owns the crosshair");
            self.confirmed = true;
            self.disarm(ctx);
        }
    }

    fn guard_tick(&mut self, ctx: &mut TrackingContext<'_>) {
        if self.guard_armed && !self.confirmed {
            ctx.surface(SurfaceCommand::AssertCrosshair);
        }
    }

    fn release(&mut self, ctx: &mut TrackingContext<'_>) {
        self.disarm(ctx);
    }
}

/// Self-drawn crosshair fed by a permission-free global pointer monitor
#[derive(Debug, Default)]
pub struct FallbackPointerTracking {
    last: Option<Point>,
    pointer_hidden: bool,
    monitoring: bool,
    restored: u32,
}

impl FallbackPointerTracking {
    pub fn new(last: Option<Point>) -> Self {
        Self {
            last,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn last_position(&self) -> Option<Point> {
        self.last
    }

    /// How many times the system pointer was made visible again
    #[cfg(test)]
    pub fn restore_count(&self) -> u32 {
        self.restored
    }
}

impl PointerTracking for FallbackPointerTracking {
    fn mode(&self) -> PointerMode {
        PointerMode::Fallback
    }

    fn engage(&mut self, ctx: &mut TrackingContext<'_>) {
        if !self.pointer_hidden {
            self.pointer_hidden = true;
            ctx.surface(SurfaceCommand::SetSystemPointerVisible(false));
        }
        if !self.monitoring {
            self.monitoring = true;
            ctx.surface(SurfaceCommand::StartPointerMonitor);
        }
        if let Some(at) = self.last {
            ctx.surface(SurfaceCommand::DrawCrosshair(Some(at)));
        }
    }

    fn pointer_at(&mut self, local: Point, ctx: &mut TrackingContext<'_>) {
        if self.last == Some(local) {
            return;
        }
        self.last = Some(local);
        if self.pointer_hidden {
            ctx.surface(SurfaceCommand::DrawCrosshair(Some(local)));
        }
    }

    fn release(&mut self, ctx: &mut TrackingContext<'_>) {
        if self.monitoring {
            self.monitoring = false;
            ctx.surface(SurfaceCommand::StopPointerMonitor);
        }
        if self.pointer_hidden {
            self.pointer_hidden = false;
            self.restored += 1;
            ctx.surface(SurfaceCommand::DrawCrosshair(None));
            ctx.surface(SurfaceCommand::SetSystemPointerVisible(true));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effect;

    fn ctx(session: SessionId, fx: &mut Effects) -> TrackingContext<'_> {
        TrackingContext {
            session,
            cursor_guard: Duration::from_millis(16),
            fx,
        }
    }

    #[test]
    fn native_guard_reasserts_until_confirmed() {
        let session = SessionId::new();
        let mut fx = Effects::new();
        let mut native = NativePointerTracking::new();

        native.engage(&mut ctx(session, &mut fx));
        assert!(fx.iter().any(|e| matches!(e, Effect::StartTimer { repeat: true, .. })));

        fx = Effects::new();
        native.guard_tick(&mut ctx(session, &mut fx));
        assert_eq!(fx.surface_commands(session), vec![&SurfaceCommand::AssertCrosshair]);

        fx = Effects::new();
        native.native_cursor_updated(&mut ctx(session, &mut fx));
        assert!(native.is_confirmed());
        assert!(fx.iter().any(|e| matches!(e, Effect::CancelTimer(_))));

        fx = Effects::new();
        native.guard_tick(&mut ctx(session, &mut fx));
        assert!(fx.is_empty());
    }

    #[test]
    fn fallback_restores_pointer_once() {
        let session = SessionId::new();
        let mut fx = Effects::new();
        let mut fallback = FallbackPointerTracking::new(None);

        fallback.engage(&mut ctx(session, &mut fx));
        fallback.release(&mut ctx(session, &mut fx));
        fallback.release(&mut ctx(session, &mut fx));

        let shows = fx
            .surface_commands(session)
            .into_iter()
            .filter(|c| **c == SurfaceCommand::SetSystemPointerVisible(true))
            .count();
        assert_eq!(shows, 1);
        assert_eq!(fallback.restore_count(), 1);
    }

    #[test]
    fn fallback_draws_crosshair_at_pointer() {
        let session = SessionId::new();
        let mut fx = Effects::new();
        let mut fallback = FallbackPointerTracking::new(Some(Point::new(5, 5)));

        fallback.engage(&mut ctx(session, &mut fx));
        fallback.pointer_at(Point::new(40, 60), &mut ctx(session, &mut fx));

        let commands = fx.surface_commands(session);
        assert_eq!(
            commands,
            vec![
                &SurfaceCommand::SetSystemPointerVisible(false),
                &SurfaceCommand::StartPointerMonitor,
                &SurfaceCommand::DrawCrosshair(Some(Point::new(5, 5))),
                &SurfaceCommand::DrawCrosshair(Some(Point::new(40, 60))),
            ]
        );
        assert_eq!(fallback.last_position(), Some(Point::new(40, 60)));
    }
}
