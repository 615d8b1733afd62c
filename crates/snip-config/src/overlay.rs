use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_activation_probe_ms() -> u64 {
    200
}

fn default_promotion_probe_ms() -> u64 {
    50
}

fn default_cursor_guard_ms() -> u64 {
    16
}

fn default_dim_alpha() -> f32 {
    0.35
}

/// Selection overlay tunables.
///
/// The probe delays work around focus arbitration quirks and are not a
/// platform guarantee; adjust them per machine if activation misfires.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Wait after presenting before checking whether focus was acquired
    #[serde(default = "default_activation_probe_ms")]
    pub activation_probe_ms: u64,
    /// Poll interval while trying to promote fallback to native tracking
    #[serde(default = "default_promotion_probe_ms")]
    pub promotion_probe_ms: u64,
    /// Crosshair re-assert period until the toolkit owns the cursor
    #[serde(default = "default_cursor_guard_ms")]
    pub cursor_guard_ms: u64,
    /// Opacity of the dimming layer
    #[serde(default = "default_dim_alpha")]
    pub dim_alpha: f32,
}

impl OverlayConfig {
    pub fn activation_probe(&self) -> Duration {
        Duration::from_millis(self.activation_probe_ms)
    }

    pub fn promotion_probe(&self) -> Duration {
        Duration::from_millis(self.promotion_probe_ms)
    }

    pub fn cursor_guard(&self) -> Duration {
        Duration::from_millis(self.cursor_guard_ms)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            activation_probe_ms: default_activation_probe_ms(),
            promotion_probe_ms: default_promotion_probe_ms(),
            cursor_guard_ms: default_cursor_guard_ms(),
            dim_alpha: default_dim_alpha(),
        }
    }
}
