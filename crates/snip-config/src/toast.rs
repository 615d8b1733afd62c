use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_duration_ms() -> u64 {
    2000
}

fn default_fade_ms() -> u64 {
    200
}

fn default_top_offset() -> u32 {
    48
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ToastConfig {
    /// Time from show until fade-out begins
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
    /// Distance from the top edge of the primary display
    #[serde(default = "default_top_offset")]
    pub top_offset: u32,
}

impl ToastConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            fade_ms: default_fade_ms(),
            top_offset: default_top_offset(),
        }
    }
}
