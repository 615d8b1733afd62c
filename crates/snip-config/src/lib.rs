use std::env;

use serde::{Deserialize, Serialize};

use self::hotkey::HotkeyConfig;
use self::log::{LogConfig, LogFormat};
use self::ocr::OcrConfig;
use self::overlay::OverlayConfig;
use self::toast::ToastConfig;

pub mod hotkey;
pub mod log;
pub mod ocr;
pub mod overlay;
pub mod toast;

fn default_delta_time() -> u64 {
    50
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub overlay: OverlayConfig,
    pub toast: ToastConfig,
    pub hotkey: HotkeyConfig,
    pub ocr: OcrConfig,
    pub log: LogConfig,

    /// Hotkey poll interval in milliseconds
    #[serde(default = "default_delta_time")]
    pub delta_time: u64,
}

impl Config {
    /// Apply overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply `SNIP_*` style overrides from `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());

        if let Some(ms) = number("SNIP_TOAST_MS") {
            self.toast.duration_ms = ms;
        }
        if let Some(ms) = number("SNIP_ACTIVATION_PROBE_MS") {
            self.overlay.activation_probe_ms = ms;
        }
        if let Some(ms) = number("SNIP_PROMOTION_PROBE_MS") {
            self.overlay.promotion_probe_ms = ms;
        }
        if let Some(ms) = number("DELTA_TIME_MS") {
            self.delta_time = ms;
        }
        if let Some(language) = lookup("SNIP_OCR_LANGUAGE") {
            self.ocr.language = language;
        }
        if let Some(level) = lookup("SNIP_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = lookup("SNIP_LOG_FORMAT").as_deref().and_then(LogFormat::parse) {
            self.log.format = format;
        }

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay: OverlayConfig::default(),
            toast: ToastConfig::default(),
            hotkey: HotkeyConfig::default(),
            ocr: OcrConfig::default(),
            log: LogConfig::default(),
            delta_time: default_delta_time(),
        }
    }
}
