#[cfg(windows)]
mod apartment;
mod capture;
mod hotkey;
mod ocr;

pub use capture::{ScreenCapture, encode_png, monitor_frames, primary_frame};
pub use hotkey::{HotkeyManager, listen_for_hotkey, parse_hotkey};
pub use ocr::SystemRecognizer;
