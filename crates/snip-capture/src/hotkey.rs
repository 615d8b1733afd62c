use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use snip_config::hotkey::HotkeyConfig;
use snip_core::LoopHandle;
use tokio_util::sync::CancellationToken;

/// Parse the configured accelerator, e.g. `ctrl+shift+KeyT`
pub fn parse_hotkey(config: &HotkeyConfig) -> Result<HotKey> {
    let accelerator = config.accelerator();
    HotKey::from_str(&accelerator).with_context(|| format!("Invalid hotkey '{accelerator}'"))
}

/// Keeps the capture hotkey registered for as long as it lives.
///
/// Must be created on the thread that runs the platform event loop.
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl HotkeyManager {
    pub fn register(config: &HotkeyConfig) -> Result<Self> {
        let hotkey = parse_hotkey(config)?;
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
        manager
            .register(hotkey)
            .context("Failed to register hotkey")?;

        tracing::info!(hotkey = %config.accelerator(), "capture hotkey registered");
        Ok(Self { manager, hotkey })
    }

    /// Get the hotkey ID for matching events
    pub fn id(&self) -> u32 {
        self.hotkey.id()
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        let _ = self.manager.unregister(self.hotkey);
    }
}

fn is_press(event: &GlobalHotKeyEvent, id: u32) -> bool {
    event.id == id && event.state == HotKeyState::Pressed
}

/// Poll hotkey events and post a capture trigger for every press of `id`
pub async fn listen_for_hotkey(
    id: u32,
    handle: LoopHandle,
    interval: Duration,
    cancel: CancellationToken,
) {
    let receiver = GlobalHotKeyEvent::receiver();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                while let Ok(event) = receiver.try_recv() {
                    if !is_press(&event, id) {
                        continue;
                    }
                    tracing::debug!("capture hotkey pressed");
                    if !handle.trigger() {
                        tracing::warn!("capture loop is gone, stopping hotkey listener");
                        return;
                    }
                }
            }
        }
    }
    tracing::debug!("hotkey listener stopped");
}

#[cfg(test)]
mod tests {
    use global_hotkey::hotkey::{Code, Modifiers};

    use super::*;

    #[test]
    fn default_accelerator_parses() {
        let hotkey = parse_hotkey(&HotkeyConfig::default()).unwrap();
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyT)
        );
    }

    #[test]
    fn bare_function_key_parses() {
        let config = HotkeyConfig {
            modifiers: String::new(),
            key: "F9".into(),
        };
        assert_eq!(parse_hotkey(&config).unwrap(), HotKey::new(None, Code::F9));
    }

    #[test]
    fn garbage_is_an_error() {
        let config = HotkeyConfig {
            modifiers: "hyper".into(),
            key: "???".into(),
        };
        assert!(parse_hotkey(&config).is_err());
    }

    #[test]
    fn only_presses_of_our_hotkey_count() {
        let hotkey = HotKey::new(None, Code::F9);
        let other = HotKey::new(None, Code::F10);
        let event = |id, state| GlobalHotKeyEvent { id, state };

        assert!(is_press(&event(hotkey.id(), HotKeyState::Pressed), hotkey.id()));
        assert!(!is_press(&event(hotkey.id(), HotKeyState::Released), hotkey.id()));
        assert!(!is_press(&event(other.id(), HotKeyState::Pressed), hotkey.id()));
    }
}
