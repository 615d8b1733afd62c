//! OS hooks the toolkit does not expose: focus signals, the system pointer
//! and a permission-free global pointer position.

use snip_core::FocusSignals;
use snip_types::Point;

pub use imp::*;

#[cfg(windows)]
mod imp {
    use windows::Win32::Foundation::{HWND, POINT};
    use windows::Win32::Graphics::Dwm::{DWMWA_CLOAKED, DwmGetWindowAttribute};
    use windows::Win32::System::Threading::GetCurrentProcessId;
    use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_ESCAPE};
    use windows::Win32::UI::WindowsAndMessaging::{
        FindWindowW, GetCursorPos, GetForegroundWindow, GetWindowThreadProcessId, IDC_CROSS,
        IsIconic, IsWindowVisible, LoadCursorW, SetCursor, SetForegroundWindow, ShowCursor,
    };
    use windows::core::{HSTRING, PCWSTR};

    use super::{FocusSignals, Point};

    fn find_surface(title: &str) -> Option<HWND> {
        unsafe { FindWindowW(PCWSTR::null(), &HSTRING::from(title)) }.ok()
    }

    fn is_cloaked(hwnd: HWND) -> bool {
        let mut cloaked: u32 = 0;
        unsafe {
            DwmGetWindowAttribute(
                hwnd,
                DWMWA_CLOAKED,
                &mut cloaked as *mut _ as *mut _,
                std::mem::size_of::<u32>() as u32,
            )
        }
        .is_ok()
            && cloaked != 0
    }

    pub fn focus_signals(title: &str, _visible: bool) -> FocusSignals {
        let Some(hwnd) = find_surface(title) else {
            return FocusSignals::default();
        };

        unsafe {
            let foreground = GetForegroundWindow();
            let mut foreground_pid = 0u32;
            GetWindowThreadProcessId(foreground, Some(&mut foreground_pid as *mut u32));

            FocusSignals {
                process_active: foreground_pid == GetCurrentProcessId(),
                surface_key: foreground == hwnd,
                surface_visible: IsWindowVisible(hwnd).as_bool() && !IsIconic(hwnd).as_bool(),
                on_active_workspace: !is_cloaked(hwnd),
            }
        }
    }

    pub fn request_focus(title: &str) {
        if let Some(hwnd) = find_surface(title) {
            let granted = unsafe { SetForegroundWindow(hwnd) }.as_bool();
            tracing::debug!(granted, "[SLINT] foreground requested");
        }
    }

    pub fn set_pointer_visible(visible: bool) {
        // ShowCursor keeps a display counter; one call per transition
        unsafe {
            ShowCursor(visible);
        }
    }

    pub fn assert_crosshair() {
        unsafe {
            if let Ok(cursor) = LoadCursorW(None, IDC_CROSS) {
                SetCursor(Some(cursor));
            }
        }
    }

    pub fn cursor_position() -> Option<Point> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .ok()
            .map(|_| Point::new(point.x, point.y))
    }

    pub fn escape_down() -> bool {
        unsafe { GetAsyncKeyState(VK_ESCAPE.0 as i32) < 0 }
    }

    pub const HAS_POINTER_MONITOR: bool = true;
}

#[cfg(not(windows))]
mod imp {
    use super::{FocusSignals, Point};

    /// Without a way to query the window manager, trust the toolkit's own
    /// view: a visible surface is assumed to have focus.
    pub fn focus_signals(_title: &str, visible: bool) -> FocusSignals {
        FocusSignals {
            surface_visible: visible,
            ..FocusSignals::ACQUIRED
        }
    }

    pub fn request_focus(_title: &str) {}

    pub fn set_pointer_visible(visible: bool) {
        tracing::debug!(visible, "[SLINT] system pointer visibility is not controllable here");
    }

    pub fn assert_crosshair() {}

    pub fn cursor_position() -> Option<Point> {
        None
    }

    pub fn escape_down() -> bool {
        false
    }

    pub const HAS_POINTER_MONITOR: bool = false;
}
