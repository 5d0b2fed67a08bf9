use std::ffi::c_void;

use windows::Win32::{
    Foundation::HWND,
    UI::WindowsAndMessaging::{SWP_NOACTIVATE, SWP_NOZORDER, SetWindowPos},
};

use crate::shared::Bounds;

/// Moves the child window the engine creates inside the host window.
pub fn resize(window: *mut c_void, bounds: Bounds) -> windows::core::Result<()> {
    if window.is_null() || bounds.is_empty() {
        return Ok(());
    }

    unsafe {
        SetWindowPos(
            HWND(window),
            None,
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
            SWP_NOZORDER | SWP_NOACTIVATE,
        )
    }
}
