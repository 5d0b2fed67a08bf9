use super::FocusHandler;
use crate::{engine::BrowserRef, shared::Platform};

/// Gives keyboard focus back to the browser when it reports focus but the
/// window system did not deliver it.
pub struct FocusFix {
    platform: Platform,
}

impl FocusFix {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl FocusHandler for FocusFix {
    fn on_got_focus(&self, browser: &BrowserRef) {
        if self.platform.needs_focus_fix() {
            browser.set_focus(true);
        }
    }
}
