use super::{FrameKind, LoadHandler, LoadingState};
use crate::{bridge::PagePrinter, engine::BrowserRef};

/// Reports finished loads to the page and applies a zoom step whenever the main frame starts loading.
pub struct PageLoadHandler {
    printer: PagePrinter,
    zoom_delta: f64,
}

impl PageLoadHandler {
    pub fn new(printer: PagePrinter, zoom_delta: f64) -> Self {
        Self {
            printer,
            zoom_delta,
        }
    }
}

impl LoadHandler for PageLoadHandler {
    fn on_load_start(&self, browser: &BrowserRef, frame: FrameKind) {
        if frame == FrameKind::Main && self.zoom_delta != 0.0 {
            browser.set_zoom_level(browser.zoom_level() + self.zoom_delta);
        }
    }

    fn on_loading_state_change(&self, browser: &BrowserRef, state: LoadingState) {
        if state == LoadingState::Finished {
            self.printer
                .print_when_ready(browser, "OnLoadingStateChange", "Loading is complete");
        }
    }
}
