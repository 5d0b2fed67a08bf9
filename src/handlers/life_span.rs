use std::sync::Mutex;

use tracing::debug;

use super::LifeSpanHandler;
use crate::{
    bridge::PagePrinter,
    engine::{BrowserRef, Quitter},
};

/// Prints the browser identifier into the page once its bindings are usable.
pub struct AfterCreatedAnnouncer {
    printer: PagePrinter,
}

impl AfterCreatedAnnouncer {
    pub fn new(printer: PagePrinter) -> Self {
        Self { printer }
    }
}

impl LifeSpanHandler for AfterCreatedAnnouncer {
    fn on_after_created(&self, browser: &BrowserRef) {
        self.printer.print_when_ready(
            browser,
            "OnAfterCreated",
            &format!("Browser id={}", browser.id()),
        );
    }
}

/// Stops a blocking message loop when its browser is about to close.
pub struct QuitOnClose {
    quitter: Mutex<Option<Quitter>>,
}

impl QuitOnClose {
    pub fn new(quitter: Quitter) -> Self {
        Self {
            quitter: Mutex::new(Some(quitter)),
        }
    }
}

impl LifeSpanHandler for QuitOnClose {
    fn on_before_close(&self, browser: &BrowserRef) {
        let quitter = self.quitter.lock().ok().and_then(|mut quitter| quitter.take());

        if let Some(quit) = quitter {
            debug!("Browser {} closing, quitting message loop", browser.id());
            quit();
        }
    }
}
