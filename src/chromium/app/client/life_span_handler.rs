use std::sync::Arc;

use cef::{rc::*, *};

use crate::{chromium::browser::BrowserDirectory, handlers::ClientDispatch};

wrap_life_span_handler! {
    pub struct ChromiumLifeSpanHandler {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl LifeSpanHandler {
        fn on_after_created(&self, browser: Option<&mut Browser>) {
            if let Some(browser) = browser {
                let browser = self.directory.resolve(browser);
                self.dispatch.on_after_created(&browser);
            }
        }

        fn on_before_close(&self, browser: Option<&mut Browser>) {
            if let Some(browser) = browser {
                let browser = self.directory.resolve(browser);
                self.dispatch.on_before_close(&browser);
                self.directory.forget(browser.id());
            }
        }
    }
}
