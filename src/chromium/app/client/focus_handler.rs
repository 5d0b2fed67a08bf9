use std::sync::Arc;

use cef::{rc::*, *};

use crate::{chromium::browser::BrowserDirectory, handlers::ClientDispatch};

wrap_focus_handler! {
    pub struct ChromiumFocusHandler {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl FocusHandler {
        fn on_got_focus(&self, browser: Option<&mut Browser>) {
            if let Some(browser) = browser {
                let browser = self.directory.resolve(browser);
                self.dispatch.on_got_focus(&browser);
            }
        }
    }
}
