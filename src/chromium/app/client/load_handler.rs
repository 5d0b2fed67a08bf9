use std::sync::Arc;

use cef::{rc::*, *};

use crate::{
    chromium::browser::BrowserDirectory,
    handlers::{ClientDispatch, FrameKind, LoadingState},
};

wrap_load_handler! {
    pub struct ChromiumLoadHandler {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl LoadHandler {
        fn on_load_start(
            &self,
            browser: Option<&mut Browser>,
            frame: Option<&mut Frame>,
            _transition_type: TransitionType,
        ) {
            let (Some(browser), Some(frame)) = (browser, frame) else {
                return;
            };

            let kind = match frame.is_main() {
                1 => FrameKind::Main,
                _ => FrameKind::Sub,
            };

            let browser = self.directory.resolve(browser);
            if let Some(script) = self.dispatch.on_load_start(&browser, kind) {
                let code = CefString::from(script.as_str());
                frame.execute_java_script(Some(&code), None, 0);
            }
        }

        fn on_loading_state_change(
            &self,
            browser: Option<&mut Browser>,
            is_loading: ::std::os::raw::c_int,
            _can_go_back: ::std::os::raw::c_int,
            _can_go_forward: ::std::os::raw::c_int,
        ) {
            if let Some(browser) = browser {
                let browser = self.directory.resolve(browser);
                self.dispatch
                    .on_loading_state_change(&browser, LoadingState::from(is_loading == 1));
            }
        }
    }
}
