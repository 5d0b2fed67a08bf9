use std::sync::Arc;

use cef::{rc::*, *};
use cef_dll_sys::cef_log_severity_t::*;

use crate::{
    chromium::browser::BrowserDirectory,
    handlers::{ClientDispatch, ConsoleAction, ConsoleLevel, ConsoleMessage},
};

wrap_display_handler! {
    pub struct ChromiumDisplayHandler {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl DisplayHandler {
        fn on_console_message(
            &self,
            browser: Option<&mut Browser>,
            level: LogSeverity,
            message: Option<&CefString>,
            source: Option<&CefString>,
            line: ::std::os::raw::c_int,
        ) -> ::std::os::raw::c_int {
            let Some(browser) = browser else {
                return 0;
            };

            let level = match level.as_ref() {
                LOGSEVERITY_FATAL | LOGSEVERITY_ERROR => ConsoleLevel::Error,
                LOGSEVERITY_WARNING => ConsoleLevel::Warning,
                LOGSEVERITY_INFO => ConsoleLevel::Info,
                _ => ConsoleLevel::Debug,
            };

            let message = ConsoleMessage {
                level,
                message: message.map(|m| m.to_string()).unwrap_or_default(),
                source: source.map(|s| s.to_string()).unwrap_or_default(),
                line,
            };

            let browser = self.directory.resolve(browser);
            match self.dispatch.on_console_message(&browser, &message) {
                ConsoleAction::Propagate => 0,
                ConsoleAction::Suppress => 1,
            }
        }
    }
}
