mod display_handler;
mod focus_handler;
mod life_span_handler;
mod load_handler;
mod request_handler;

use std::sync::Arc;

use cef::{rc::*, *};
use tracing::warn;

use crate::{
    chromium::{browser::BrowserDirectory, config::IPC_MESSAGE},
    handlers::ClientDispatch,
};
use display_handler::ChromiumDisplayHandler;
use focus_handler::ChromiumFocusHandler;
use life_span_handler::ChromiumLifeSpanHandler;
use load_handler::ChromiumLoadHandler;
use request_handler::ChromiumRequestHandler;

wrap_client! {
    pub struct ChromiumClient {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl Client {
        fn life_span_handler(&self) -> Option<LifeSpanHandler> {
            Some(ChromiumLifeSpanHandler::new(
                self.dispatch.clone(),
                self.directory.clone(),
            ))
        }

        fn load_handler(&self) -> Option<LoadHandler> {
            Some(ChromiumLoadHandler::new(
                self.dispatch.clone(),
                self.directory.clone(),
            ))
        }

        fn display_handler(&self) -> Option<DisplayHandler> {
            Some(ChromiumDisplayHandler::new(
                self.dispatch.clone(),
                self.directory.clone(),
            ))
        }

        fn focus_handler(&self) -> Option<FocusHandler> {
            Some(ChromiumFocusHandler::new(
                self.dispatch.clone(),
                self.directory.clone(),
            ))
        }

        fn request_handler(&self) -> Option<RequestHandler> {
            Some(ChromiumRequestHandler::new(
                self.dispatch.clone(),
                self.directory.clone(),
            ))
        }

        fn on_process_message_received(
            &self,
            browser: Option<&mut Browser>,
            _frame: Option<&mut Frame>,
            _source_process: ProcessId,
            message: Option<&mut ProcessMessage>,
        ) -> ::std::os::raw::c_int {
            let (Some(browser), Some(message)) = (browser, message) else {
                return 0;
            };

            if CefString::from(&message.name()).to_string() != IPC_MESSAGE {
                return 0;
            }

            let Some(payload) = message
                .argument_list()
                .map(|arguments| CefString::from(&arguments.string(0)).to_string())
            else {
                warn!("Bridge message without payload");
                return 1;
            };

            let browser = self.directory.resolve(browser);
            self.dispatch.on_bridge_message(&browser, &payload);

            1
        }
    }
}
