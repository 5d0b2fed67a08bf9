use std::sync::Arc;

use cef::{rc::*, *};
use cef_dll_sys::cef_return_value_t;

use crate::{
    chromium::browser::{BrowserDirectory, CefRequest},
    handlers::{ClientDispatch, ResourceAction},
};

wrap_request_handler! {
    pub struct ChromiumRequestHandler {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl RequestHandler {
        fn resource_request_handler(
            &self,
            _browser: Option<&mut Browser>,
            _frame: Option<&mut Frame>,
            _request: Option<&mut Request>,
            _is_navigation: ::std::os::raw::c_int,
            _is_download: ::std::os::raw::c_int,
            _request_initiator: Option<&CefString>,
            _disable_default_handling: Option<&mut ::std::os::raw::c_int>,
        ) -> Option<ResourceRequestHandler> {
            Some(ChromiumResourceRequestHandler::new(
                self.dispatch.clone(),
                self.directory.clone(),
            ))
        }
    }
}

wrap_resource_request_handler! {
    pub struct ChromiumResourceRequestHandler {
        dispatch: Arc<ClientDispatch>,
        directory: Arc<BrowserDirectory>,
    }

    impl ResourceRequestHandler {
        fn on_before_resource_load(
            &self,
            browser: Option<&mut Browser>,
            _frame: Option<&mut Frame>,
            request: Option<&mut Request>,
            _callback: Option<&mut Callback>,
        ) -> ReturnValue {
            let (Some(browser), Some(request)) = (browser, request) else {
                return ReturnValue::from(cef_return_value_t::RV_CONTINUE);
            };

            let browser = self.directory.resolve(browser);
            let mut request = CefRequest::new(request);

            match self.dispatch.on_before_resource_load(&browser, &mut request) {
                ResourceAction::Continue => ReturnValue::from(cef_return_value_t::RV_CONTINUE),
                ResourceAction::Cancel => ReturnValue::from(cef_return_value_t::RV_CANCEL),
            }
        }
    }
}
