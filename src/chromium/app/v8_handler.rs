use cef::{rc::*, *};
use cef_dll_sys::cef_process_id_t;
use tracing::error;

use crate::chromium::config::{IPC_MESSAGE, IPC_SENDER};

wrap_v8_handler! {
    pub struct ChromiumV8Handler {}

    impl V8Handler {
        fn execute(
            &self,
            name: Option<&CefString>,
            _object: Option<&mut V8Value>,
            arguments: Option<&[Option<V8Value>]>,
            _retval: Option<&mut Option<V8Value>>,
            _exception: Option<&mut CefString>,
        ) -> ::std::os::raw::c_int {
            if name.map(|name| name.to_string()).as_deref() != Some(IPC_SENDER) {
                return 0;
            }

            let Some(payload) = arguments
                .and_then(|args| args.first())
                .and_then(|arg| arg.as_ref())
                .filter(|arg| arg.is_string() == 1)
                .map(|arg| CefString::from(&arg.string_value()).to_string())
            else {
                error!("{IPC_SENDER} expects a string argument");
                return 0;
            };

            let Some(mut message) = process_message_create(Some(&CefString::from(IPC_MESSAGE)))
            else {
                error!("Failed to create process message");
                return 0;
            };

            if let Some(arguments) = message.argument_list() {
                arguments.set_string(0, Some(&CefString::from(payload.as_str())));
            }

            let Some(frame) = v8_context_get_current_context().and_then(|context| context.frame())
            else {
                error!("No current V8 context for {IPC_SENDER}");
                return 0;
            };

            frame.send_process_message(
                ProcessId::from(cef_process_id_t::PID_BROWSER),
                Some(&mut message),
            );

            1
        }
    }
}
