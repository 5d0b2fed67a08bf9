use cef::{rc::*, *};
use tracing::error;

use super::v8_handler::ChromiumV8Handler;
use crate::chromium::config::IPC_SENDER;

wrap_render_process_handler! {
    pub struct ChromiumRenderProcessHandler {}

    impl RenderProcessHandler {
        fn on_context_created(
            &self,
            _browser: Option<&mut Browser>,
            _frame: Option<&mut Frame>,
            context: Option<&mut V8Context>,
        ) {
            let Some(context) = context else {
                return;
            };

            let name = CefString::from(IPC_SENDER);
            let mut handler = ChromiumV8Handler::new();

            let Some(mut function) = v8_value_create_function(Some(&name), Some(&mut handler))
            else {
                error!("Failed to create {IPC_SENDER} function");
                return;
            };

            let Some(global) = context.global() else {
                error!("No global object in the new context");
                return;
            };

            global.set_value_bykey(
                Some(&name),
                Some(&mut function),
                V8Propertyattribute::default(),
            );
        }
    }
}
