use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::{
    bridge::{
        Argument, BindingTable, BridgeError, CallContext, HostObject, PrintFunction, ScriptCallback,
    },
    constants::APP_NAME,
    navigation::html_to_data_uri,
};

const FROM_SCRIPT: &str = "Called from script. Will call script callback now.";

fn string_arg(name: &str, args: &[Argument], index: usize) -> Result<String, BridgeError> {
    args.get(index)
        .and_then(Argument::as_str)
        .map(str::to_owned)
        .ok_or(BridgeError::InvalidArgument {
            name: name.to_owned(),
            index,
            reason: "expected a string",
        })
}

fn callback_arg(
    name: &str,
    args: Vec<Argument>,
    index: usize,
) -> Result<ScriptCallback, BridgeError> {
    args.into_iter()
        .nth(index)
        .and_then(Argument::into_callback)
        .ok_or(BridgeError::InvalidArgument {
            name: name.to_owned(),
            index,
            reason: "expected a function",
        })
}

/// Host object exposed to script as `external`.
pub struct External {
    printer: PrintFunction,
}

impl HostObject for External {
    fn methods(&self) -> &[&'static str] {
        &["test_multiple_callbacks"]
    }

    fn call(
        &self,
        method: &str,
        context: &CallContext,
        args: Vec<Argument>,
    ) -> Result<(), BridgeError> {
        match method {
            "test_multiple_callbacks" => {
                let callback = callback_arg(method, args, 0)?;

                if let Some(browser) = context.browser() {
                    self.printer.print(&browser, method, FROM_SCRIPT);
                }

                let printer = self.printer.clone();
                let browser = context.browser().map(|browser| Arc::downgrade(&browser));

                callback.call_with_reply(
                    vec![Value::from("String sent from the host")],
                    move |reply| {
                        let Some(browser) = browser.and_then(|browser| browser.upgrade()) else {
                            return;
                        };
                        let message = match reply.first() {
                            Some(Value::String(text)) => text.clone(),
                            Some(value) => value.to_string(),
                            None => String::new(),
                        };
                        printer.print(&browser, "host_callback", &message);
                    },
                );

                Ok(())
            }
            _ => Err(BridgeError::UnknownMethod {
                object: "external".to_owned(),
                method: method.to_owned(),
            }),
        }
    }
}

/// Bindings installed into every page by the shell binary.
pub fn default_bindings(
    printer: PrintFunction,
    engine_version: &str,
    bind_to_frames: bool,
) -> Result<BindingTable, BridgeError> {
    let data_uri_printer = printer.clone();

    BindingTable::builder()
        .property("host_property", "This property was set on the host")
        .property("engine_version", engine_version)
        .property("host_name", APP_NAME)
        .function(
            "host_function",
            |context: &CallContext, _: Vec<Argument>| -> Result<(), BridgeError> {
                info!("Host function called from browser {}", context.browser_id());
                Ok(())
            },
        )
        .function(
            "html_to_data_uri",
            move |context: &CallContext, args: Vec<Argument>| -> Result<(), BridgeError> {
                let html = string_arg("html_to_data_uri", &args, 0)?;
                let callback = callback_arg("html_to_data_uri", args, 1)?;

                if let Some(browser) = context.browser() {
                    data_uri_printer.print(&browser, "html_to_data_uri", FROM_SCRIPT);
                }

                callback.call(vec![Value::from(html_to_data_uri(&html))]);
                Ok(())
            },
        )
        .object("external", External { printer })
        .bind_to_frames(bind_to_frames)
        .build()
}
