use std::sync::Arc;

use serde_json::Value;

use super::Bridge;
use crate::engine::BrowserRef;

/// A page-defined function called as `name(language, event, message)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintFunction {
    name: String,
    language: String,
}

impl PrintFunction {
    pub fn new(name: &str, language: &str) -> Self {
        Self {
            name: name.to_owned(),
            language: language.to_owned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self, event: &str, message: &str) -> String {
        let args = [
            Value::from(self.language.as_str()),
            Value::from(event),
            Value::from(message),
        ]
        .map(|arg| arg.to_string());

        format!("{}({});", self.name, args.join(", "))
    }

    pub fn print(&self, browser: &BrowserRef, event: &str, message: &str) {
        browser.execute_script(&self.script(event, message));
    }
}

/// Writes host diagnostics into the page through its print function.
#[derive(Clone)]
pub struct PagePrinter {
    bridge: Bridge,
    function: PrintFunction,
}

impl PagePrinter {
    pub fn new(bridge: Bridge, function: &str, language: &str) -> Self {
        Self {
            bridge,
            function: PrintFunction::new(function, language),
        }
    }

    pub fn function(&self) -> &str {
        self.function.name()
    }

    /// The error the page reports when it does not define the print function.
    pub fn undefined_marker(&self) -> String {
        format!("{} is not defined", self.function.name()).to_lowercase()
    }

    pub fn script(&self, event: &str, message: &str) -> String {
        self.function.script(event, message)
    }

    pub fn print(&self, browser: &BrowserRef, event: &str, message: &str) {
        self.function.print(browser, event, message);
    }

    /// Prints once the bridge reports the page is ready, without keeping the browser alive.
    pub fn print_when_ready(&self, browser: &BrowserRef, event: &str, message: &str) {
        let weak = Arc::downgrade(browser);
        let script = self.script(event, message);

        self.bridge.readiness(browser.id()).when_ready(move || {
            if let Some(browser) = weak.upgrade() {
                browser.execute_script(&script);
            }
        });
    }
}
