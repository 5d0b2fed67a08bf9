use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{ConsoleAction, ConsoleLevel, ConsoleMessage, DisplayHandler};
use crate::{bridge::PagePrinter, engine::BrowserRef};

/// Where intercepted console messages are reported.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, message: &ConsoleMessage);
}

/// Logs console messages under the `browser` target.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, message: &ConsoleMessage) {
        let ConsoleMessage {
            level,
            message,
            source,
            line,
        } = message;

        match level {
            ConsoleLevel::Debug => debug!(target: "browser", "{source}:{line} {message}"),
            ConsoleLevel::Info => info!(target: "browser", "{source}:{line} {message}"),
            ConsoleLevel::Warning => warn!(target: "browser", "{source}:{line} {message}"),
            ConsoleLevel::Error => error!(target: "browser", "{source}:{line} {message}"),
        }
    }
}

/// Number of forwarded messages remembered for echo detection.
const FORWARDED_CAPACITY: usize = 32;

struct Forwarded {
    /// Lowercased text as written into the page, raw and as a script string literal.
    patterns: [String; 2],
    echoed: bool,
}

impl Forwarded {
    fn new(message: &str) -> Self {
        let raw = message.to_lowercase();
        let literal = Value::from(raw.as_str()).to_string();
        let escaped = literal[1..literal.len() - 1].to_owned();

        Self {
            patterns: [raw, escaped],
            echoed: false,
        }
    }

    fn is_echoed_by(&self, text: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && text.contains(pattern.as_str()))
    }
}

/// Catches console messages matching any filter, reports them and echoes them into the page.
///
/// Whatever the page prints in response is not intercepted again: a console
/// message containing a forwarded message is reported once and suppressed.
pub struct ConsoleInterceptor<S: DiagnosticSink = TracingSink> {
    filters: Vec<String>,
    printer: PagePrinter,
    sink: S,
    printer_missing: AtomicBool,
    forwarded: Mutex<VecDeque<Forwarded>>,
}

impl ConsoleInterceptor<TracingSink> {
    pub fn new<I, T>(filters: I, printer: PagePrinter) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self::with_sink(filters, printer, TracingSink)
    }
}

impl<S: DiagnosticSink> ConsoleInterceptor<S> {
    pub fn with_sink<I, T>(filters: I, printer: PagePrinter, sink: S) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            filters: filters
                .into_iter()
                .map(|filter| filter.as_ref().to_lowercase())
                .collect(),
            printer,
            sink,
            printer_missing: AtomicBool::new(false),
            forwarded: Mutex::default(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.filters.iter().any(|filter| text.contains(filter))
    }

    /// Returns whether `text` repeats a forwarded message, and whether this is its first echo.
    fn echo(&self, text: &str) -> Option<bool> {
        let Ok(mut forwarded) = self.forwarded.lock() else {
            error!("Failed to lock forwarded console messages");
            return None;
        };

        let entry = forwarded
            .iter_mut()
            .find(|forwarded| forwarded.is_echoed_by(text))?;

        Some(!std::mem::replace(&mut entry.echoed, true))
    }

    fn remember(&self, message: &str) {
        if let Ok(mut forwarded) = self.forwarded.lock() {
            if forwarded.len() == FORWARDED_CAPACITY {
                forwarded.pop_front();
            }
            forwarded.push_back(Forwarded::new(message));
        }
    }
}

impl<S: DiagnosticSink> DisplayHandler for ConsoleInterceptor<S> {
    fn on_console_message(&self, browser: &BrowserRef, message: &ConsoleMessage) -> ConsoleAction {
        let text = message.message.to_lowercase();

        // Printing the report would fail again with the same message.
        if text.contains(&self.printer.undefined_marker()) {
            if !self.printer_missing.swap(true, Ordering::SeqCst) {
                self.sink.report(message);
            }
            return ConsoleAction::Suppress;
        }

        if !self.matches(&text) {
            return ConsoleAction::Propagate;
        }

        if let Some(first) = self.echo(&text) {
            if first {
                self.sink.report(message);
            }
            return ConsoleAction::Suppress;
        }

        self.sink.report(message);
        self.remember(&message.message);
        self.printer
            .print_when_ready(browser, "OnConsoleMessage", &message.message);

        ConsoleAction::Propagate
    }
}
