mod dispatch;
mod display;
mod focus;
mod life_span;
mod load;
mod request;

use std::sync::Arc;

use crate::engine::{BrowserRef, Request};

pub use dispatch::ClientDispatch;
pub use display::{ConsoleInterceptor, DiagnosticSink, TracingSink};
pub use focus::FocusFix;
pub use life_span::{AfterCreatedAnnouncer, QuitOnClose};
pub use load::PageLoadHandler;
pub use request::HeaderRewriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Main,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Started,
    Finished,
}

impl From<bool> for LoadingState {
    fn from(is_loading: bool) -> Self {
        match is_loading {
            true => LoadingState::Started,
            false => LoadingState::Finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConsoleLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub source: String,
    pub line: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Let the engine print the message as well.
    Propagate,
    Suppress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Continue,
    Cancel,
}

pub trait LifeSpanHandler: Send + Sync {
    /// Called once per browser before its first document loads. Script bindings are not callable yet.
    fn on_after_created(&self, _browser: &BrowserRef) {}
    fn on_before_close(&self, _browser: &BrowserRef) {}
}

pub trait LoadHandler: Send + Sync {
    fn on_load_start(&self, _browser: &BrowserRef, _frame: FrameKind) {}
    fn on_loading_state_change(&self, _browser: &BrowserRef, _state: LoadingState) {}
}

pub trait DisplayHandler: Send + Sync {
    fn on_console_message(&self, browser: &BrowserRef, message: &ConsoleMessage) -> ConsoleAction;
}

pub trait FocusHandler: Send + Sync {
    fn on_got_focus(&self, browser: &BrowserRef);
}

pub trait RequestHandler: Send + Sync {
    fn on_before_resource_load(
        &self,
        browser: &BrowserRef,
        request: &mut dyn Request,
    ) -> ResourceAction;
}

impl<T: LifeSpanHandler + ?Sized> LifeSpanHandler for Arc<T> {
    fn on_after_created(&self, browser: &BrowserRef) {
        (**self).on_after_created(browser)
    }

    fn on_before_close(&self, browser: &BrowserRef) {
        (**self).on_before_close(browser)
    }
}

impl<T: LoadHandler + ?Sized> LoadHandler for Arc<T> {
    fn on_load_start(&self, browser: &BrowserRef, frame: FrameKind) {
        (**self).on_load_start(browser, frame)
    }

    fn on_loading_state_change(&self, browser: &BrowserRef, state: LoadingState) {
        (**self).on_loading_state_change(browser, state)
    }
}

impl<T: DisplayHandler + ?Sized> DisplayHandler for Arc<T> {
    fn on_console_message(&self, browser: &BrowserRef, message: &ConsoleMessage) -> ConsoleAction {
        (**self).on_console_message(browser, message)
    }
}

impl<T: FocusHandler + ?Sized> FocusHandler for Arc<T> {
    fn on_got_focus(&self, browser: &BrowserRef) {
        (**self).on_got_focus(browser)
    }
}

impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    fn on_before_resource_load(
        &self,
        browser: &BrowserRef,
        request: &mut dyn Request,
    ) -> ResourceAction {
        (**self).on_before_resource_load(browser, request)
    }
}

/// The capabilities registered for a browser, one implementation per kind.
#[derive(Default, Clone)]
pub struct ClientHandlers {
    pub(crate) life_span: Option<Arc<dyn LifeSpanHandler>>,
    pub(crate) load: Option<Arc<dyn LoadHandler>>,
    pub(crate) display: Option<Arc<dyn DisplayHandler>>,
    pub(crate) focus: Option<Arc<dyn FocusHandler>>,
    pub(crate) request: Option<Arc<dyn RequestHandler>>,
}

impl ClientHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_life_span<H: LifeSpanHandler + 'static>(mut self, handler: H) -> Self {
        self.life_span = Some(Arc::new(handler));
        self
    }

    pub fn with_load<H: LoadHandler + 'static>(mut self, handler: H) -> Self {
        self.load = Some(Arc::new(handler));
        self
    }

    pub fn with_display<H: DisplayHandler + 'static>(mut self, handler: H) -> Self {
        self.display = Some(Arc::new(handler));
        self
    }

    pub fn with_focus<H: FocusHandler + 'static>(mut self, handler: H) -> Self {
        self.focus = Some(Arc::new(handler));
        self
    }

    pub fn with_request<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.request = Some(Arc::new(handler));
        self
    }
}
