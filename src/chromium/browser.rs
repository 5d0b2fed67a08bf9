use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use cef::*;
use tracing::error;

#[cfg(target_os = "linux")]
use super::x11::X11Resizer;
use crate::{
    engine::{self, BrowserRef},
    shared::{Bounds, BrowserId},
};

pub struct CefBrowser {
    id: BrowserId,
    browser: Browser,
    #[cfg(target_os = "linux")]
    resizer: Option<Arc<X11Resizer>>,
}

impl CefBrowser {
    fn host(&self) -> Option<BrowserHost> {
        self.browser.host()
    }
}

impl engine::Browser for CefBrowser {
    fn id(&self) -> BrowserId {
        self.id
    }

    fn set_focus(&self, focus: bool) {
        if let Some(host) = self.host() {
            host.set_focus(focus as _);
        }
    }

    fn set_bounds(&self, bounds: Bounds) {
        let Some(host) = self.host() else {
            return;
        };

        // The engine does not follow the size of its parent on X11 or Win32.
        #[cfg(target_os = "linux")]
        if let Some(resizer) = &self.resizer {
            let window = host.window_handle() as u32;
            if let Err(e) = resizer.resize(window, bounds) {
                error!("Failed to resize browser window: {e}");
            }
        }

        #[cfg(target_os = "windows")]
        if let Err(e) = super::win32::resize(host.window_handle() as _, bounds) {
            error!("Failed to resize browser window: {e}");
        }

        // The engine view follows its parent through autoresizing on macOS.
        #[cfg(target_os = "macos")]
        let _ = bounds;

        host.was_resized();
    }

    fn notify_move_or_resize_started(&self) {
        if let Some(host) = self.host() {
            host.notify_move_or_resize_started();
        }
    }

    fn parent_window_will_close(&self) {
        if let Some(host) = self.host() {
            host.close_browser(0);
        }
    }

    fn close(&self, force: bool) {
        if let Some(host) = self.host() {
            host.close_browser(force as _);
        }
    }

    fn execute_script(&self, code: &str) {
        if let Some(frame) = self.browser.main_frame() {
            let code = CefString::from(code);
            frame.execute_java_script(Some(&code), None, 0);
        }
    }

    fn zoom_level(&self) -> f64 {
        self.host().map(|host| host.zoom_level()).unwrap_or_default()
    }

    fn set_zoom_level(&self, level: f64) {
        if let Some(host) = self.host() {
            host.set_zoom_level(level);
        }
    }
}

#[derive(Default)]
struct Entry {
    browser: Weak<CefBrowser>,
    /// Keeps a browser alive between its first callback and its hand-over to the caller.
    pending: Option<Arc<CefBrowser>>,
}

/// Maps engine browsers to the shared references handed to the rest of the shell.
#[derive(Default)]
pub struct BrowserDirectory {
    entries: Mutex<HashMap<i32, Entry>>,
    #[cfg(target_os = "linux")]
    resizer: Option<Arc<X11Resizer>>,
}

impl BrowserDirectory {
    #[cfg(target_os = "linux")]
    pub fn new(resizer: Option<Arc<X11Resizer>>) -> Self {
        Self {
            entries: Mutex::default(),
            resizer,
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(&self, browser: &Browser) -> Arc<CefBrowser> {
        Arc::new(CefBrowser {
            id: BrowserId(browser.identifier()),
            browser: browser.clone(),
            #[cfg(target_os = "linux")]
            resizer: self.resizer.clone(),
        })
    }

    /// The shared reference for a browser seen in an engine callback.
    pub fn resolve(&self, browser: &Browser) -> BrowserRef {
        let Ok(mut entries) = self.entries.lock() else {
            error!("Failed to lock browser directory");
            return self.wrap(browser);
        };

        let entry = entries.entry(browser.identifier()).or_default();
        if let Some(existing) = entry.browser.upgrade() {
            return existing;
        }

        let wrapped = self.wrap(browser);
        entry.browser = Arc::downgrade(&wrapped);
        entry.pending = Some(wrapped.clone());
        wrapped
    }

    /// Hands the browser over to its owner; the directory keeps only a weak reference.
    pub fn claim(&self, browser: &Browser) -> BrowserRef {
        let resolved = self.resolve(browser);

        if let Ok(mut entries) = self.entries.lock()
            && let Some(entry) = entries.get_mut(&browser.identifier())
        {
            entry.pending = None;
        }

        resolved
    }

    pub fn forget(&self, id: BrowserId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&id.0);
        }
    }
}

/// Outbound request seen by the request capability.
pub struct CefRequest<'a> {
    request: &'a mut Request,
}

impl<'a> CefRequest<'a> {
    pub fn new(request: &'a mut Request) -> Self {
        Self { request }
    }
}

impl engine::Request for CefRequest<'_> {
    fn url(&self) -> String {
        CefString::from(&self.request.url()).to_string()
    }

    fn header(&self, name: &str) -> Option<String> {
        let name = CefString::from(name);
        let value = CefString::from(&self.request.header_by_name(Some(&name))).to_string();
        (!value.is_empty()).then_some(value)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let name = CefString::from(name);
        let value = CefString::from(value);
        self.request.set_header_by_name(Some(&name), Some(&value), 1);
    }
}
