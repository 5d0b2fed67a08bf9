use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    engine::{BrowserParent, BrowserRef, Engine, EngineError},
    handlers::ClientDispatch,
    shell::{HostShell, WindowRegistry, WindowToken},
    shared::{Bounds, BrowserId, Platform, WindowHandle},
};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Missing platform-native window handle")]
    MissingHandle,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    AlreadyClosed,
    Closed,
    LastWindowClosed,
}

/// Which window event means the native handle can be embedded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleSignal {
    Created,
    FirstRedraw,
}

/// Binds one browser to a native window region and forwards window events to it.
pub struct FrameController {
    platform: Platform,
    url: String,
    client: Arc<ClientDispatch>,
    token: Option<WindowToken>,
    browser: Option<BrowserRef>,
    bounds: Bounds,
}

impl FrameController {
    pub fn new(
        platform: Platform,
        url: impl Into<String>,
        client: Arc<ClientDispatch>,
        registry: &WindowRegistry,
    ) -> Self {
        Self {
            platform,
            url: url.into(),
            client,
            token: Some(registry.register()),
            browser: None,
            bounds: Bounds::default(),
        }
    }

    pub fn handle_signal(&self) -> HandleSignal {
        match self.platform.embeds_after_show() {
            true => HandleSignal::FirstRedraw,
            false => HandleSignal::Created,
        }
    }

    /// Embeds the browser once the native handle is usable.
    pub fn handle_ready<E: Engine>(
        &mut self,
        shell: &mut HostShell<E>,
        handle: Option<u64>,
        bounds: Bounds,
    ) -> Result<(), WindowError> {
        if self.browser.is_some() || self.token.is_none() {
            return Ok(());
        }

        let handle = handle
            .and_then(WindowHandle::new)
            .ok_or(WindowError::MissingHandle)?;

        info!("Embedding browser into window {handle}");

        let parent = BrowserParent::Child { handle, bounds };
        let browser = shell.create_browser(parent, &self.url, self.client.clone())?;

        self.bounds = bounds;
        self.browser = Some(browser);

        Ok(())
    }

    pub fn is_embedded(&self) -> bool {
        self.browser.is_some()
    }

    pub fn browser_id(&self) -> Option<BrowserId> {
        self.browser.as_ref().map(|browser| browser.id())
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn on_focus(&self) {
        if let Some(browser) = &self.browser {
            browser.set_focus(true);
        }
    }

    pub fn on_resize(&mut self, bounds: Bounds) {
        let Some(browser) = &self.browser else {
            return;
        };

        self.bounds = bounds;
        browser.set_bounds(bounds);
        browser.notify_move_or_resize_started();
    }

    pub fn on_close(&mut self) -> CloseOutcome {
        let Some(token) = self.token.take() else {
            return CloseOutcome::AlreadyClosed;
        };

        if let Some(browser) = self.browser.take() {
            match self.platform.closes_browser_directly() {
                true => browser.close(true),
                false => browser.parent_window_will_close(),
            }

            debug!("Browser {} detached from its window", browser.id());
            self.client.release(browser.id());
        }

        match token.release() {
            true => CloseOutcome::LastWindowClosed,
            false => CloseOutcome::Closed,
        }
    }
}
