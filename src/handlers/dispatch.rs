use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use flume::Sender;
use tracing::{debug, error, warn};

use super::{
    ClientHandlers, ConsoleAction, ConsoleMessage, FrameKind, LifeSpanHandler, LoadingState,
    ResourceAction,
};
use crate::{
    bridge::{Bridge, Handled},
    engine::{BrowserRef, Request},
    shared::{BrowserId, ShellEvent},
};

enum Lifecycle {
    /// Loading state changes that arrived before the browser was announced.
    Pending(Vec<LoadingState>),
    Created,
}

/// Entry point for engine callbacks of one client.
///
/// Routes every callback to the registered capability, delivers after-created
/// before any loading state change of the same browser and forwards bridge
/// messages. Called from engine threads.
pub struct ClientDispatch {
    global: Option<Arc<dyn LifeSpanHandler>>,
    handlers: ClientHandlers,
    bridge: Option<Bridge>,
    events: Option<Sender<ShellEvent>>,
    lifecycles: Mutex<HashMap<BrowserId, Lifecycle>>,
}

impl ClientDispatch {
    pub fn new(handlers: ClientHandlers) -> Self {
        Self {
            global: None,
            handlers,
            bridge: None,
            events: None,
            lifecycles: Mutex::default(),
        }
    }

    pub fn with_bridge(mut self, bridge: Bridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Life span handler shared by every browser, notified before the client's own.
    pub fn with_global<H: LifeSpanHandler + 'static>(mut self, handler: H) -> Self {
        self.global = Some(Arc::new(handler));
        self
    }

    pub fn with_events(mut self, sender: Sender<ShellEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn bridge(&self) -> Option<&Bridge> {
        self.bridge.as_ref()
    }

    pub fn on_after_created(&self, browser: &BrowserRef) {
        let id = browser.id();
        let pending = {
            let Ok(mut lifecycles) = self.lifecycles.lock() else {
                error!("Failed to lock browser lifecycles");
                return;
            };

            match lifecycles.insert(id, Lifecycle::Created) {
                Some(Lifecycle::Created) => {
                    warn!("Browser {id} was announced twice");
                    return;
                }
                Some(Lifecycle::Pending(pending)) => pending,
                None => Vec::new(),
            }
        };

        debug!("Browser {id} created");

        if let Some(global) = &self.global {
            global.on_after_created(browser);
        }

        if let Some(handler) = &self.handlers.life_span {
            handler.on_after_created(browser);
        }

        self.send(ShellEvent::BrowserCreated(id));

        pending
            .into_iter()
            .for_each(|state| self.deliver_loading_state(browser, state));
    }

    pub fn on_before_close(&self, browser: &BrowserRef) {
        if let Some(handler) = &self.handlers.life_span {
            handler.on_before_close(browser);
        }

        if let Some(global) = &self.global {
            global.on_before_close(browser);
        }

        self.release(browser.id());
        self.send(ShellEvent::BrowserClosed(browser.id()));
    }

    /// Returns the bootstrap script to install into the frame, if any.
    pub fn on_load_start(&self, browser: &BrowserRef, frame: FrameKind) -> Option<String> {
        if let Some(handler) = &self.handlers.load {
            handler.on_load_start(browser, frame);
        }

        self.bridge
            .as_ref()
            .filter(|bridge| frame == FrameKind::Main || bridge.binds_to_frames())
            .map(|bridge| bridge.bootstrap_script().to_owned())
    }

    pub fn on_loading_state_change(&self, browser: &BrowserRef, state: LoadingState) {
        {
            let Ok(mut lifecycles) = self.lifecycles.lock() else {
                error!("Failed to lock browser lifecycles");
                return;
            };

            let lifecycle = lifecycles
                .entry(browser.id())
                .or_insert_with(|| Lifecycle::Pending(Vec::new()));

            if let Lifecycle::Pending(pending) = lifecycle {
                pending.push(state);
                return;
            }
        }

        self.deliver_loading_state(browser, state);
    }

    pub fn on_console_message(
        &self,
        browser: &BrowserRef,
        message: &ConsoleMessage,
    ) -> ConsoleAction {
        match &self.handlers.display {
            Some(handler) => handler.on_console_message(browser, message),
            None => ConsoleAction::Propagate,
        }
    }

    pub fn on_got_focus(&self, browser: &BrowserRef) {
        if let Some(handler) = &self.handlers.focus {
            handler.on_got_focus(browser);
        }
    }

    pub fn on_before_resource_load(
        &self,
        browser: &BrowserRef,
        request: &mut dyn Request,
    ) -> ResourceAction {
        match &self.handlers.request {
            Some(handler) => handler.on_before_resource_load(browser, request),
            None => ResourceAction::Continue,
        }
    }

    pub fn on_bridge_message(&self, browser: &BrowserRef, payload: &str) {
        let Some(bridge) = &self.bridge else {
            warn!("Bridge message received without bindings attached");
            return;
        };

        match bridge.handle_message(browser, payload) {
            Ok(Handled::Ready) => self.send(ShellEvent::BridgeReady(browser.id())),
            Ok(_) => {}
            Err(e) => error!("Failed to handle bridge message: {e}"),
        }
    }

    /// Forgets a browser, dropping deferred work and pending callbacks that refer to it.
    pub fn release(&self, id: BrowserId) {
        if let Ok(mut lifecycles) = self.lifecycles.lock() {
            lifecycles.remove(&id);
        }

        if let Some(bridge) = &self.bridge {
            bridge.release(id);
        }
    }

    fn deliver_loading_state(&self, browser: &BrowserRef, state: LoadingState) {
        if let Some(handler) = &self.handlers.load {
            handler.on_loading_state_change(browser, state);
        }

        if state == LoadingState::Finished {
            self.send(ShellEvent::Loaded(browser.id()));
        }
    }

    fn send(&self, event: ShellEvent) {
        if let Some(sender) = &self.events {
            sender.send(event).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        bridge::BindingTable,
        engine::testing::{FakeBrowser, FakeRequest},
        handlers::{LoadHandler, RequestHandler},
    };

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    impl Journal {
        fn push(&self, entry: String) {
            self.entries.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }
    }

    impl LifeSpanHandler for Journal {
        fn on_after_created(&self, browser: &BrowserRef) {
            self.push(format!("created {}", browser.id()));
        }

        fn on_before_close(&self, browser: &BrowserRef) {
            self.push(format!("closing {}", browser.id()));
        }
    }

    impl LoadHandler for Journal {
        fn on_loading_state_change(&self, browser: &BrowserRef, state: LoadingState) {
            self.push(format!("{state:?} {}", browser.id()));
        }
    }

    struct Blocker;

    impl RequestHandler for Blocker {
        fn on_before_resource_load(&self, _: &BrowserRef, _: &mut dyn Request) -> ResourceAction {
            ResourceAction::Cancel
        }
    }

    fn journaled() -> (Arc<Journal>, ClientDispatch) {
        let journal = Arc::new(Journal::default());
        let handlers = ClientHandlers::new()
            .with_life_span(journal.clone())
            .with_load(journal.clone());
        (journal, ClientDispatch::new(handlers))
    }

    #[test]
    fn after_created_precedes_loading_state() {
        let (journal, dispatch) = journaled();
        let browser: BrowserRef = FakeBrowser::new(1);

        dispatch.on_loading_state_change(&browser, LoadingState::Started);
        dispatch.on_loading_state_change(&browser, LoadingState::Finished);
        dispatch.on_after_created(&browser);
        dispatch.on_loading_state_change(&browser, LoadingState::Started);

        assert_eq!(
            journal.entries(),
            vec!["created 1", "Started 1", "Finished 1", "Started 1"]
        );
    }

    #[test]
    fn ordering_is_tracked_per_browser() {
        let (journal, dispatch) = journaled();
        let first: BrowserRef = FakeBrowser::new(1);
        let second: BrowserRef = FakeBrowser::new(2);

        dispatch.on_after_created(&first);
        dispatch.on_loading_state_change(&second, LoadingState::Started);
        dispatch.on_loading_state_change(&first, LoadingState::Started);
        dispatch.on_after_created(&second);

        assert_eq!(
            journal.entries(),
            vec!["created 1", "Started 1", "created 2", "Started 2"]
        );
    }

    #[test]
    fn duplicate_after_created_is_ignored() {
        let (journal, dispatch) = journaled();
        let browser: BrowserRef = FakeBrowser::new(1);

        dispatch.on_after_created(&browser);
        dispatch.on_after_created(&browser);

        assert_eq!(journal.entries(), vec!["created 1"]);
    }

    #[test]
    fn global_handler_runs_first_on_creation() {
        let journal = Arc::new(Journal::default());
        let global = Arc::new(Journal::default());
        let dispatch = ClientDispatch::new(ClientHandlers::new().with_life_span(journal.clone()))
            .with_global(global.clone());
        let browser: BrowserRef = FakeBrowser::new(3);

        dispatch.on_after_created(&browser);
        dispatch.on_before_close(&browser);

        assert_eq!(global.entries(), vec!["created 3", "closing 3"]);
        assert_eq!(journal.entries(), vec!["created 3", "closing 3"]);
    }

    #[test]
    fn emits_shell_events() {
        let (sender, receiver) = flume::unbounded();
        let bridge = Bridge::attach(BindingTable::builder().build().unwrap());
        let dispatch = ClientDispatch::new(ClientHandlers::new())
            .with_bridge(bridge)
            .with_events(sender);
        let browser: BrowserRef = FakeBrowser::new(4);

        dispatch.on_after_created(&browser);
        dispatch.on_bridge_message(&browser, r#"{"kind":"ready"}"#);
        dispatch.on_loading_state_change(&browser, LoadingState::Finished);
        dispatch.on_before_close(&browser);

        let events: Vec<ShellEvent> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ShellEvent::BrowserCreated(BrowserId(4)),
                ShellEvent::BridgeReady(BrowserId(4)),
                ShellEvent::Loaded(BrowserId(4)),
                ShellEvent::BrowserClosed(BrowserId(4)),
            ]
        );
    }

    #[test]
    fn bootstrap_script_goes_to_main_frame_unless_frames_are_bound() {
        let main_only = ClientDispatch::new(ClientHandlers::new())
            .with_bridge(Bridge::attach(BindingTable::builder().build().unwrap()));
        let all_frames = ClientDispatch::new(ClientHandlers::new()).with_bridge(Bridge::attach(
            BindingTable::builder().bind_to_frames(true).build().unwrap(),
        ));
        let unbound = ClientDispatch::new(ClientHandlers::new());
        let browser: BrowserRef = FakeBrowser::new(5);

        assert!(main_only.on_load_start(&browser, FrameKind::Main).is_some());
        assert!(main_only.on_load_start(&browser, FrameKind::Sub).is_none());
        assert!(all_frames.on_load_start(&browser, FrameKind::Sub).is_some());
        assert!(unbound.on_load_start(&browser, FrameKind::Main).is_none());
    }

    #[test]
    fn defaults_without_handlers() {
        let dispatch = ClientDispatch::new(ClientHandlers::new());
        let browser: BrowserRef = FakeBrowser::new(6);
        let mut request = FakeRequest::new("https://example.com/");
        let message = ConsoleMessage {
            level: super::super::ConsoleLevel::Error,
            message: "Uncaught Error".to_owned(),
            source: String::new(),
            line: 1,
        };

        assert_eq!(
            dispatch.on_before_resource_load(&browser, &mut request),
            ResourceAction::Continue
        );
        assert_eq!(
            dispatch.on_console_message(&browser, &message),
            ConsoleAction::Propagate
        );
    }

    #[test]
    fn request_capability_decides() {
        let dispatch = ClientDispatch::new(ClientHandlers::new().with_request(Blocker));
        let browser: BrowserRef = FakeBrowser::new(7);
        let mut request = FakeRequest::new("https://example.com/");

        assert_eq!(
            dispatch.on_before_resource_load(&browser, &mut request),
            ResourceAction::Cancel
        );
    }
}
