use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use super::{
    Browser, BrowserParent, BrowserRef, Engine, EngineError, EngineSettings, EngineVersion,
    Quitter, Request,
};
use crate::{
    handlers::ClientDispatch,
    shared::{Bounds, BrowserId},
};

/// In-memory browser recording every call made on it.
pub struct FakeBrowser {
    id: BrowserId,
    scripts: Mutex<Vec<String>>,
    bounds: Mutex<Vec<Bounds>>,
    focus: Mutex<Vec<bool>>,
    closes: Mutex<Vec<bool>>,
    zoom: Mutex<f64>,
    parent_closing: AtomicUsize,
    resize_started: AtomicUsize,
}

impl FakeBrowser {
    pub fn new(id: i32) -> Arc<FakeBrowser> {
        Arc::new(Self {
            id: BrowserId(id),
            scripts: Mutex::default(),
            bounds: Mutex::default(),
            focus: Mutex::default(),
            closes: Mutex::default(),
            zoom: Mutex::new(0.0),
            parent_closing: AtomicUsize::new(0),
            resize_started: AtomicUsize::new(0),
        })
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn bounds(&self) -> Vec<Bounds> {
        self.bounds.lock().unwrap().clone()
    }

    pub fn focus_calls(&self) -> Vec<bool> {
        self.focus.lock().unwrap().clone()
    }

    pub fn closes(&self) -> Vec<bool> {
        self.closes.lock().unwrap().clone()
    }

    pub fn parent_closing(&self) -> usize {
        self.parent_closing.load(Ordering::SeqCst)
    }

    pub fn resize_started(&self) -> usize {
        self.resize_started.load(Ordering::SeqCst)
    }
}

impl Browser for FakeBrowser {
    fn id(&self) -> BrowserId {
        self.id
    }

    fn set_focus(&self, focus: bool) {
        self.focus.lock().unwrap().push(focus);
    }

    fn set_bounds(&self, bounds: Bounds) {
        self.bounds.lock().unwrap().push(bounds);
    }

    fn notify_move_or_resize_started(&self) {
        self.resize_started.fetch_add(1, Ordering::SeqCst);
    }

    fn parent_window_will_close(&self) {
        self.parent_closing.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self, force: bool) {
        self.closes.lock().unwrap().push(force);
    }

    fn execute_script(&self, code: &str) {
        self.scripts.lock().unwrap().push(code.to_owned());
    }

    fn zoom_level(&self) -> f64 {
        *self.zoom.lock().unwrap()
    }

    fn set_zoom_level(&self, level: f64) {
        *self.zoom.lock().unwrap() = level;
    }
}

pub struct FakeRequest {
    url: String,
    headers: Vec<(String, String)>,
}

impl FakeRequest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl Request for FakeRequest {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }
}

/// Engine that creates [`FakeBrowser`]s and runs callbacks synchronously.
pub struct FakeEngine {
    pub version: EngineVersion,
    pub settings: Option<EngineSettings>,
    pub created: Vec<(BrowserParent, String)>,
    pub work_calls: usize,
    pub loop_runs: usize,
    pub shutdowns: usize,
    pub fail_initialize: bool,
    next_id: i32,
    clients: HashMap<BrowserId, (Arc<FakeBrowser>, Arc<ClientDispatch>)>,
    quit: Arc<AtomicBool>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            version: EngineVersion {
                major: 137,
                minor: 0,
                patch: 17,
            },
            settings: None,
            created: Vec::new(),
            work_calls: 0,
            loop_runs: 0,
            shutdowns: 0,
            fail_initialize: false,
            next_id: 1,
            clients: HashMap::new(),
            quit: Arc::default(),
        }
    }
}

impl FakeEngine {
    /// The user agent a page would read from `navigator.userAgent`.
    pub fn navigator_user_agent(&self) -> Option<&str> {
        self.settings.as_ref()?.user_agent.as_deref()
    }

    pub fn browser(&self, id: BrowserId) -> Option<Arc<FakeBrowser>> {
        self.clients.get(&id).map(|(browser, _)| browser.clone())
    }

    pub fn client(&self, id: BrowserId) -> Option<Arc<ClientDispatch>> {
        self.clients.get(&id).map(|(_, client)| client.clone())
    }

    /// Delivers the engine's final callback for a browser and drops the engine's reference.
    pub fn finish_close(&mut self, id: BrowserId) {
        if let Some((browser, client)) = self.clients.remove(&id) {
            let browser: BrowserRef = browser;
            client.on_before_close(&browser);
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

impl Engine for FakeEngine {
    fn version(&self) -> EngineVersion {
        self.version
    }

    fn initialize(&mut self, settings: &EngineSettings) -> Result<(), EngineError> {
        if self.fail_initialize {
            return Err(EngineError::Initialize(-1));
        }

        self.settings = Some(settings.clone());
        Ok(())
    }

    fn create_browser(
        &mut self,
        parent: BrowserParent,
        url: &str,
        client: Arc<ClientDispatch>,
    ) -> Result<BrowserRef, EngineError> {
        if self.settings.is_none() {
            return Err(EngineError::NotInitialized);
        }

        let browser = FakeBrowser::new(self.next_id);
        self.next_id += 1;
        self.created.push((parent, url.to_owned()));

        let browser_ref: BrowserRef = browser.clone();
        client.on_after_created(&browser_ref);
        self.clients.insert(browser.id(), (browser, client));

        Ok(browser_ref)
    }

    fn message_loop_work(&mut self) {
        self.work_calls += 1;
    }

    fn run_message_loop(&mut self) {
        self.loop_runs += 1;
    }

    fn quitter(&self) -> Quitter {
        let quit = self.quit.clone();
        Box::new(move || quit.store(true, Ordering::SeqCst))
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}
