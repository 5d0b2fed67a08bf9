mod registry;
mod ticker;

use std::{
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    constants::{MIN_ENGINE_MAJOR, TICK_INTERVAL},
    engine::{Browser, BrowserParent, BrowserRef, Engine, EngineError, EngineSettings, EngineVersion},
    handlers::{ClientDispatch, QuitOnClose},
};

pub use registry::{WindowRegistry, WindowToken};
pub use ticker::Ticker;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Engine version {found} is not supported, {required}.x or newer is required")]
    UnsupportedEngine { found: EngineVersion, required: u32 },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShutdownError {
    #[error("{0} browsers are still alive")]
    BrowsersAlive(usize),
    #[error("Engine was already shut down")]
    AlreadyShutDown,
}

/// Owns the engine for the lifetime of the process.
pub struct HostShell<E: Engine> {
    engine: E,
    registry: WindowRegistry,
    ticker: Ticker,
    browsers: Vec<Weak<dyn Browser>>,
    shut_down: bool,
}

impl<E: Engine> HostShell<E> {
    pub fn initialize(mut engine: E, settings: &EngineSettings) -> Result<Self, ShellError> {
        let version = engine.version();
        if version.major < MIN_ENGINE_MAJOR {
            return Err(ShellError::UnsupportedEngine {
                found: version,
                required: MIN_ENGINE_MAJOR,
            });
        }

        engine.initialize(settings)?;
        info!("Engine {version} initialized");

        let mut ticker = Ticker::new(TICK_INTERVAL);
        ticker.start(Instant::now());

        Ok(Self {
            engine,
            registry: WindowRegistry::new(),
            ticker,
            browsers: Vec::new(),
            shut_down: false,
        })
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.ticker = Ticker::new(interval);
        self.ticker.start(Instant::now());
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    /// Does one unit of engine work if the ticker is due. Returns whether work was done.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.ticker.is_due(now) {
            return false;
        }

        self.engine.message_loop_work();
        self.ticker.rearm(now);
        true
    }

    /// Requests engine work no later than `at`.
    pub fn schedule_work(&mut self, at: Instant) {
        self.ticker.pull(at);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.deadline()
    }

    pub fn create_browser(
        &mut self,
        parent: BrowserParent,
        url: &str,
        client: Arc<ClientDispatch>,
    ) -> Result<BrowserRef, EngineError> {
        if self.shut_down {
            return Err(EngineError::NotInitialized);
        }

        let browser = self.engine.create_browser(parent, url, client)?;
        debug!("Browser {} created for {url}", browser.id());

        self.browsers.retain(|browser| browser.strong_count() > 0);
        self.browsers.push(Arc::downgrade(&browser));

        Ok(browser)
    }

    pub fn alive_browsers(&self) -> usize {
        self.browsers
            .iter()
            .filter(|browser| browser.strong_count() > 0)
            .count()
    }

    /// Runs an engine-owned top-level browser until it closes.
    pub fn run_blocking(
        &mut self,
        title: &str,
        url: &str,
        client: ClientDispatch,
    ) -> Result<(), ShellError> {
        let client = Arc::new(client.with_global(QuitOnClose::new(self.engine.quitter())));
        let parent = BrowserParent::TopLevel {
            title: title.to_owned(),
        };

        let browser = self.create_browser(parent, url, client)?;
        self.ticker.stop();

        info!("Running blocking message loop");
        self.engine.run_message_loop();

        drop(browser);
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<(), ShutdownError> {
        if self.shut_down {
            return Err(ShutdownError::AlreadyShutDown);
        }

        self.ticker.stop();

        let alive = self.alive_browsers();
        if alive > 0 {
            warn!("Refusing to shut down the engine, {alive} browsers are still alive");
            return Err(ShutdownError::BrowsersAlive(alive));
        }

        self.engine.shutdown();
        self.shut_down = true;
        info!("Engine shut down");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::testing::FakeEngine,
        handlers::ClientHandlers,
        shared::{BrowserId, Bounds, WindowHandle},
    };

    fn shell() -> HostShell<FakeEngine> {
        HostShell::initialize(FakeEngine::default(), &EngineSettings::default()).unwrap()
    }

    fn child() -> BrowserParent {
        BrowserParent::Child {
            handle: WindowHandle::new(0x1c00007).unwrap(),
            bounds: Bounds::from_size(800, 600),
        }
    }

    #[test]
    fn rejects_old_engine() {
        let mut engine = FakeEngine::default();
        engine.version.major = MIN_ENGINE_MAJOR - 1;

        let result = HostShell::initialize(engine, &EngineSettings::default());

        assert!(matches!(
            result,
            Err(ShellError::UnsupportedEngine { required: MIN_ENGINE_MAJOR, .. })
        ));
    }

    #[test]
    fn reports_initialize_failure() {
        let mut engine = FakeEngine::default();
        engine.fail_initialize = true;

        let result = HostShell::initialize(engine, &EngineSettings::default());

        assert!(matches!(
            result,
            Err(ShellError::Engine(EngineError::Initialize(-1)))
        ));
    }

    #[test]
    fn user_agent_reaches_engine_unchanged() {
        let user_agent = "Mozilla/5.0 (X11; Linux x86_64) EmbedShell/0.1 \"ünïcode\"";
        let settings = EngineSettings {
            user_agent: Some(user_agent.to_owned()),
            ..EngineSettings::default()
        };

        let shell = HostShell::initialize(FakeEngine::default(), &settings).unwrap();

        assert_eq!(shell.engine().navigator_user_agent(), Some(user_agent));
    }

    #[test]
    fn tick_does_work_once_per_interval() {
        let mut shell = shell().with_tick_interval(Duration::from_millis(10));
        let start = Instant::now();

        assert!(!shell.tick(start));
        assert!(shell.tick(start + Duration::from_millis(10)));
        assert!(!shell.tick(start + Duration::from_millis(15)));
        assert!(shell.tick(start + Duration::from_millis(20)));

        assert_eq!(shell.engine().work_calls, 2);
    }

    #[test]
    fn scheduled_work_pulls_deadline() {
        let mut shell = shell().with_tick_interval(Duration::from_secs(60));
        let soon = Instant::now() + Duration::from_millis(1);

        shell.schedule_work(soon);

        assert_eq!(shell.next_deadline(), Some(soon));
        assert!(shell.tick(soon));
    }

    #[test]
    fn shutdown_waits_for_browsers() {
        let mut shell = shell();
        let client = Arc::new(ClientDispatch::new(ClientHandlers::new()));
        let browser = shell
            .create_browser(child(), "about:blank", client.clone())
            .unwrap();
        let id = browser.id();

        assert!(Arc::ptr_eq(&shell.engine().client(id).unwrap(), &client));
        drop(browser);
        assert_eq!(shell.shutdown(), Err(ShutdownError::BrowsersAlive(1)));
        assert_eq!(shell.engine().shutdowns, 0);

        shell.engine_mut().finish_close(id);
        assert!(shell.engine().client(id).is_none());
        assert_eq!(shell.shutdown(), Ok(()));
        assert_eq!(shell.shutdown(), Err(ShutdownError::AlreadyShutDown));
        assert_eq!(shell.engine().shutdowns, 1);
    }

    #[test]
    fn blocking_mode_quits_on_close() {
        let mut shell = shell();

        shell
            .run_blocking("Shell", "about:blank", ClientDispatch::new(ClientHandlers::new()))
            .unwrap();

        assert_eq!(shell.engine().loop_runs, 1);
        assert!(matches!(
            shell.engine().created[0].0,
            BrowserParent::TopLevel { .. }
        ));
        assert!(!shell.engine().quit_requested());

        shell.engine_mut().finish_close(BrowserId(1));

        assert!(shell.engine().quit_requested());
        assert_eq!(shell.shutdown(), Ok(()));
    }
}
