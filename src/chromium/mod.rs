mod app;
mod browser;
mod config;
#[cfg(target_os = "linux")]
mod x11;
#[cfg(target_os = "windows")]
mod win32;

use std::{
    ptr::null_mut,
    sync::{Arc, RwLock},
};

use cef::{args::Args, *};
use flume::Sender;
use tracing::{debug, error};

use crate::{
    constants::{WINDOW_HEIGHT, WINDOW_WIDTH},
    engine::{
        self, BrowserParent, BrowserRef, EngineError, EngineSettings, EngineVersion, Quitter,
        Switch,
    },
    handlers::ClientDispatch,
    shared::ShellEvent,
};
use app::{ChromiumApp, client::ChromiumClient};
pub use browser::{BrowserDirectory, CefBrowser};

/// Chromium Embedded Framework behind the [`engine::Engine`] interface.
pub struct CefEngine {
    args: Args,
    app: App,
    switches: Arc<RwLock<Vec<Switch>>>,
    directory: Arc<BrowserDirectory>,
    initialized: bool,
}

impl CefEngine {
    pub fn new(sender: Sender<ShellEvent>) -> Self {
        let _ = api_hash(cef_dll_sys::CEF_API_VERSION_LAST, 0);

        let switches = Arc::new(RwLock::new(Vec::new()));
        let app = ChromiumApp::new(switches.clone(), sender);

        Self {
            args: Args::new(),
            app,
            switches,
            directory: Arc::default(),
            initialized: false,
        }
    }

    /// Runs this process as an engine sub-process if it is one, returning its exit code.
    pub fn execute_process(&mut self) -> Option<i32> {
        let code = execute_process(
            Some(self.args.as_main_args()),
            Some(&mut self.app),
            null_mut(),
        );

        (code >= 0).then_some(code)
    }
}

impl engine::Engine for CefEngine {
    fn version(&self) -> EngineVersion {
        EngineVersion {
            major: version_info(0) as u32,
            minor: version_info(1) as u32,
            patch: version_info(2) as u32,
        }
    }

    fn initialize(&mut self, settings: &EngineSettings) -> Result<(), EngineError> {
        if let Ok(mut switches) = self.switches.write() {
            *switches = settings.switches.clone();

            #[cfg(target_os = "linux")]
            {
                let (name, value) = config::OZONE_PLATFORM;
                switches.push(Switch::with_value(name, value));
            }
        }

        #[cfg(target_os = "linux")]
        {
            let resizer = x11::X11Resizer::connect().map(Arc::new);
            self.directory = Arc::new(BrowserDirectory::new(resizer));
        }

        let cache_path = settings
            .cache_path
            .as_ref()
            .map(|path| CefString::from(path.to_string_lossy().as_ref()))
            .unwrap_or_default();

        let cef_settings = Settings {
            no_sandbox: 1,
            external_message_pump: settings.external_message_pump as _,
            multi_threaded_message_loop: 0,
            user_agent: settings
                .user_agent
                .as_deref()
                .map(CefString::from)
                .unwrap_or_default(),
            root_cache_path: cache_path.clone(),
            cache_path,
            ..Default::default()
        };

        let code = initialize(
            Some(self.args.as_main_args()),
            Some(&cef_settings),
            Some(&mut self.app),
            null_mut(),
        );

        if code != 1 {
            return Err(EngineError::Initialize(code));
        }

        self.initialized = true;
        Ok(())
    }

    fn create_browser(
        &mut self,
        parent: BrowserParent,
        url: &str,
        client: Arc<ClientDispatch>,
    ) -> Result<BrowserRef, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        let mut client = ChromiumClient::new(client, self.directory.clone());
        let url = CefString::from(url);

        let window_info = match parent {
            BrowserParent::Child { handle, bounds } => WindowInfo {
                parent_window: handle.get() as _,
                bounds: Rect {
                    x: bounds.x,
                    y: bounds.y,
                    width: bounds.width,
                    height: bounds.height,
                },
                ..Default::default()
            },
            BrowserParent::TopLevel { title } => WindowInfo {
                window_name: CefString::from(title.as_str()),
                bounds: Rect {
                    x: 0,
                    y: 0,
                    width: WINDOW_WIDTH as i32,
                    height: WINDOW_HEIGHT as i32,
                },
                ..Default::default()
            },
        };

        let browser = browser_host_create_browser_sync(
            Some(&window_info),
            Some(&mut client),
            Some(&url),
            Some(&BrowserSettings::default()),
            None,
            None,
        )
        .ok_or(EngineError::BrowserCreation)?;

        debug!("Created browser {}", browser.identifier());

        Ok(self.directory.claim(&browser))
    }

    fn message_loop_work(&mut self) {
        do_message_loop_work();
    }

    fn run_message_loop(&mut self) {
        run_message_loop();
    }

    fn quitter(&self) -> Quitter {
        Box::new(quit_message_loop)
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            error!("Engine shutdown requested before initialization");
            return;
        }

        shutdown();
        self.initialized = false;
    }
}
