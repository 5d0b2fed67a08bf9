#[cfg(test)]
pub(crate) mod testing;

use std::{fmt, path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::{
    handlers::ClientDispatch,
    shared::{Bounds, BrowserId, WindowHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine initialization failed with code {0}")]
    Initialize(i32),
    #[error("Engine is not initialized")]
    NotInitialized,
    #[error("Failed to create browser")]
    BrowserCreation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub name: String,
    pub value: Option<String>,
}

impl Switch {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "--{}={}", self.name, value),
            None => write!(f, "--{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub user_agent: Option<String>,
    pub switches: Vec<Switch>,
    pub external_message_pump: bool,
    pub cache_path: Option<PathBuf>,
}

/// Where a new browser surface lives.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserParent {
    /// Embedded into a region of a host window.
    Child { handle: WindowHandle, bounds: Bounds },
    /// A window created and owned by the engine itself.
    TopLevel { title: String },
}

/// One embedded browser surface.
pub trait Browser: Send + Sync {
    fn id(&self) -> BrowserId;
    fn set_focus(&self, focus: bool);
    fn set_bounds(&self, bounds: Bounds);
    fn notify_move_or_resize_started(&self);
    fn parent_window_will_close(&self);
    fn close(&self, force: bool);
    /// Runs code in the main frame.
    fn execute_script(&self, code: &str);
    fn zoom_level(&self) -> f64;
    fn set_zoom_level(&self, level: f64);
}

pub type BrowserRef = Arc<dyn Browser>;

/// Outbound network request seen before it is issued.
pub trait Request {
    fn url(&self) -> String;
    fn header(&self, name: &str) -> Option<String>;
    /// Replaces every field with the same name, leaving the others untouched.
    fn set_header(&mut self, name: &str, value: &str);
}

pub type Quitter = Box<dyn Fn() + Send + Sync>;

pub trait Engine {
    fn version(&self) -> EngineVersion;
    fn initialize(&mut self, settings: &EngineSettings) -> Result<(), EngineError>;
    fn create_browser(
        &mut self,
        parent: BrowserParent,
        url: &str,
        client: Arc<ClientDispatch>,
    ) -> Result<BrowserRef, EngineError>;
    /// Lets the engine process pending work without blocking.
    fn message_loop_work(&mut self);
    /// Blocks until [`Engine::quitter`] is invoked.
    fn run_message_loop(&mut self);
    fn quitter(&self) -> Quitter;
    fn shutdown(&mut self);
}
