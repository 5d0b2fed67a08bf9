use std::{fmt, num::NonZeroU64, time::Instant};

/// Native handle of the window region a browser is embedded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(NonZeroU64);

impl WindowHandle {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrowserId(pub i32);

impl fmt::Display for BrowserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
}

impl Platform {
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// The native handle only becomes valid once the window has been shown.
    pub fn embeds_after_show(self) -> bool {
        matches!(self, Platform::Linux)
    }

    /// Keyboard focus is lost on got-focus and has to be asserted again.
    pub fn needs_focus_fix(self) -> bool {
        matches!(self, Platform::Linux)
    }

    /// The browser has to be closed explicitly instead of following its parent window.
    pub fn closes_browser_directly(self) -> bool {
        matches!(self, Platform::MacOs)
    }
}

/// Events produced on engine threads and drained by the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    BrowserCreated(BrowserId),
    BridgeReady(BrowserId),
    Loaded(BrowserId),
    BrowserClosed(BrowserId),
    ScheduleWork(Instant),
}
