use std::time::Duration;

pub const APP_NAME: &str = "chromium-embed-shell";
pub const STARTUP_URL: &str = "about:blank";

pub const WINDOW_TITLE: &str = "Chromium Embed Shell";
pub const WINDOW_WIDTH: u32 = 900;
pub const WINDOW_HEIGHT: u32 = 640;

/// Interval of the message pump tick when the host loop drives the engine.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Oldest engine major version the shell is known to work with.
pub const MIN_ENGINE_MAJOR: u32 = 137;

pub const CMD_SWITCHES: &[(&str, Option<&str>)] = &[
    ("enable-media-stream", None),
    ("disable-gpu", None),
];

pub const CONSOLE_FILTERS: &[&str] = &["error", "uncaught"];
pub const PAGE_PRINTER: &str = "js_print";
pub const HOST_LANGUAGE: &str = "Rust";
