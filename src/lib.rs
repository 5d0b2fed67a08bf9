pub mod bindings;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod engine;
pub mod handlers;
pub mod navigation;
pub mod shared;
pub mod shell;
pub mod window;

#[cfg(feature = "chromium")]
pub mod app;
#[cfg(feature = "chromium")]
pub mod chromium;
