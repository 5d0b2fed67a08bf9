pub mod readiness;
pub mod types;

pub use readiness::Readiness;
pub use types::{Bounds, BrowserId, Platform, ShellEvent, WindowHandle};
