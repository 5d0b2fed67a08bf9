pub use crate::bridge::ipc::IPC_SENDER;

/// Name of the process message carrying bridge payloads from the render process.
pub const IPC_MESSAGE: &str = "IPC";

/// Window system the embedded browser has to share with the host window.
#[cfg(target_os = "linux")]
pub const OZONE_PLATFORM: (&str, &str) = ("ozone-platform", "x11");
