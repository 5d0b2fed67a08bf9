use tracing::warn;
use x11rb::{
    connection::Connection,
    errors::ConnectionError,
    protocol::xproto::{ConfigureWindowAux, ConnectionExt},
    rust_connection::RustConnection,
};

use crate::shared::Bounds;

/// Resizes the child window the engine creates inside the host window.
pub struct X11Resizer {
    connection: RustConnection,
}

impl X11Resizer {
    pub fn connect() -> Option<Self> {
        match x11rb::connect(None) {
            Ok((connection, _)) => Some(Self { connection }),
            Err(e) => {
                warn!("Failed to connect to the X server: {e}");
                None
            }
        }
    }

    pub fn resize(&self, window: u32, bounds: Bounds) -> Result<(), ConnectionError> {
        if window == 0 || bounds.is_empty() {
            return Ok(());
        }

        let values = ConfigureWindowAux::new()
            .x(bounds.x)
            .y(bounds.y)
            .width(bounds.width as u32)
            .height(bounds.height as u32);

        self.connection.configure_window(window, &values)?;
        self.connection.flush()
    }
}
