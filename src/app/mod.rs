use flume::{Receiver, Sender};
use tracing::{error, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    raw_window_handle::{HasWindowHandle, RawWindowHandle},
    window::{Icon, Window, WindowId},
};

use crate::{config::WindowConfig, shared::Bounds};

const ICON: &[u8] = include_bytes!("../../assets/icon.png");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The window exists; `handle` is its native handle if the platform exposes one.
    Created { handle: Option<u64>, bounds: Bounds },
    /// The window has been shown and drawn once.
    FirstRedraw { handle: Option<u64>, bounds: Bounds },
    Resized(Bounds),
    Focused,
    CloseRequested,
}

pub struct App {
    config: WindowConfig,
    window: Option<Window>,
    redrawn: bool,
    sender: Sender<AppEvent>,
    receiver: Receiver<AppEvent>,
}

impl App {
    pub fn new(config: WindowConfig) -> Self {
        let (sender, receiver) = flume::unbounded::<AppEvent>();

        Self {
            config,
            window: None,
            redrawn: false,
            sender,
            receiver,
        }
    }

    pub fn events<T: FnMut(AppEvent)>(&self, handler: T) {
        self.receiver.try_iter().for_each(handler);
    }

    /// Destroys the window.
    pub fn close(&mut self) {
        self.window = None;
    }

    fn handle(&self) -> Option<u64> {
        let window = self.window.as_ref()?;
        let handle = window.window_handle().ok()?;

        match handle.as_raw() {
            RawWindowHandle::Xlib(handle) => Some(handle.window as u64),
            RawWindowHandle::Xcb(handle) => Some(handle.window.get() as u64),
            RawWindowHandle::Win32(handle) => Some(handle.hwnd.get() as u64),
            RawWindowHandle::AppKit(handle) => Some(handle.ns_view.as_ptr() as usize as u64),
            _ => None,
        }
    }

    fn bounds(&self) -> Bounds {
        self.window
            .as_ref()
            .map(|window| {
                let size = window.inner_size();
                Bounds::from_size(size.width, size.height)
            })
            .unwrap_or_default()
    }
}

fn load_icon() -> Option<Icon> {
    let image = match image::load_from_memory_with_format(ICON, image::ImageFormat::Png) {
        Ok(image) => image.into_rgba8(),
        Err(e) => {
            warn!("Failed to decode window icon: {e}");
            return None;
        }
    };

    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).ok()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_window_icon(load_icon());

        match event_loop.create_window(attributes) {
            Ok(window) => {
                window.request_redraw();
                self.window = Some(window);

                let (handle, bounds) = (self.handle(), self.bounds());
                self.sender.send(AppEvent::Created { handle, bounds }).ok();
            }
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::RedrawRequested => {
                if !self.redrawn {
                    self.redrawn = true;

                    let (handle, bounds) = (self.handle(), self.bounds());
                    self.sender.send(AppEvent::FirstRedraw { handle, bounds }).ok();
                }
            }
            WindowEvent::Resized(size) => {
                let bounds = Bounds::from_size(size.width, size.height);
                self.sender.send(AppEvent::Resized(bounds)).ok();
            }
            WindowEvent::Focused(true) => {
                self.sender.send(AppEvent::Focused).ok();
            }
            WindowEvent::CloseRequested => {
                self.sender.send(AppEvent::CloseRequested).ok();
            }
            _ => {}
        }
    }
}
