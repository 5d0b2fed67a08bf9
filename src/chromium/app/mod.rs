mod browser_process_handler;
pub mod client;
mod render_process_handler;
mod v8_handler;

use std::sync::{Arc, RwLock};

use cef::{rc::*, *};
use flume::Sender;
use itertools::Itertools;
use tracing::debug;

use crate::{engine::Switch, shared::ShellEvent};
use browser_process_handler::ChromiumBrowserProcessHandler;
use render_process_handler::ChromiumRenderProcessHandler;

wrap_app! {
    pub struct ChromiumApp {
        switches: Arc<RwLock<Vec<Switch>>>,
        sender: Sender<ShellEvent>,
    }

    impl App {
        fn on_before_command_line_processing(
            &self,
            _process_type: Option<&CefString>,
            command_line: Option<&mut CommandLine>,
        ) {
            let (Some(line), Ok(switches)) = (command_line, self.switches.read()) else {
                return;
            };

            debug!("Command line switches: {}", switches.iter().join(" "));

            switches.iter().for_each(|switch| match &switch.value {
                Some(value) => line.append_switch_with_value(
                    Some(&CefString::from(switch.name.as_str())),
                    Some(&CefString::from(value.as_str())),
                ),
                None => line.append_switch(Some(&CefString::from(switch.name.as_str()))),
            });
        }

        fn browser_process_handler(&self) -> Option<BrowserProcessHandler> {
            Some(ChromiumBrowserProcessHandler::new(self.sender.clone()))
        }

        fn render_process_handler(&self) -> Option<RenderProcessHandler> {
            Some(ChromiumRenderProcessHandler::new())
        }
    }
}
