use std::time::{Duration, Instant};

use cef::{rc::*, *};
use flume::Sender;

use crate::shared::ShellEvent;

wrap_browser_process_handler! {
    pub struct ChromiumBrowserProcessHandler {
        sender: Sender<ShellEvent>,
    }

    impl BrowserProcessHandler {
        fn on_schedule_message_pump_work(&self, delay_ms: i64) {
            let at = Instant::now() + Duration::from_millis(delay_ms.max(0) as u64);
            self.sender.send(ShellEvent::ScheduleWork(at)).ok();
        }
    }
}
