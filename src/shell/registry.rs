use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use flume::{Receiver, Sender};
use tracing::debug;

struct Inner {
    open: AtomicUsize,
    sender: Sender<()>,
    receiver: Receiver<()>,
}

/// Counts open windows and reports when the last one closes.
#[derive(Clone)]
pub struct WindowRegistry {
    inner: Arc<Inner>,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        let (sender, receiver) = flume::unbounded();

        Self {
            inner: Arc::new(Inner {
                open: AtomicUsize::new(0),
                sender,
                receiver,
            }),
        }
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> WindowToken {
        let open = self.inner.open.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Window registered, {open} open");

        WindowToken {
            inner: Some(self.inner.clone()),
        }
    }

    pub fn open(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Receives one message each time the count drops to zero.
    pub fn all_closed(&self) -> Receiver<()> {
        self.inner.receiver.clone()
    }
}

/// Keeps one window counted until released or dropped.
pub struct WindowToken {
    inner: Option<Arc<Inner>>,
}

impl WindowToken {
    /// Returns `true` if this was the last open window.
    pub fn release(mut self) -> bool {
        self.release_inner()
    }

    fn release_inner(&mut self) -> bool {
        let Some(inner) = self.inner.take() else {
            return false;
        };

        let previous = inner.open.fetch_sub(1, Ordering::SeqCst);
        debug!("Window released, {} open", previous - 1);

        if previous == 1 {
            inner.sender.send(()).ok();
            return true;
        }

        false
    }
}

impl Drop for WindowToken {
    fn drop(&mut self) {
        self.release_inner();
    }
}
