use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use futures::channel::oneshot;
use tracing::error;

type Action = Box<dyn FnOnce() + Send>;

enum State {
    Pending {
        actions: Vec<Action>,
        waiters: Vec<oneshot::Sender<()>>,
    },
    Ready,
    Cancelled,
}

impl Default for State {
    fn default() -> Self {
        State::Pending {
            actions: Vec::new(),
            waiters: Vec::new(),
        }
    }
}

/// One-shot readiness signal.
///
/// Work that depends on a subsystem becoming available is queued with
/// [`Readiness::when_ready`] and runs exactly once, either when [`Readiness::signal`]
/// is called or immediately if the signal already happened.
#[derive(Clone, Default)]
pub struct Readiness {
    state: Arc<Mutex<State>>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.state
            .lock()
            .map(|state| matches!(*state, State::Ready))
            .unwrap_or(false)
    }

    pub fn when_ready<F: FnOnce() + Send + 'static>(&self, action: F) {
        let Ok(mut state) = self.state.lock() else {
            error!("Failed to lock readiness state");
            return;
        };

        match &mut *state {
            State::Pending { actions, .. } => actions.push(Box::new(action)),
            State::Ready => {
                drop(state);
                action();
            }
            State::Cancelled => {}
        }
    }

    /// Resolves to `true` once signalled, `false` if the pending work was cancelled.
    pub fn wait(&self) -> impl Future<Output = bool> + use<> {
        let (sender, receiver) = oneshot::channel();

        if let Ok(mut state) = self.state.lock() {
            match &mut *state {
                State::Pending { waiters, .. } => waiters.push(sender),
                State::Ready => {
                    sender.send(()).ok();
                }
                State::Cancelled => {}
            }
        }

        async move { receiver.await.is_ok() }
    }

    /// Runs the queued work and returns how many actions ran. Only the first call has an effect.
    pub fn signal(&self) -> usize {
        let Ok(mut state) = self.state.lock() else {
            error!("Failed to lock readiness state");
            return 0;
        };

        if !matches!(*state, State::Pending { .. }) {
            return 0;
        }

        let State::Pending { actions, waiters } = std::mem::replace(&mut *state, State::Ready)
        else {
            return 0;
        };
        drop(state);

        waiters.into_iter().for_each(|waiter| {
            waiter.send(()).ok();
        });

        let count = actions.len();
        actions.into_iter().for_each(|action| action());
        count
    }

    /// Drops queued work without running it. Later work and signals are ignored.
    pub fn cancel(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = State::Cancelled;
        }
    }
}
