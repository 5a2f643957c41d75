//! Single-threaded queue that continuations are delivered on.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::error::{Error, Result};

type Task = Box<dyn FnOnce() + Send>;

/// The caller's "main" context.
///
/// Background work posts closures through a [`MainHandle`]; they only run
/// when the thread owning the queue calls [`run_pending`](Self::run_pending)
/// or [`run_next`](Self::run_next).
pub struct MainQueue {
    tx: Sender<Task>,
    rx: Receiver<Task>,
}

/// Cloneable sender half of a [`MainQueue`].
#[derive(Clone)]
pub struct MainHandle {
    tx: Sender<Task>,
}

impl MainQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// A handle that posts onto this queue.
    #[must_use]
    pub fn handle(&self) -> MainHandle {
        MainHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run every task that is already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one task and run it.
    ///
    /// Returns `false` if nothing arrived in time.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainHandle {
    /// Queue `task` to run on the main context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MainQueueClosed`] if the queue has been dropped.
    pub fn post<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(task))
            .map_err(|_| Error::MainQueueClosed)
    }
}

impl std::fmt::Debug for MainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainHandle").finish_non_exhaustive()
    }
}
