//! Background invocation of the stylizer with main-context delivery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use image::DynamicImage;

use crate::error::{Error, Result};

use super::{MainHandle, StylizedImage, Stylizer};

/// Lifecycle of the most recent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

type Completion = Box<dyn FnOnce(Result<StylizedImage>) + Send>;

struct Request {
    id: u64,
    image: DynamicImage,
    on_complete: Completion,
}

#[derive(Debug, Default)]
struct Tracker {
    state: InvocationState,
    pending: usize,
}

impl Tracker {
    fn submitted(&mut self) {
        self.pending += 1;
        self.state = InvocationState::Running;
    }

    fn finished(&mut self, succeeded: bool) {
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            self.state = if succeeded {
                InvocationState::Succeeded
            } else {
                InvocationState::Failed
            };
        }
    }
}

/// Runs stylize requests off the caller's thread.
///
/// Requests are processed one at a time, in submission order, by a single
/// worker thread. Each request's continuation is posted to the
/// [`MainQueue`](super::MainQueue) behind the given [`MainHandle`] and runs
/// exactly once there, after all processing for that request is done.
/// In-flight requests cannot be cancelled; dropping the invoker waits for
/// queued requests to finish.
pub struct Invoker {
    request_tx: Option<Sender<Request>>,
    worker: Option<JoinHandle<()>>,
    tracker: Arc<Mutex<Tracker>>,
    next_id: AtomicU64,
}

impl Invoker {
    /// Start a worker thread serving `stylizer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn new(stylizer: Arc<Stylizer>, main: MainHandle) -> Result<Self> {
        let (request_tx, request_rx) = channel::<Request>();
        let tracker = Arc::new(Mutex::new(Tracker::default()));

        let worker_tracker = Arc::clone(&tracker);
        let worker = thread::Builder::new()
            .name("stylize-worker".to_string())
            .spawn(move || Self::worker_loop(&stylizer, &request_rx, &main, &worker_tracker))?;

        Ok(Self {
            request_tx: Some(request_tx),
            worker: Some(worker),
            tracker,
            next_id: AtomicU64::new(1),
        })
    }

    /// Queue `image` for stylization.
    ///
    /// `on_complete` receives the stylized image or the error of the stage
    /// that failed. Returns the request id used in logs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the worker has stopped.
    pub fn stylize<F>(&self, image: DynamicImage, on_complete: F) -> Result<u64>
    where
        F: FnOnce(Result<StylizedImage>) + Send + 'static,
    {
        let tx = self.request_tx.as_ref().ok_or(Error::WorkerUnavailable)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.lock_tracker().submitted();

        let request = Request {
            id,
            image,
            on_complete: Box::new(on_complete),
        };
        if tx.send(request).is_err() {
            self.lock_tracker().finished(false);
            return Err(Error::WorkerUnavailable);
        }

        tracing::debug!("Queued stylize request {id}");
        Ok(id)
    }

    /// State of the most recent invocation.
    ///
    /// `Running` while any request is queued or executing.
    #[must_use]
    pub fn state(&self) -> InvocationState {
        self.lock_tracker().state
    }

    /// Whether the worker thread is still accepting requests.
    ///
    /// Once this is `false` every continuation the worker will ever post
    /// has already been posted.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    fn lock_tracker(&self) -> std::sync::MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn worker_loop(
        stylizer: &Stylizer,
        requests: &Receiver<Request>,
        main: &MainHandle,
        tracker: &Mutex<Tracker>,
    ) {
        while let Ok(Request {
            id,
            image,
            on_complete,
        }) = requests.recv()
        {
            let started = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| stylizer.stylize(&image)))
                .unwrap_or_else(|payload| {
                    Err(Error::WorkerPanicked {
                        reason: panic_reason(payload.as_ref()),
                    })
                });
            drop(image);

            match &result {
                Ok(_) => tracing::info!("Request {id} succeeded in {:.2?}", started.elapsed()),
                Err(err) => {
                    let stage = err.stage().map_or_else(|| "unknown".to_string(), |s| s.to_string());
                    tracing::warn!("Request {id} failed at {stage} stage: {err}");
                }
            }

            tracker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .finished(result.is_ok());

            if main.post(move || on_complete(result)).is_err() {
                tracing::warn!("Main queue closed; dropping result of request {id}");
            }
        }

        tracing::debug!("Stylize worker exiting");
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl Drop for Invoker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue is drained.
        drop(self.request_tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Stylize worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
