//! The notification context.
//!
//! Every write to the view-model's observable values, and therefore every
//! observer callback, runs as a job on one `Dispatcher`. Jobs posted to a
//! `SerialDispatcher` run one at a time in the order they were posted.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::warn;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs jobs sequentially on a single Tokio task.
///
/// The task ends once every handle to the dispatcher has been dropped and the
/// queue is drained.
#[derive(Debug, Clone)]
pub struct SerialDispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialDispatcher {
    pub fn new(handle: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });
        Self { tx }
    }
}

impl Dispatcher for SerialDispatcher {
    fn dispatch(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("notification context is gone; dropping job");
        }
    }
}
