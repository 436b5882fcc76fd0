//! Response contexts: where table completions are delivered.
//!
//! A table executes every operation on its own private worker, then hands the
//! completion for that operation to a [`ResponseContext`]. The context decides on
//! which thread, and in what order, completions run.
//!
//! # Provided Contexts
//!
//! - [`SerialResponder`] - a dedicated response thread running completions one at
//!   a time in the order they were dispatched
//! - [`InlineResponder`] - runs completions directly on the table's worker
//! - [`TokioResponder`] - spawns completions onto a tokio runtime (requires the
//!   `tokio` feature)
//!
//! Applications with their own event loop can implement [`ResponseContext`] to
//! receive completions there instead.
//!
//! A response context must outlive every operation still pending on the tables
//! that use it. Completions dispatched to a context that has shut down are
//! dropped, and the matching futures resolve to
//! [`TableError::OperationDropped`](crate::error::TableError::OperationDropped).

use futures::{
    channel::mpsc::{self, UnboundedSender},
    executor::block_on_stream,
};
use std::{fmt, thread};
use tracing::{debug, warn};

use crate::error::{TableError, TableResult};

/// A unit of completion work handed to a [`ResponseContext`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that runs completions on behalf of a table.
pub trait ResponseContext: Send + Sync + 'static {
    /// Schedules `job` to run on this context.
    ///
    /// Must not block waiting for the job to finish; tables call this from their
    /// worker between operations.
    fn dispatch(&self, job: Job);
}

/// Runs every completion immediately on the table's worker thread.
///
/// Completions observe exactly the store state produced by their operation, and
/// the next operation does not start until the completion returns. Slow
/// completions therefore stall the table.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineResponder;

impl ResponseContext for InlineResponder {
    fn dispatch(&self, job: Job) {
        job()
    }
}

/// A dedicated thread that runs completions one at a time, in dispatch order.
///
/// Because a table dispatches completions in the order its operations execute,
/// a `SerialResponder` delivers the completions of one table in submission order.
/// One responder can be shared by several tables.
///
/// The response thread stops once the responder and every clone of it have
/// been dropped and all queued completions have run. A panicking completion
/// stops it early.
#[derive(Clone)]
pub struct SerialResponder {
    label: String,
    sender: UnboundedSender<Job>,
}

impl SerialResponder {
    /// Starts a new response thread named `<label>-responses`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Initialization`](crate::error::TableError::Initialization)
    /// if the label contains a NUL byte or the thread cannot be spawned.
    pub fn spawn(label: impl Into<String>) -> TableResult<Self> {
        let label = label.into();
        if label.contains('\0') {
            return Err(TableError::Initialization(format!(
                "responder label {label:?} contains a NUL byte"
            )));
        }

        let (sender, receiver) = mpsc::unbounded::<Job>();
        let thread_label = label.clone();

        thread::Builder::new()
            .name(format!("{label}-responses"))
            .spawn(move || {
                debug!(responder = %thread_label, "response thread started");

                for job in block_on_stream(receiver) {
                    job();
                }

                debug!(responder = %thread_label, "response thread stopped");
            })?;

        Ok(Self { label, sender })
    }

    /// Returns the label this responder was started with.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ResponseContext for SerialResponder {
    fn dispatch(&self, job: Job) {
        if self.sender.unbounded_send(job).is_err() {
            warn!(responder = %self.label, "response thread is gone, completion dropped");
        }
    }
}

impl fmt::Debug for SerialResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialResponder")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Spawns every completion as a task on a tokio runtime.
///
/// Completions of different operations may run concurrently and in any order.
/// The effects they report are still ordered, since the operations themselves
/// ran one after another on the table's worker.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioResponder {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioResponder {
    /// Creates a responder that spawns onto the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Creates a responder for the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "tokio")]
impl ResponseContext for TokioResponder {
    fn dispatch(&self, job: Job) {
        self.handle.spawn(async move { job() });
    }
}
