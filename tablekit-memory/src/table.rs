//! In-memory table with a serialized operation worker.
//!
//! Each [`InMemoryTable`] owns one worker thread. Every operation, read or
//! write, is sent to that worker over an unbounded channel and executed there
//! in submission order, so operations never observe each other's partial
//! effects and the store needs no lock. Results are handed to the table's
//! [`ResponseContext`], which runs the completion.

use async_trait::async_trait;
use futures::{
    StreamExt,
    channel::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    executor::block_on,
};
use std::{
    fmt,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    thread,
};
use tracing::{debug, info, warn};

use tablekit_core::{
    backend::{RecordTable, RecordTableBuilder},
    context::{InlineResponder, ResponseContext, SerialResponder},
    error::{TableError, TableResult},
    predicate::{Predicate, Selection},
    record::Record,
};

use crate::{
    config::{ResponseMode, TableConfig},
    operation::{Callback, Operation},
    store::RecordStore,
};

struct TableInner<T> {
    name: Arc<str>,
    sender: UnboundedSender<Operation<T>>,
}

/// A table of records of type `T`, held in memory in insertion order.
///
/// Every method submits an operation and returns immediately. Operations on
/// one table run one at a time, in the order they were submitted, on the
/// table's private worker thread. Handles are cheap to clone and all clones
/// share the same table.
///
/// Each operation comes in two forms:
///
/// - `count()`, `find_all()`, ... return a [`Completion`] future resolving to
///   the result. The operation is queued when the method is called, not when
///   the future is first polled, and dropping the future does not cancel it.
/// - `count_with(..)`, `find_all_with(..)`, ... take a callback that is
///   invoked exactly once with the result, on the table's response context.
///
/// # Snapshots
///
/// Reads return clones of the stored records. Mutating them has no effect on
/// the table.
///
/// # Lifecycle
///
/// The worker stops after [`shutdown`](Self::shutdown), once every handle
/// has been dropped, or if a predicate panics. Submissions to a stopped table
/// fail with [`TableError::Closed`].
///
/// # Example
///
/// ```ignore
/// use tablekit::{record::Record, memory::InMemoryTable};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Contact { name: String }
///
/// impl Record for Contact {}
///
/// let table = InMemoryTable::<Contact>::new()?;
/// table.insert(Contact { name: "Alice".into() });
/// table.insert(Contact { name: "Bob".into() });
///
/// let bobs = table.count_matching(|c: &Contact| c.name == "Bob").await?;
/// assert_eq!(bobs, 1);
/// ```
pub struct InMemoryTable<T> {
    inner: Arc<TableInner<T>>,
}

impl<T: Record> InMemoryTable<T> {
    /// Starts a table with default settings.
    ///
    /// The table is named after `T::table_name()` and delivers completions on
    /// its own serial response thread.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Initialization`] if a thread cannot be spawned.
    pub fn new() -> TableResult<Self> {
        Self::builder().spawn()
    }

    /// Creates a builder for configuring a table before starting it.
    pub fn builder() -> InMemoryTableBuilder<T> {
        InMemoryTableBuilder::default()
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` if the worker has stopped accepting operations.
    pub fn is_closed(&self) -> bool {
        self.inner.sender.is_closed()
    }

    /// Counts the records in the table.
    pub fn count(&self) -> Completion<usize> {
        self.request(Operation::Count)
    }

    /// Counts the records matching `predicate`. Every record is tested.
    pub fn count_matching<P: Predicate<T>>(&self, predicate: P) -> Completion<usize> {
        self.request(|done| Operation::CountMatching(Box::new(predicate), done))
    }

    /// Returns a snapshot of every record, in table order.
    pub fn find_all(&self) -> Completion<Vec<T>> {
        self.request(Operation::FindAll)
    }

    /// Returns a snapshot of the records matching `predicate`, in table order.
    pub fn find_all_matching<P: Predicate<T>>(&self, predicate: P) -> Completion<Vec<T>> {
        self.request(|done| Operation::FindAllMatching(Box::new(predicate), done))
    }

    /// Returns the first record matching `predicate`, or `None`.
    ///
    /// The scan stops at the first match.
    pub fn find_first_matching<P: Predicate<T>>(&self, predicate: P) -> Completion<Option<T>> {
        self.request(|done| Operation::FindFirstMatching(Box::new(predicate), done))
    }

    /// Appends `record` to the end of the table.
    pub fn insert(&self, record: T) -> Completion<()> {
        self.request(|done| Operation::Insert(record, done))
    }

    /// Appends `records`, in order, as one operation. Resolves to the number appended.
    pub fn insert_all(&self, records: Vec<T>) -> Completion<usize> {
        self.request(|done| Operation::InsertAll(records, done))
    }

    /// Removes every record. Resolves to the number removed.
    pub fn delete_all(&self) -> Completion<usize> {
        self.request(Operation::DeleteAll)
    }

    /// Removes every record matching `predicate`. Resolves to the number removed.
    ///
    /// Records that do not match keep their relative order.
    pub fn delete_all_matching<P: Predicate<T>>(&self, predicate: P) -> Completion<usize> {
        self.request(|done| Operation::DeleteAllMatching(Box::new(predicate), done))
    }

    /// Removes the first record matching `predicate`. Resolves to `true` if one was removed.
    pub fn delete_first_matching<P: Predicate<T>>(&self, predicate: P) -> Completion<bool> {
        self.request(|done| Operation::DeleteFirstMatching(Box::new(predicate), done))
    }

    /// Stops the table's worker.
    ///
    /// Every operation the table accepted before the worker reaches the
    /// shutdown still runs, including ones submitted just after this call.
    /// The returned completion resolves once they have, after which the
    /// worker exits and further submissions fail with [`TableError::Closed`].
    pub fn shutdown(&self) -> Completion<()> {
        self.request(Operation::Shutdown)
    }

    /// Callback form of [`count`](Self::count).
    ///
    /// The callback runs exactly once, on the table's response context. Fails
    /// only if the table is closed, in which case the callback is dropped unrun.
    pub fn count_with<F>(&self, completion: F) -> TableResult<()>
    where
        F: FnOnce(usize) + Send + 'static,
    {
        self.submit(Operation::Count(Box::new(completion)))
    }

    /// Callback form of [`count_matching`](Self::count_matching).
    pub fn count_matching_with<P, F>(&self, predicate: P, completion: F) -> TableResult<()>
    where
        P: Predicate<T>,
        F: FnOnce(usize) + Send + 'static,
    {
        self.submit(Operation::CountMatching(Box::new(predicate), Box::new(completion)))
    }

    /// Callback form of [`find_all`](Self::find_all).
    pub fn find_all_with<F>(&self, completion: F) -> TableResult<()>
    where
        F: FnOnce(Vec<T>) + Send + 'static,
    {
        self.submit(Operation::FindAll(Box::new(completion)))
    }

    /// Callback form of [`find_all_matching`](Self::find_all_matching).
    pub fn find_all_matching_with<P, F>(&self, predicate: P, completion: F) -> TableResult<()>
    where
        P: Predicate<T>,
        F: FnOnce(Vec<T>) + Send + 'static,
    {
        self.submit(Operation::FindAllMatching(Box::new(predicate), Box::new(completion)))
    }

    /// Callback form of [`find_first_matching`](Self::find_first_matching).
    pub fn find_first_matching_with<P, F>(&self, predicate: P, completion: F) -> TableResult<()>
    where
        P: Predicate<T>,
        F: FnOnce(Option<T>) + Send + 'static,
    {
        self.submit(Operation::FindFirstMatching(Box::new(predicate), Box::new(completion)))
    }

    /// Callback form of [`insert`](Self::insert).
    pub fn insert_with<F>(&self, record: T, completion: F) -> TableResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Operation::Insert(record, Box::new(move |()| completion())))
    }

    /// Callback form of [`insert_all`](Self::insert_all).
    pub fn insert_all_with<F>(&self, records: Vec<T>, completion: F) -> TableResult<()>
    where
        F: FnOnce(usize) + Send + 'static,
    {
        self.submit(Operation::InsertAll(records, Box::new(completion)))
    }

    /// Callback form of [`delete_all`](Self::delete_all).
    pub fn delete_all_with<F>(&self, completion: F) -> TableResult<()>
    where
        F: FnOnce(usize) + Send + 'static,
    {
        self.submit(Operation::DeleteAll(Box::new(completion)))
    }

    /// Callback form of [`delete_all_matching`](Self::delete_all_matching).
    pub fn delete_all_matching_with<P, F>(&self, predicate: P, completion: F) -> TableResult<()>
    where
        P: Predicate<T>,
        F: FnOnce(usize) + Send + 'static,
    {
        self.submit(Operation::DeleteAllMatching(Box::new(predicate), Box::new(completion)))
    }

    /// Callback form of [`delete_first_matching`](Self::delete_first_matching).
    pub fn delete_first_matching_with<P, F>(&self, predicate: P, completion: F) -> TableResult<()>
    where
        P: Predicate<T>,
        F: FnOnce(bool) + Send + 'static,
    {
        self.submit(Operation::DeleteFirstMatching(Box::new(predicate), Box::new(completion)))
    }

    fn submit(&self, operation: Operation<T>) -> TableResult<()> {
        let kind = operation.kind();

        self.inner.sender.unbounded_send(operation).map_err(|_| {
            warn!(table = %self.inner.name, operation = %kind, "operation submitted to a closed table");
            TableError::Closed(self.inner.name.to_string())
        })
    }

    fn request<R, F>(&self, operation: F) -> Completion<R>
    where
        R: Send + 'static,
        F: FnOnce(Callback<R>) -> Operation<T>,
    {
        let (sender, receiver) = oneshot::channel();
        let done: Callback<R> = Box::new(move |result: R| {
            // The caller may have dropped the completion; the operation still ran.
            let _ = sender.send(result);
        });

        match self.submit(operation(done)) {
            Ok(()) => Completion {
                state: CompletionState::Pending {
                    table: Arc::clone(&self.inner.name),
                    receiver,
                },
            },
            Err(err) => Completion {
                state: CompletionState::Failed(err),
            },
        }
    }
}

impl<T> Clone for InMemoryTable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for InMemoryTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTable")
            .field("name", &self.inner.name)
            .field("closed", &self.inner.sender.is_closed())
            .finish()
    }
}

#[async_trait]
impl<T: Record> RecordTable<T> for InMemoryTable<T> {
    async fn count(&self) -> TableResult<usize> {
        InMemoryTable::count(self).await
    }

    async fn count_matching(&self, predicate: Selection<T>) -> TableResult<usize> {
        InMemoryTable::count_matching(self, predicate).await
    }

    async fn find_all(&self) -> TableResult<Vec<T>> {
        InMemoryTable::find_all(self).await
    }

    async fn find_all_matching(&self, predicate: Selection<T>) -> TableResult<Vec<T>> {
        InMemoryTable::find_all_matching(self, predicate).await
    }

    async fn find_first_matching(&self, predicate: Selection<T>) -> TableResult<Option<T>> {
        InMemoryTable::find_first_matching(self, predicate).await
    }

    async fn insert(&self, record: T) -> TableResult<()> {
        InMemoryTable::insert(self, record).await
    }

    async fn insert_all(&self, records: Vec<T>) -> TableResult<usize> {
        InMemoryTable::insert_all(self, records).await
    }

    async fn delete_all(&self) -> TableResult<usize> {
        InMemoryTable::delete_all(self).await
    }

    async fn delete_all_matching(&self, predicate: Selection<T>) -> TableResult<usize> {
        InMemoryTable::delete_all_matching(self, predicate).await
    }

    async fn delete_first_matching(&self, predicate: Selection<T>) -> TableResult<bool> {
        InMemoryTable::delete_first_matching(self, predicate).await
    }
}

/// The worker loop: owns the store and runs operations until the channel
/// closes or a shutdown is processed.
fn run_worker<T: Record>(
    name: Arc<str>,
    mut receiver: UnboundedReceiver<Operation<T>>,
    mut store: RecordStore<T>,
    responder: Arc<dyn ResponseContext>,
) {
    info!(table = %name, "table worker started");

    while let Some(operation) = block_on(receiver.next()) {
        let shutdown = matches!(operation, Operation::Shutdown(_));

        if shutdown {
            // Refuse new submissions, then finish everything already accepted
            // before acknowledging the shutdown.
            receiver.close();

            let mut drained = 0usize;
            while let Some(accepted) = block_on(receiver.next()) {
                execute(&name, accepted, &mut store, responder.as_ref());
                drained += 1;
            }
            if drained > 0 {
                debug!(table = %name, drained, "ran operations accepted before shutdown");
            }
        }

        execute(&name, operation, &mut store, responder.as_ref());

        if shutdown {
            break;
        }
    }

    info!(table = %name, records = store.len(), "table worker stopped");
}

fn execute<T: Record>(
    name: &str,
    operation: Operation<T>,
    store: &mut RecordStore<T>,
    responder: &dyn ResponseContext,
) {
    debug!(table = %name, operation = %operation.kind(), records = store.len(), "executing operation");
    operation.execute(name, store, responder);
}

/// The pending result of a table operation.
///
/// Resolves to the operation's result once the table has executed it, or to
/// [`TableError::OperationDropped`] if the worker or the response context
/// stopped before delivering it.
/// Dropping a `Completion` does not cancel the operation.
pub struct Completion<R> {
    state: CompletionState<R>,
}

enum CompletionState<R> {
    Pending {
        table: Arc<str>,
        receiver: oneshot::Receiver<R>,
    },
    Failed(TableError),
}

impl<R> Future for Completion<R> {
    type Output = TableResult<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            CompletionState::Pending { table, receiver } => Pin::new(receiver)
                .poll(cx)
                .map(|result| result.map_err(|_| TableError::OperationDropped(table.to_string()))),
            CompletionState::Failed(err) => Poll::Ready(Err(err.clone())),
        }
    }
}

impl<R> fmt::Debug for Completion<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            CompletionState::Pending { table, .. } => f
                .debug_struct("Completion")
                .field("table", table)
                .finish_non_exhaustive(),
            CompletionState::Failed(err) => f.debug_tuple("Completion").field(err).finish(),
        }
    }
}

enum ResponderChoice {
    Mode(ResponseMode),
    Custom(Arc<dyn ResponseContext>),
}

/// Builder for constructing [`InMemoryTable`] instances.
///
/// # Example
///
/// ```ignore
/// use tablekit::{context::InlineResponder, memory::InMemoryTable};
///
/// let table = InMemoryTable::<Contact>::builder()
///     .name("contacts")
///     .initial_capacity(1024)
///     .responder(InlineResponder)
///     .spawn()?;
/// ```
pub struct InMemoryTableBuilder<T> {
    name: Option<String>,
    initial_capacity: usize,
    responder: ResponderChoice,
    _record: PhantomData<fn() -> T>,
}

impl<T> Default for InMemoryTableBuilder<T> {
    fn default() -> Self {
        Self {
            name: None,
            initial_capacity: 0,
            responder: ResponderChoice::Mode(ResponseMode::default()),
            _record: PhantomData,
        }
    }
}

impl<T: Record> InMemoryTableBuilder<T> {
    /// Creates a builder from serialized settings.
    pub fn from_config(config: TableConfig) -> Self {
        Self::default().config(config)
    }

    /// Applies every setting in `config`, replacing earlier ones.
    pub fn config(mut self, config: TableConfig) -> Self {
        self.name = config.name;
        self.initial_capacity = config.initial_capacity;
        self.responder = ResponderChoice::Mode(config.response);
        self
    }

    /// Sets the table name used in logs and thread names.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reserves room for `capacity` records up front.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Selects one of the built-in response contexts.
    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.responder = ResponderChoice::Mode(mode);
        self
    }

    /// Delivers completions on a caller-provided response context.
    pub fn responder<C: ResponseContext>(self, responder: C) -> Self {
        self.shared_responder(Arc::new(responder))
    }

    /// Delivers completions on a response context shared with other tables.
    pub fn shared_responder(mut self, responder: Arc<dyn ResponseContext>) -> Self {
        self.responder = ResponderChoice::Custom(responder);
        self
    }

    /// Starts the table's worker (and response thread, in
    /// [`ResponseMode::Serial`]) and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Initialization`] if the name contains a NUL
    /// byte or a thread cannot be spawned.
    pub fn spawn(self) -> TableResult<InMemoryTable<T>> {
        let name: Arc<str> = self
            .name
            .unwrap_or_else(|| T::table_name().to_string())
            .into();

        // Thread names cannot hold NUL bytes.
        if name.contains('\0') {
            return Err(TableError::Initialization(format!(
                "table name {name:?} contains a NUL byte"
            )));
        }

        let responder: Arc<dyn ResponseContext> = match self.responder {
            ResponderChoice::Mode(ResponseMode::Serial) => Arc::new(SerialResponder::spawn(&*name)?),
            ResponderChoice::Mode(ResponseMode::Inline) => Arc::new(InlineResponder),
            ResponderChoice::Custom(responder) => responder,
        };

        let (sender, receiver) = mpsc::unbounded();
        let store = RecordStore::with_capacity(self.initial_capacity);
        let worker_name = Arc::clone(&name);

        thread::Builder::new()
            .name(format!("{name}-operations"))
            .spawn(move || run_worker(worker_name, receiver, store, responder))?;

        Ok(InMemoryTable {
            inner: Arc::new(TableInner { name, sender }),
        })
    }
}

#[async_trait]
impl<T: Record> RecordTableBuilder<T> for InMemoryTableBuilder<T> {
    type Table = InMemoryTable<T>;

    /// Starts the table. This always completes without awaiting anything.
    async fn build(self) -> TableResult<Self::Table> {
        self.spawn()
    }
}
