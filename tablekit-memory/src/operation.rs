//! Units of work queued on a table's worker.

use tracing::trace;

use tablekit_core::{context::ResponseContext, predicate::Predicate};

use crate::store::RecordStore;

/// Completion callback for an operation producing `R`.
pub(crate) type Callback<R> = Box<dyn FnOnce(R) + Send + 'static>;

pub(crate) type BoxPredicate<T> = Box<dyn Predicate<T>>;

/// A queued table operation together with its completion.
pub(crate) enum Operation<T> {
    Count(Callback<usize>),
    CountMatching(BoxPredicate<T>, Callback<usize>),
    FindAll(Callback<Vec<T>>),
    FindAllMatching(BoxPredicate<T>, Callback<Vec<T>>),
    FindFirstMatching(BoxPredicate<T>, Callback<Option<T>>),
    Insert(T, Callback<()>),
    InsertAll(Vec<T>, Callback<usize>),
    DeleteAll(Callback<usize>),
    DeleteAllMatching(BoxPredicate<T>, Callback<usize>),
    DeleteFirstMatching(BoxPredicate<T>, Callback<bool>),
    Shutdown(Callback<()>),
}

impl<T: Clone + Send + 'static> Operation<T> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Operation::Count(_) => "count",
            Operation::CountMatching(..) => "count_matching",
            Operation::FindAll(_) => "find_all",
            Operation::FindAllMatching(..) => "find_all_matching",
            Operation::FindFirstMatching(..) => "find_first_matching",
            Operation::Insert(..) => "insert",
            Operation::InsertAll(..) => "insert_all",
            Operation::DeleteAll(_) => "delete_all",
            Operation::DeleteAllMatching(..) => "delete_all_matching",
            Operation::DeleteFirstMatching(..) => "delete_first_matching",
            Operation::Shutdown(_) => "shutdown",
        }
    }

    /// Runs the operation against `store` and hands its completion to `responder`.
    ///
    /// The store is fully updated before the completion is dispatched.
    pub(crate) fn execute(self, table: &str, store: &mut RecordStore<T>, responder: &dyn ResponseContext) {
        let reply = Reply { table, operation: self.kind(), responder };

        match self {
            Operation::Count(done) => reply.send(done, store.len()),
            Operation::CountMatching(predicate, done) => {
                reply.send(done, store.count_matching(&*predicate))
            }
            Operation::FindAll(done) => reply.send(done, store.snapshot()),
            Operation::FindAllMatching(predicate, done) => {
                reply.send(done, store.snapshot_matching(&*predicate))
            }
            Operation::FindFirstMatching(predicate, done) => {
                reply.send(done, store.first_matching(&*predicate))
            }
            Operation::Insert(record, done) => {
                store.push(record);
                reply.send(done, ())
            }
            Operation::InsertAll(records, done) => {
                let inserted = store.extend(records);
                reply.send(done, inserted)
            }
            Operation::DeleteAll(done) => reply.send(done, store.clear()),
            Operation::DeleteAllMatching(predicate, done) => {
                let removed = store.delete_matching(&*predicate);
                reply.send(done, removed)
            }
            Operation::DeleteFirstMatching(predicate, done) => {
                let removed = store.delete_first_matching(&*predicate);
                reply.send(done, removed)
            }
            Operation::Shutdown(done) => reply.send(done, ()),
        }
    }
}

/// Where an executed operation's completion goes.
struct Reply<'a> {
    table: &'a str,
    operation: &'static str,
    responder: &'a dyn ResponseContext,
}

impl Reply<'_> {
    fn send<R: Send + 'static>(&self, done: Callback<R>, result: R) {
        trace!(table = %self.table, operation = %self.operation, "dispatching completion");
        self.responder.dispatch(Box::new(move || done(result)));
    }
}
