//! In-flight operation tracking.
//!
//! Every call dispatched through an [`OperationRegistry`] is spawned on the
//! configured runtime and recorded in the registry's outstanding set before
//! `dispatch` returns. A completion guard travels with the spawned future and
//! removes the entry exactly once, whether the call produced a value, an
//! error, panicked, or was aborted. The entry is removed before the caller can
//! observe the result.
//!
//! [`OperationRegistry::drain`] snapshots the outstanding set and waits for
//! every snapshotted operation. Operations dispatched after the snapshot stay
//! registered and are picked up by a later drain.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::join_all;
use parking_lot::Mutex;
use slackline_core::logging::targets;
use slackline_core::{Error, OperationId, Outcome, Result};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;

struct Entry {
    done: watch::Sender<Option<Outcome>>,
    abort: Option<AbortHandle>,
}

struct RegistryInner {
    name: String,
    runtime: Handle,
    entries: Mutex<HashMap<OperationId, Entry>>,
}

impl RegistryInner {
    /// Remove an entry and publish its outcome. Later calls for the same ID
    /// are no-ops.
    fn finish(&self, id: OperationId, outcome: Outcome) {
        let entry = self.entries.lock().remove(&id);
        if let Some(entry) = entry {
            tracing::trace!(
                target: targets::REGISTRY,
                group = %self.name,
                operation = %id,
                outcome = ?outcome,
                "operation deregistered"
            );
            entry.done.send_replace(Some(outcome));
        }
    }
}

/// Deregisters its operation when completed or dropped.
struct Completion<T> {
    registry: Arc<RegistryInner>,
    id: OperationId,
    sender: Option<oneshot::Sender<Result<T>>>,
}

impl<T> Completion<T> {
    fn complete(mut self, result: Result<T>) {
        self.registry.finish(self.id, Outcome::of(&result));
        if let Some(sender) = self.sender.take() {
            // The caller may have dropped its handle.
            let _ = sender.send(result);
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        // Aborted, panicked, or torn down with the runtime.
        self.registry.finish(self.id, Outcome::Cancelled);
    }
}

/// The set of outstanding operations of one resource group.
///
/// Cheaply cloneable; clones share the same set.
#[derive(Clone)]
pub struct OperationRegistry {
    inner: Arc<RegistryInner>,
}

impl OperationRegistry {
    /// Create an empty registry spawning onto `runtime`.
    pub fn new(name: impl Into<String>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                name: name.into(),
                runtime,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The name of the owning resource group.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Spawn `future` and track it until it finishes.
    pub fn dispatch<F, T>(&self, future: F) -> InFlight<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let id = OperationId::next();
        let (done, _) = watch::channel(None);
        self.inner
            .entries
            .lock()
            .insert(id, Entry { done, abort: None });

        tracing::trace!(
            target: targets::REGISTRY,
            group = %self.inner.name,
            operation = %id,
            "operation registered"
        );

        let (sender, receiver) = oneshot::channel();
        let completion = Completion {
            registry: self.inner.clone(),
            id,
            sender: Some(sender),
        };

        let task = self.inner.runtime.spawn(async move {
            let result = future.await;
            completion.complete(result);
        });
        let abort = task.abort_handle();

        // The task may already have finished and removed its entry.
        if let Some(entry) = self.inner.entries.lock().get_mut(&id) {
            entry.abort = Some(abort.clone());
        }

        InFlight {
            id,
            state: State::Pending { receiver, abort },
        }
    }

    /// Number of outstanding operations.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Check if no operations are outstanding.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// IDs of the outstanding operations.
    pub fn ids(&self) -> Vec<OperationId> {
        self.inner.entries.lock().keys().copied().collect()
    }

    /// Abort every outstanding operation.
    ///
    /// Aborted operations deregister themselves as cancelled.
    pub fn abort_all(&self) -> usize {
        let handles: Vec<AbortHandle> = self
            .inner
            .entries
            .lock()
            .values()
            .filter_map(|e| e.abort.clone())
            .collect();
        for handle in &handles {
            handle.abort();
        }
        handles.len()
    }

    /// Wait for every operation outstanding when the drain starts, i.e. on
    /// its first poll.
    ///
    /// All snapshotted operations are awaited even if some fail. If any of
    /// them failed, the failures are returned together as [`Error::Drain`].
    /// Cancelled operations are not failures.
    pub async fn drain(&self) -> Result<()> {
        let pending: Vec<(OperationId, watch::Receiver<Option<Outcome>>)> = self
            .inner
            .entries
            .lock()
            .iter()
            .map(|(id, entry)| (*id, entry.done.subscribe()))
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            target: targets::REGISTRY,
            group = %self.inner.name,
            pending = pending.len(),
            "draining outstanding operations"
        );

        let outcomes = join_all(pending.into_iter().map(|(id, mut done)| async move {
            let outcome = match done.wait_for(Option::is_some).await {
                Ok(outcome) => outcome.as_ref().cloned().unwrap_or(Outcome::Cancelled),
                Err(_) => Outcome::Cancelled,
            };
            (id, outcome)
        }))
        .await;

        let failures: Vec<_> = outcomes
            .into_iter()
            .filter_map(|(id, outcome)| outcome.into_failure(id))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                target: targets::REGISTRY,
                group = %self.inner.name,
                failed = failures.len(),
                "drained operations reported failures"
            );
            Err(Error::Drain { failures })
        }
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("name", &self.inner.name)
            .field("outstanding", &self.len())
            .finish()
    }
}

/// Fold the results of several drains into one.
///
/// Drain failures are concatenated into a single [`Error::Drain`]; any other
/// error is returned as is.
pub fn combine_drains(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(()) => {}
            Err(Error::Drain { failures: more }) => failures.extend(more),
            Err(other) => return Err(other),
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Drain { failures })
    }
}

enum State<T> {
    Pending {
        receiver: oneshot::Receiver<Result<T>>,
        abort: AbortHandle,
    },
    Rejected(Option<Error>),
}

/// A handle to a dispatched call.
///
/// Await it to get the call's result. Dropping the handle does not cancel the
/// call; it keeps running and stays tracked by its registry.
pub struct InFlight<T> {
    id: OperationId,
    state: State<T>,
}

impl<T> InFlight<T> {
    /// A handle for a call rejected before dispatch. It resolves to `error`
    /// immediately and was never registered.
    pub fn rejected(error: Error) -> Self {
        Self {
            id: OperationId::next(),
            state: State::Rejected(Some(error)),
        }
    }

    /// The operation ID.
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Abort the call. Its pending I/O is dropped and it resolves to
    /// [`Error::Cancelled`] unless it already finished.
    pub fn abort(&self) {
        if let State::Pending { abort, .. } = &self.state {
            abort.abort();
        }
    }

    /// Check whether the spawned call has finished.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            State::Pending { abort, .. } => abort.is_finished(),
            State::Rejected(_) => true,
        }
    }
}

impl<T> Unpin for InFlight<T> {}

impl<T> Future for InFlight<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Pending { receiver, .. } => Pin::new(receiver)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(Error::Cancelled))),
            State::Rejected(error) => {
                Poll::Ready(Err(error.take().unwrap_or(Error::Cancelled)))
            }
        }
    }
}

impl<T> std::fmt::Debug for InFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use slackline_core::ErrorKind;

    fn registry() -> OperationRegistry {
        OperationRegistry::new("test", Handle::current())
    }

    #[tokio::test]
    async fn entry_is_registered_on_dispatch() {
        let registry = registry();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = registry.dispatch(async move {
            let _ = rx.await;
            Ok(1)
        });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids(), vec![handle.id()]);

        tx.send(()).unwrap();
        assert_eq!(handle.await.unwrap(), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn failed_call_is_removed_before_caller_sees_error() {
        let registry = registry();
        let handle = registry.dispatch(async { Err::<(), _>(Error::Api("nope".into())) });
        let err = handle.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn abort_deregisters_and_resolves_cancelled() {
        let registry = registry();
        let handle = registry.dispatch(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        assert_eq!(registry.len(), 1);

        handle.abort();
        let err = handle.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn panicking_call_is_deregistered() {
        let registry = registry();
        let handle = registry.dispatch(async {
            if std::hint::black_box(true) {
                panic!("boom");
            }
            Ok(())
        });
        let err = handle.await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn drain_waits_for_all_and_aggregates_failures() {
        let registry = registry();
        let ok = registry.dispatch(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(())
        });
        let _failed = registry.dispatch(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err::<(), _>(Error::Api("channel_not_found".into()))
        });
        assert_eq!(registry.len(), 2);

        let err = registry.drain().await.unwrap_err();
        assert!(registry.is_empty());
        match err {
            Error::Drain { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].kind, ErrorKind::Api);
            }
            other => panic!("expected drain error, got {other:?}"),
        }

        // Results stay available to callers after a drain.
        ok.await.unwrap();
    }

    #[tokio::test]
    async fn drain_is_idempotent() {
        let registry = registry();
        registry.dispatch(async { Ok(()) });
        registry.drain().await.unwrap();
        registry.drain().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn drain_only_awaits_snapshot() {
        let registry = registry();
        let (tx, rx) = oneshot::channel::<()>();
        registry.dispatch(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        });

        let draining = registry.drain();
        tokio::pin!(draining);
        // Snapshot is taken on first poll.
        assert!(futures_util::poll!(draining.as_mut()).is_pending());

        let late = registry.dispatch(async move {
            let _ = rx.await;
            Ok(())
        });
        draining.await.unwrap();

        // The late operation is still tracked until it finishes.
        assert_eq!(registry.ids(), vec![late.id()]);
        tx.send(()).unwrap();
        late.await.unwrap();
        registry.drain().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn cancelled_operations_do_not_fail_drain() {
        let registry = registry();
        let handle = registry.dispatch(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        handle.abort();
        registry.drain().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn abort_all_cancels_everything() {
        let registry = registry();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                registry.dispatch(async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                })
            })
            .collect();
        assert_eq!(registry.abort_all(), 3);
        for handle in handles {
            assert_eq!(handle.await.unwrap_err().kind(), ErrorKind::Cancelled);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn drain_failures_are_combined() {
        let failure = |n| slackline_core::OperationFailure {
            id: OperationId::from_raw(n),
            kind: ErrorKind::Api,
            message: "x".into(),
        };
        let combined = combine_drains(vec![
            Ok(()),
            Err(Error::Drain { failures: vec![failure(1)] }),
            Err(Error::Drain { failures: vec![failure(2), failure(3)] }),
        ]);
        match combined {
            Err(Error::Drain { failures }) => assert_eq!(failures.len(), 3),
            other => panic!("expected drain error, got {other:?}"),
        }
        assert!(combine_drains(vec![Ok(()), Ok(())]).is_ok());
    }

    #[tokio::test]
    async fn rejected_handle_is_not_registered() {
        let registry = registry();
        let handle: InFlight<()> = InFlight::rejected(Error::Config("no url".into()));
        assert!(handle.is_finished());
        assert!(registry.is_empty());
        assert_eq!(handle.await.unwrap_err().kind(), ErrorKind::Config);
    }
}
