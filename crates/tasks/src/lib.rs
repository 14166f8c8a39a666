//! Task management.
//!
//! [`TaskManager`] owns the runtime handle and observes critical tasks. It is a
//! future that resolves with a [`PanickedTaskError`] as soon as any task
//! spawned through [`TaskExecutor::spawn_critical`] panics.
//!
//! [`TaskExecutor`] is the cheap, clonable spawner handed to components. Tasks
//! spawned through it are not tied to the lifetime of whoever spawned them.

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::FutureExt;
use tokio::{
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tracing::{Instrument, error};

mod metrics;

use metrics::TaskExecutorMetrics;
pub use metrics::{IncCounterOnDrop, TaskKind};

/// Error emitted when a critical task panicked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("critical task `{task_name}` panicked: `{error:?}`")]
pub struct PanickedTaskError {
    task_name: &'static str,
    error: Option<String>,
}

impl PanickedTaskError {
    fn new(task_name: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let error = match payload.downcast::<String>() {
            Ok(message) => Some(*message),
            Err(payload) => payload.downcast_ref::<&str>().map(|s| (*s).to_string()),
        };
        Self { task_name, error }
    }

    /// Name of the task that panicked.
    pub fn task_name(&self) -> &'static str {
        self.task_name
    }

    /// Panic message, if it was a string.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Owns the runtime handle and receives critical task panics.
///
/// Poll it (or `select!` on it) to be notified when a critical task dies.
#[derive(Debug)]
#[must_use = "TaskManager does nothing unless polled"]
pub struct TaskManager {
    handle: Handle,
    panicked_tasks_tx: UnboundedSender<PanickedTaskError>,
    panicked_tasks_rx: UnboundedReceiver<PanickedTaskError>,
    metrics: TaskExecutorMetrics,
}

impl TaskManager {
    /// Create a manager bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Create a manager for the given runtime handle.
    pub fn new(handle: Handle) -> Self {
        let (panicked_tasks_tx, panicked_tasks_rx) = unbounded_channel();
        Self {
            handle,
            panicked_tasks_tx,
            panicked_tasks_rx,
            metrics: TaskExecutorMetrics::default(),
        }
    }

    /// Returns an executor that spawns onto this manager's runtime.
    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor {
            handle: self.handle.clone(),
            panicked_tasks_tx: self.panicked_tasks_tx.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl Future for TaskManager {
    type Output = Result<(), PanickedTaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut().panicked_tasks_rx.poll_recv(cx) {
            Poll::Ready(Some(err)) => Poll::Ready(Err(err)),
            Poll::Ready(None) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Clonable handle for spawning tasks.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    handle: Handle,
    panicked_tasks_tx: UnboundedSender<PanickedTaskError>,
    metrics: TaskExecutorMetrics,
}

impl TaskExecutor {
    /// Returns the runtime handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawn a regular task.
    ///
    /// The task runs to completion on its own; dropping the returned handle
    /// detaches it.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let finished = self.metrics.track(TaskKind::Regular);
        self.handle.spawn(async move {
            let _finished = finished;
            fut.await
        })
    }

    /// Spawn a task whose panic is reported to the [`TaskManager`].
    pub fn spawn_critical<F>(&self, name: &'static str, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let finished = self.metrics.track(TaskKind::Critical);
        let panicked = self.metrics.critical_panicked.clone();
        let panicked_tasks_tx = self.panicked_tasks_tx.clone();
        let span = tracing::debug_span!("critical_task", task = name);

        let task = async move {
            let _finished = finished;
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                let err = PanickedTaskError::new(name, payload);
                error!(task = name, error = ?err.error(), "critical task panicked");
                panicked.increment(1);
                let _ = panicked_tasks_tx.send(err);
            }
        };

        self.handle.spawn(task.instrument(span))
    }

    /// Run a blocking closure on the runtime's blocking pool.
    pub fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let finished = self.metrics.track(TaskKind::Blocking);
        self.handle.spawn_blocking(move || {
            let _finished = finished;
            f()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawn_returns_output() {
        let manager = TaskManager::current();
        let executor = manager.executor();

        let handle = executor.spawn(async { 7u64 });
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawned_task_outlives_spawner() {
        let manager = TaskManager::current();
        let executor = manager.executor();
        let (tx, rx) = tokio::sync::oneshot::channel();

        {
            let executor = executor.clone();
            // The handle is dropped immediately; the task still completes.
            drop(executor.spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let _ = tx.send(42u8);
            }));
        }

        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_critical_panic_resolves_manager() {
        let manager = TaskManager::current();
        let executor = manager.executor();

        executor.spawn_critical("doomed", async {
            panic!("boom");
        });

        let err = tokio::time::timeout(Duration::from_secs(5), manager)
            .await
            .expect("manager should resolve")
            .unwrap_err();
        assert_eq!(err.task_name(), "doomed");
        assert_eq!(err.error(), Some("boom"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_critical_success_does_not_resolve_manager() {
        let manager = TaskManager::current();
        let executor = manager.executor();

        executor.spawn_critical("fine", async {}).await.unwrap();

        let res = tokio::time::timeout(Duration::from_millis(50), manager).await;
        assert!(res.is_err(), "manager must stay pending without panics");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawn_blocking() {
        let manager = TaskManager::current();
        let executor = manager.executor();

        let out = executor.spawn_blocking(|| 2 + 2).await.unwrap();
        assert_eq!(out, 4);
    }
}
