//! Task Executor Metrics

use core::fmt;
use metrics::Counter;

/// Kind of task spawned through the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Task whose panic is reported to the [`TaskManager`](crate::TaskManager).
    Critical,
    /// Regular async task.
    Regular,
    /// Closure run on the blocking pool.
    Blocking,
}

impl TaskKind {
    /// Label value used in metric names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Regular => "regular",
            Self::Blocking => "blocking",
        }
    }
}

/// Spawn counters, labelled by [`TaskKind`].
#[derive(Clone, Debug)]
pub(crate) struct TaskExecutorMetrics {
    critical_spawned: Counter,
    critical_finished: Counter,
    regular_spawned: Counter,
    regular_finished: Counter,
    blocking_spawned: Counter,
    blocking_finished: Counter,
    /// Number of critical tasks that panicked
    pub(crate) critical_panicked: Counter,
}

impl Default for TaskExecutorMetrics {
    fn default() -> Self {
        let spawned =
            |kind: TaskKind| metrics::counter!("executor.spawn.tasks_total", "kind" => kind.as_str());
        let finished = |kind: TaskKind| {
            metrics::counter!("executor.spawn.finished_tasks_total", "kind" => kind.as_str())
        };

        Self {
            critical_spawned: spawned(TaskKind::Critical),
            critical_finished: finished(TaskKind::Critical),
            regular_spawned: spawned(TaskKind::Regular),
            regular_finished: finished(TaskKind::Regular),
            blocking_spawned: spawned(TaskKind::Blocking),
            blocking_finished: finished(TaskKind::Blocking),
            critical_panicked: metrics::counter!("executor.spawn.critical_panics_total"),
        }
    }
}

impl TaskExecutorMetrics {
    /// Records a spawn and returns a guard that records completion when dropped.
    pub(crate) fn track(&self, kind: TaskKind) -> IncCounterOnDrop {
        let (spawned, finished) = match kind {
            TaskKind::Critical => (&self.critical_spawned, &self.critical_finished),
            TaskKind::Regular => (&self.regular_spawned, &self.regular_finished),
            TaskKind::Blocking => (&self.blocking_spawned, &self.blocking_finished),
        };
        spawned.increment(1);
        IncCounterOnDrop::new(finished.clone())
    }
}

/// Helper type for increasing counters even if a task fails
pub struct IncCounterOnDrop(Counter);

impl fmt::Debug for IncCounterOnDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IncCounterOnDrop").finish()
    }
}

impl IncCounterOnDrop {
    /// Creates a new instance of `IncCounterOnDrop` with the given counter.
    pub const fn new(counter: Counter) -> Self {
        Self(counter)
    }
}

impl Drop for IncCounterOnDrop {
    fn drop(&mut self) {
        self.0.increment(1);
    }
}
