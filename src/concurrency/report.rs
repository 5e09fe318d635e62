//! Task outcomes, the execution report and progress events

use crate::copy::is_missing_source;
use crate::error::{MirrorError, Result};
use crate::sync::CopyTask;
use std::time::Duration;

/// Terminal state of a copy task
///
/// A task is planned while it sits in a [`Plan`](crate::sync::Plan),
/// dispatched when [`ProgressObserver::on_dispatch`] fires, and ends in one of
/// these states when [`ProgressObserver::on_complete`] fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Succeeded,
    Skipped,
    Failed,
}

/// How a dispatched task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// Source artifact was gone at copy time
    Skipped { reason: String },
    Failed { error: String },
}

impl TaskOutcome {
    /// Classify the result of a copy invocation
    ///
    /// A copy error whose output carries a not-found marker is a skip, any
    /// other error is a failure.
    pub fn from_result(result: &Result<String>) -> Self {
        match result {
            Ok(_) => TaskOutcome::Succeeded,
            Err(error @ MirrorError::Copy { output, .. }) => {
                if is_missing_source(output) {
                    TaskOutcome::Skipped {
                        reason: output.trim().to_string(),
                    }
                } else {
                    TaskOutcome::Failed {
                        error: error.to_string(),
                    }
                }
            }
            Err(error) => TaskOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Succeeded => TaskState::Succeeded,
            TaskOutcome::Skipped { .. } => TaskState::Skipped,
            TaskOutcome::Failed { .. } => TaskState::Failed,
        }
    }
}

/// A finished task
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task: CopyTask,
    pub outcome: TaskOutcome,
    pub elapsed: Duration,
    /// Captured copy tool output, when it produced any
    pub output: Option<String>,
}

/// Sent after every completion
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Completed tasks so far, this one included; strictly increasing
    pub completed: usize,
    pub total: usize,
    pub record: TaskRecord,
}

/// Receives pool progress; called from worker tasks
pub trait ProgressObserver: Send + Sync {
    fn on_dispatch(&self, _worker: usize, _task: &CopyTask) {}

    fn on_complete(&self, event: &ProgressEvent);
}

/// Observer that ignores everything
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_complete(&self, _event: &ProgressEvent) {}
}

/// Everything the pool learned about a run
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub records: Vec<TaskRecord>,
    pub elapsed: Duration,
    pub concurrency: usize,
    /// Tasks handed to the pool
    pub planned: usize,
}

impl ExecutionReport {
    fn count(&self, state: TaskState) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.state() == state)
            .count()
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn copied(&self) -> usize {
        self.count(TaskState::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(TaskState::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskState::Failed)
    }

    /// Planned tasks without a record, only non-zero if a worker died
    pub fn unaccounted(&self) -> usize {
        self.planned.saturating_sub(self.records.len())
    }

    /// Skips do not count against the run
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.unaccounted() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome.state() == TaskState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_error(output: &str) -> Result<String> {
        Err(MirrorError::Copy {
            reference: "docker://src/demo/app:v1".to_string(),
            output: output.to_string(),
        })
    }

    #[test]
    fn test_manifest_unknown_is_skip() {
        let outcome = TaskOutcome::from_result(&copy_error(
            "time=\"...\" level=fatal msg=\"Error reading manifest v1: manifest unknown\"\n",
        ));
        assert_eq!(outcome.state(), TaskState::Skipped);
    }

    #[test]
    fn test_other_copy_errors_fail() {
        let outcome = TaskOutcome::from_result(&copy_error("unauthorized: authentication required"));
        assert_eq!(outcome.state(), TaskState::Failed);
    }

    #[test]
    fn test_spawn_errors_fail() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "manifest unknown");
        let outcome = TaskOutcome::from_result(&Err(MirrorError::Io(err)));
        assert_eq!(outcome.state(), TaskState::Failed);
    }

    #[test]
    fn test_success() {
        assert_eq!(TaskOutcome::from_result(&Ok(String::new())), TaskOutcome::Succeeded);
    }

    #[test]
    fn test_lost_tasks_fail_the_run() {
        let report = ExecutionReport {
            planned: 2,
            ..ExecutionReport::default()
        };
        assert_eq!(report.unaccounted(), 2);
        assert!(!report.is_success());
    }
}
