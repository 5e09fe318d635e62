//! Concurrent execution of copy tasks
//!
//! A fixed number of workers pull tasks from a shared queue until it is empty.
//! Every task ends in exactly one [`TaskOutcome`]; a failing task never stops
//! the others. Results accumulate into an [`ExecutionReport`] while progress is
//! pushed to a [`ProgressObserver`], which keeps printing out of the workers.
//!
//! ## Usage Example
//!
//! ```no_run
//! use airgap_mirror::concurrency::{NoopProgress, WorkerPool};
//! use airgap_mirror::copy::CopyInvoker;
//! use airgap_mirror::sync::CopyTask;
//! use std::sync::Arc;
//!
//! # async fn example(tasks: Vec<CopyTask>, invoker: Arc<dyn CopyInvoker>) {
//! let report = WorkerPool::new(4)
//!     .execute(tasks, invoker, Arc::new(NoopProgress))
//!     .await;
//! println!("{} copied, {} failed", report.copied(), report.failed());
//! # }
//! ```

pub mod pool;
pub mod report;

pub use pool::WorkerPool;
pub use report::{
    ExecutionReport, NoopProgress, ProgressEvent, ProgressObserver, TaskOutcome, TaskRecord,
    TaskState,
};
