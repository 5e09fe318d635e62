//! Fixed-size worker pool for copy tasks

use crate::concurrency::report::{
    ExecutionReport, ProgressEvent, ProgressObserver, TaskOutcome, TaskRecord,
};
use crate::copy::CopyInvoker;
use crate::sync::CopyTask;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc};

pub struct WorkerPool {
    concurrency: usize,
}

/// Shared by all workers of one run
struct WorkerContext {
    queue: Mutex<mpsc::Receiver<CopyTask>>,
    invoker: Arc<dyn CopyInvoker>,
    observer: Arc<dyn ProgressObserver>,
    /// Completed count; held while notifying so events arrive in count order
    completed: std::sync::Mutex<usize>,
    /// Stored before the observer sees them, so they survive a worker panic
    records: Arc<std::sync::Mutex<Vec<TaskRecord>>>,
    total: usize,
}

impl WorkerPool {
    /// Pool with `concurrency` workers, at least one
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every task and wait until all workers have exited
    pub async fn execute(
        &self,
        tasks: Vec<CopyTask>,
        invoker: Arc<dyn CopyInvoker>,
        observer: Arc<dyn ProgressObserver>,
    ) -> ExecutionReport {
        let started = Instant::now();
        let total = tasks.len();
        let workers = self.concurrency.min(total);

        if total == 0 {
            return ExecutionReport {
                concurrency: self.concurrency,
                ..ExecutionReport::default()
            };
        }

        let (sender, receiver) = mpsc::channel(workers);
        let records = Arc::new(std::sync::Mutex::new(Vec::with_capacity(total)));
        let context = Arc::new(WorkerContext {
            queue: Mutex::new(receiver),
            invoker,
            observer,
            completed: std::sync::Mutex::new(0),
            records: Arc::clone(&records),
            total,
        });

        let handles: Vec<_> = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&context))))
            .collect();
        // workers own the queue from here on, so it closes if they all die
        drop(context);

        for task in tasks {
            if sender.send(task).await.is_err() {
                break;
            }
        }
        drop(sender);

        // a panicked worker loses its in-flight task and any still queued;
        // the report shows the gap as unaccounted
        join_all(handles).await;
        let records = std::mem::take(&mut *lock(&records));

        ExecutionReport {
            records,
            elapsed: started.elapsed(),
            concurrency: workers,
            planned: total,
        }
    }
}

fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn run_worker(id: usize, context: Arc<WorkerContext>) {
    loop {
        let next = context.queue.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        context.observer.on_dispatch(id, &task);
        let started = Instant::now();
        let result = context.invoker.invoke(&task).await;

        let output = match &result {
            Ok(text) => Some(text.clone()),
            Err(e) => e.output().map(str::to_string),
        }
        .filter(|text| !text.trim().is_empty());

        let record = TaskRecord {
            outcome: TaskOutcome::from_result(&result),
            elapsed: started.elapsed(),
            output,
            task,
        };

        lock(&context.records).push(record.clone());

        let mut completed = lock(&context.completed);
        *completed += 1;
        context.observer.on_complete(&ProgressEvent {
            completed: *completed,
            total: context.total,
            record,
        });
    }
}
