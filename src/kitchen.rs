use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::error::{KitchenError, Result};
use crate::log::{CompletionLog, LogFormat, LogMedium};
use crate::observer::{KitchenObserver, NoopObserver};
use crate::order::WorkItem;
use crate::queue::WorkQueue;
use crate::worker::{PrepTime, Worker, WorkerContext, WorkerReport, worker_name};

/// Summary of one service, produced once the log is finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub worker_count: usize,
    pub seeded: usize,
    pub records: usize,
    pub remaining: usize,
    pub cancelled: bool,
    pub log_started_at: NaiveDateTime,
    pub log_finished_at: NaiveDateTime,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub workers: Vec<WorkerReport>,
}

/// Owns the order queue and the completion log, and runs the cooks.
///
/// Lifecycle: seed with [`add_work`](Kitchen::add_work), then call
/// [`start`](Kitchen::start) once. `start` blocks until every cook has
/// terminated and the footer is on disk.
pub struct Kitchen<W: LogMedium = File> {
    queue: WorkQueue,
    log: CompletionLog<W>,
    prep: PrepTime,
    observer: Box<dyn KitchenObserver>,
    cancel: Arc<AtomicBool>,
    started: bool,
}

impl Kitchen<File> {
    /// Opens (truncating) the log file at `path` and writes its header.
    pub fn open(path: &Path, format: LogFormat) -> Result<Self> {
        Ok(Self::with_log(CompletionLog::create(path, format)?))
    }
}

impl<W: LogMedium> Kitchen<W> {
    /// Builds a kitchen around an already-initialized log.
    pub fn with_log(log: CompletionLog<W>) -> Self {
        Self {
            queue: WorkQueue::new(),
            log,
            prep: PrepTime::default(),
            observer: Box::new(NoopObserver),
            cancel: Arc::new(AtomicBool::new(false)),
            started: false,
        }
    }

    pub fn with_prep_time(mut self, prep: PrepTime) -> Self {
        self.prep = prep;
        self
    }

    pub fn with_observer(mut self, observer: impl KitchenObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Queues an order. Only allowed before the service starts.
    pub fn add_work(&mut self, item: WorkItem) -> Result<()> {
        if self.started {
            return Err(KitchenError::AlreadyStarted);
        }
        self.queue.enqueue(item)
    }

    /// Runs `worker_count` cooks until the queue is drained, then finalizes
    /// the log.
    ///
    /// Each cook gets its own named OS thread. If any cook fails, the others
    /// are cancelled, every thread is still joined, and the first error is
    /// returned without writing the footer. The partial log stays on disk.
    pub fn start(&mut self, worker_count: usize) -> Result<RunSummary> {
        if self.started {
            return Err(KitchenError::AlreadyStarted);
        }
        if worker_count == 0 {
            return Err(KitchenError::InvalidWorkerCount(worker_count));
        }
        self.started = true;

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("service", run_id = %run_id, workers = worker_count);
        let _enter = span.enter();

        let seeded = self.queue.len()?;
        info!(seeded, "service starting");
        self.observer.service_started(worker_count, seeded);
        let started_at = Utc::now();

        let ctx = WorkerContext {
            queue: &self.queue,
            log: &self.log,
            prep: self.prep,
            observer: self.observer.as_ref(),
            cancel: &self.cancel,
        };
        let outcomes = run_workers(ctx, worker_count);

        let mut workers = Vec::with_capacity(worker_count);
        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(report) => workers.push(report),
                Err(e) => {
                    error!(error = %e, "worker did not finish cleanly");
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let log_finished_at = self.log.finalize()?;
        let finished_at = Utc::now();
        let remaining = self.queue.len()?;
        let cancelled = self.cancel.load(Ordering::SeqCst);
        if remaining > 0 {
            warn!(remaining, cancelled, "service ended with orders still queued");
        }

        let summary = RunSummary {
            run_id,
            worker_count,
            seeded,
            records: self.log.record_count()?,
            remaining,
            cancelled,
            log_started_at: self.log.started_at(),
            log_finished_at,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            workers,
        };
        info!(records = summary.records, duration_ms = summary.duration_ms, "service finished");
        self.observer.service_finished(&summary);
        Ok(summary)
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn log(&self) -> &CompletionLog<W> {
        &self.log
    }

    /// Shared flag that, once raised, stops every cook before its next take.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn into_log(self) -> CompletionLog<W> {
        self.log
    }
}

// Spawns one scoped thread per cook and joins them all, in spawn order.
fn run_workers<W: LogMedium>(
    ctx: WorkerContext<'_, W>,
    worker_count: usize,
) -> Vec<Result<WorkerReport>> {
    thread::scope(|scope| {
        let spawned: Vec<_> = (1..=worker_count)
            .map(|n| {
                let name = worker_name(n);
                let worker = Worker::new(name.clone(), ctx);
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || worker.run());
                if handle.is_err() {
                    ctx.cancel.store(true, Ordering::SeqCst);
                }
                (name, handle)
            })
            .collect();

        spawned
            .into_iter()
            .map(|(name, handle)| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(KitchenError::WorkerPanicked(name))),
                Err(e) => Err(KitchenError::Io(e)),
            })
            .collect()
    })
}
