use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span};

use super::prep::PrepTime;
use super::state::{WorkerEvent, WorkerState};
use crate::error::{KitchenError, Result};
use crate::log::{CompletionLog, LogMedium};
use crate::observer::KitchenObserver;
use crate::queue::WorkQueue;

/// Raises the cancel flag when the owning cook unwinds, so a panic stops
/// its peers the same way a returned error does.
struct CancelOnPanic<'a>(&'a AtomicBool);

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("worker panicked, cancelling the service");
            self.0.store(true, Ordering::SeqCst);
        }
    }
}

/// Shared resources every cook works against.
pub struct WorkerContext<'a, W: LogMedium> {
    pub queue: &'a WorkQueue,
    pub log: &'a CompletionLog<W>,
    pub prep: PrepTime,
    pub observer: &'a dyn KitchenObserver,
    pub cancel: &'a AtomicBool,
}

// Manual impls: deriving would demand `W: Copy`.
impl<W: LogMedium> Clone for WorkerContext<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: LogMedium> Copy for WorkerContext<'_, W> {}

/// Name of the `n`th cook (1-based).
pub fn worker_name(n: usize) -> String {
    format!("Cocinero-{n}")
}

/// What one cook did during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker_id: String,
    pub completed: Vec<u64>,
    pub state_transitions: Vec<WorkerState>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// A cook: pulls orders until the queue runs dry.
pub struct Worker<'a, W: LogMedium> {
    id: String,
    ctx: WorkerContext<'a, W>,
    state: WorkerState,
    history: Vec<WorkerState>,
    completed: Vec<u64>,
    cancelled: bool,
}

impl<'a, W: LogMedium> Worker<'a, W> {
    pub fn new(id: String, ctx: WorkerContext<'a, W>) -> Self {
        Self {
            id,
            ctx,
            state: WorkerState::Running,
            history: Vec::new(),
            completed: Vec::new(),
            cancelled: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs the cook to completion on the current thread.
    ///
    /// Any failure raises the shared cancel flag so the other cooks stop
    /// taking new orders, then propagates to the caller.
    pub fn run(mut self) -> Result<WorkerReport> {
        let span = info_span!("worker", worker = %self.id);
        let _enter = span.enter();

        let _unwind = CancelOnPanic(self.ctx.cancel);
        let started_at = Utc::now();
        self.ctx.observer.worker_started(&self.id);
        debug!("worker started");

        let outcome = self.serve();
        if let Err(e) = &outcome {
            error!(error = %e, "worker failed, cancelling the service");
            self.ctx.cancel.store(true, Ordering::SeqCst);
            // Record the terminal state without masking the original error.
            if let Some(next) = self.state.next(WorkerEvent::Failed) {
                self.history.push(self.state);
                self.state = next;
            }
        }
        self.ctx
            .observer
            .worker_finished(&self.id, self.completed.len());
        outcome?;

        let finished_at = Utc::now();
        info!(completed = self.completed.len(), "worker terminated");

        let mut transitions = self.history;
        transitions.push(self.state);
        Ok(WorkerReport {
            worker_id: self.id,
            completed: self.completed,
            state_transitions: transitions,
            cancelled: self.cancelled,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        })
    }

    fn serve(&mut self) -> Result<()> {
        let mut rng = rand::thread_rng();

        loop {
            if self.ctx.cancel.load(Ordering::SeqCst) {
                debug!("cancel flag raised, stopping");
                self.cancelled = true;
                return self.advance(WorkerEvent::Cancelled);
            }

            let Some(item) = self.ctx.queue.take_or_empty()? else {
                debug!("queue empty, stopping");
                return self.advance(WorkerEvent::QueueEmpty);
            };
            self.advance(WorkerEvent::Took)?;
            self.ctx.observer.item_started(&self.id, &item);

            // No lock is held while the order "cooks".
            let delay = self.ctx.prep.sample(&mut rng);
            debug!(order_id = item.id(), delay_ms = delay.as_millis() as u64, "preparing");
            thread::sleep(delay);
            self.advance(WorkerEvent::Prepared)?;

            self.ctx.log.append(&self.id, &item)?;
            self.advance(WorkerEvent::Logged)?;
            self.completed.push(item.id());
            self.ctx.observer.item_finished(&self.id, &item);
        }
    }

    fn advance(&mut self, event: WorkerEvent) -> Result<()> {
        let next = self
            .state
            .next(event)
            .ok_or_else(|| KitchenError::InvalidTransition {
                worker: self.id.clone(),
                state: self.state,
                event,
            })?;
        self.history.push(self.state);
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogFormat, parse_log};
    use crate::observer::NoopObserver;
    use crate::order::WorkItem;
    use std::io::{self, Write};

    fn queue_of(n: u64) -> WorkQueue {
        WorkQueue::with_items((1..=n).map(|id| WorkItem::new(id, format!("Plato {id}")).unwrap()))
    }

    fn ctx<'a, W: LogMedium>(
        queue: &'a WorkQueue,
        log: &'a CompletionLog<W>,
        cancel: &'a AtomicBool,
    ) -> WorkerContext<'a, W> {
        WorkerContext {
            queue,
            log,
            prep: PrepTime::instant(),
            observer: &NoopObserver,
            cancel,
        }
    }

    #[test]
    fn single_worker_drains_queue_in_order() {
        let queue = queue_of(4);
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(false);

        let report = Worker::new(worker_name(1), ctx(&queue, &log, &cancel))
            .run()
            .unwrap();

        assert_eq!(report.worker_id, "Cocinero-1");
        assert_eq!(report.completed, vec![1, 2, 3, 4]);
        assert!(!report.cancelled);
        assert!(queue.is_empty().unwrap());
        assert_eq!(log.record_count().unwrap(), 4);
    }

    #[test]
    fn records_state_transitions() {
        let queue = queue_of(1);
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(false);

        let report = Worker::new(worker_name(2), ctx(&queue, &log, &cancel))
            .run()
            .unwrap();

        assert_eq!(
            report.state_transitions,
            vec![
                WorkerState::Running,
                WorkerState::Processing,
                WorkerState::Logging,
                WorkerState::Running,
                WorkerState::Terminated,
            ]
        );
    }

    #[test]
    fn empty_queue_terminates_immediately() {
        let queue = WorkQueue::new();
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(false);

        let report = Worker::new(worker_name(1), ctx(&queue, &log, &cancel))
            .run()
            .unwrap();

        assert!(report.completed.is_empty());
        assert_eq!(
            report.state_transitions,
            vec![WorkerState::Running, WorkerState::Terminated]
        );
    }

    #[test]
    fn raised_cancel_flag_stops_before_taking() {
        let queue = queue_of(3);
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(true);

        let report = Worker::new(worker_name(1), ctx(&queue, &log, &cancel))
            .run()
            .unwrap();

        assert!(report.cancelled);
        assert!(report.completed.is_empty());
        assert_eq!(queue.len().unwrap(), 3);
    }

    struct BrokenDisk;

    impl Write for BrokenDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            // Let the header through, refuse anything after it.
            if buf.starts_with(b"===") {
                Ok(buf.len())
            } else {
                Err(io::Error::other("read-only filesystem"))
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogMedium for BrokenDisk {
        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn append_failure_propagates_and_cancels_peers() {
        let queue = queue_of(3);
        let log = CompletionLog::from_writer(BrokenDisk, LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(false);

        let err = Worker::new(worker_name(1), ctx(&queue, &log, &cancel))
            .run()
            .unwrap_err();

        assert!(matches!(
            err,
            KitchenError::LogWrite {
                stage: crate::error::LogStage::Append,
                ..
            }
        ));
        assert!(cancel.load(Ordering::SeqCst));
        // The failed order was taken; the rest stay queued.
        assert_eq!(queue.snapshot_ids().unwrap(), vec![2, 3]);
    }

    struct Butterfingers;

    impl KitchenObserver for Butterfingers {
        fn item_started(&self, _worker_id: &str, _item: &WorkItem) {
            panic!("dropped the tray");
        }
    }

    #[test]
    fn panic_raises_cancel_flag() {
        let queue = queue_of(2);
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(false);
        let ctx = WorkerContext {
            observer: &Butterfingers,
            ..ctx(&queue, &log, &cancel)
        };

        let joined = thread::scope(|scope| {
            scope
                .spawn(|| Worker::new(worker_name(1), ctx).run())
                .join()
        });

        assert!(joined.is_err());
        assert!(cancel.load(Ordering::SeqCst));
        assert_eq!(queue.snapshot_ids().unwrap(), vec![2]);
    }

    #[test]
    fn log_lines_carry_worker_name() {
        let queue = queue_of(2);
        let log = CompletionLog::from_writer(Vec::new(), LogFormat::Text).unwrap();
        let cancel = AtomicBool::new(false);

        Worker::new(worker_name(3), ctx(&queue, &log, &cancel))
            .run()
            .unwrap();
        log.finalize().unwrap();

        let text = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let parsed = parse_log(&text).unwrap();
        assert!(parsed.records.iter().all(|r| r.worker_id == "Cocinero-3"));
    }
}
