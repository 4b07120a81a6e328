//! Advisory progress notifications.
//!
//! Cooks and the kitchen report what they are doing through a
//! [`KitchenObserver`]. Nothing here takes part in correctness: an observer
//! may print, count or ignore events.

use crate::kitchen::RunSummary;
use crate::order::WorkItem;

/// Receives progress events from a running kitchen.
///
/// Called concurrently from every cook thread. All methods default to no-ops.
pub trait KitchenObserver: Send + Sync {
    fn service_started(&self, _workers: usize, _queued: usize) {}

    fn worker_started(&self, _worker_id: &str) {}

    fn item_started(&self, _worker_id: &str, _item: &WorkItem) {}

    fn item_finished(&self, _worker_id: &str, _item: &WorkItem) {}

    fn worker_finished(&self, _worker_id: &str, _completed: usize) {}

    fn service_finished(&self, _summary: &RunSummary) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl KitchenObserver for NoopObserver {}
