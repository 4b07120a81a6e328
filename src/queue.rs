use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use crate::error::{KitchenError, Result};
use crate::order::WorkItem;

/// Shared FIFO of pending orders.
///
/// Cooks pull from the head with [`take_or_empty`](WorkQueue::take_or_empty);
/// nothing is pre-assigned, so faster cooks simply take more orders. Every
/// mutation happens with the inner mutex held, and the guard never outlives
/// the single push or pop it protects.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue already holding `items`, in iteration order.
    pub fn with_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    /// Appends an order at the tail.
    pub fn enqueue(&self, item: WorkItem) -> Result<()> {
        let mut items = self.guard()?;
        trace!(order_id = item.id(), "order enqueued");
        items.push_back(item);
        Ok(())
    }

    /// Removes and returns the head order, or `None` once the queue is drained.
    ///
    /// `None` is final: nothing is enqueued after seeding, so callers should
    /// stop rather than poll again. Calling it on an empty queue any number of
    /// times keeps returning `Ok(None)`.
    pub fn take_or_empty(&self) -> Result<Option<WorkItem>> {
        let item = self.guard()?.pop_front();
        if let Some(item) = &item {
            trace!(order_id = item.id(), "order taken");
        }
        Ok(item)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.guard()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.guard()?.is_empty())
    }

    /// Ids currently waiting, head first.
    pub fn snapshot_ids(&self) -> Result<Vec<u64>> {
        Ok(self.guard()?.iter().map(WorkItem::id).collect())
    }

    // A poisoned lock means a thread died mid-critical-section; treat it as a defect.
    fn guard(&self) -> Result<MutexGuard<'_, VecDeque<WorkItem>>> {
        self.items
            .lock()
            .map_err(|e| KitchenError::QueueCorruption(e.to_string()))
    }
}
