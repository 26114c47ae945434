use crate::{Result, Stage, WorkItem};
use rand::{Rng, rng};
use std::sync::{Condvar, Mutex};
use tracing::trace;

/// A blocking multiset of [`WorkItem`]s for one pipeline stage.
///
/// Not a FIFO: [`take`](Self::take) removes a *uniformly random* element.
/// That decorrelates consumer throughput from insertion order, and it is
/// what keeps the poison-pill shutdown protocol honest under multiple
/// consumers - a pill may be skipped by chance while real orders remain, so
/// termination is probabilistic and only guaranteed once the real
/// population drains.
///
/// Each queue owns its own lock and condition; stages never contend with
/// each other, and no operation ever holds two queue locks at once.
#[derive(Debug)]
pub struct StageQueue {
    stage: Stage,
    items: Mutex<Vec<WorkItem>>,
    available: Condvar,
}

impl StageQueue {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            items: Mutex::new(Vec::new()),
            available: Condvar::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Appends an item and wakes *all* waiters.
    ///
    /// Broadcast is deliberate: several consumers may race for the same
    /// insertion, and the losers go back to waiting.
    ///
    /// # Errors
    /// [`Error::LockPoisoned`] on a poisoned queue lock.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn add(&self, item: WorkItem) -> Result<()> {
        let mut items = self.items.lock()?;
        items.push(item);
        self.available.notify_all();
        Ok(())
    }

    /// Removes and returns a uniformly random element, blocking while the
    /// queue is empty.
    ///
    /// # Errors
    /// [`Error::LockPoisoned`] if the lock (or a condition wait on it) was
    /// poisoned. The wait must not swallow the interruption - there is no
    /// recovery path that preserves the order a worker was about to claim.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn take(&self) -> Result<WorkItem> {
        let mut items = self.items.lock()?;
        while items.is_empty() {
            trace!(stage = %self.stage, "queue empty; waiting");
            items = self.available.wait(items)?;
        }
        let index = rng().random_range(0..items.len());
        Ok(items.swap_remove(index))
    }

    /// Number of real orders currently queued. Poison pills are excluded
    /// from every reported size; they are a shutdown signal, not work.
    pub fn len(&self) -> Result<usize> {
        let items = self.items.lock()?;
        Ok(items.iter().filter(|item| !item.is_poison()).count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
