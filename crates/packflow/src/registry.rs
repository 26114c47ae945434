use crate::{Result, Stage, StageQueue};
use crossbeam_utils::CachePadded;

/// Owns the five stage queues.
///
/// Each queue sits in its own cache line so that the independent queue locks
/// do not false-share. The registry itself adds no locking: every operation
/// goes through exactly one queue, and [`depths`](Self::depths) reads the
/// queues one lock at a time.
#[derive(Debug)]
pub struct OrderRegistry {
    preparation: CachePadded<StageQueue>,
    transit: CachePadded<StageQueue>,
    delivered: CachePadded<StageQueue>,
    failed: CachePadded<StageQueue>,
    verified: CachePadded<StageQueue>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self {
            preparation: CachePadded::new(StageQueue::new(Stage::Preparation)),
            transit: CachePadded::new(StageQueue::new(Stage::Transit)),
            delivered: CachePadded::new(StageQueue::new(Stage::Delivered)),
            failed: CachePadded::new(StageQueue::new(Stage::Failed)),
            verified: CachePadded::new(StageQueue::new(Stage::Verified)),
        }
    }

    /// Orders waiting to be dispatched.
    pub fn preparation(&self) -> &StageQueue {
        &self.preparation
    }

    /// Orders released from their locker and on the way to delivery.
    pub fn transit(&self) -> &StageQueue {
        &self.transit
    }

    /// Orders delivered and awaiting final verification.
    pub fn delivered(&self) -> &StageQueue {
        &self.delivered
    }

    /// Terminal sink for failed orders. No consumer.
    pub fn failed(&self) -> &StageQueue {
        &self.failed
    }

    /// Terminal sink for verified orders. No consumer.
    pub fn verified(&self) -> &StageQueue {
        &self.verified
    }

    /// Per-stage sizes, taken one queue lock at a time. The snapshot is not
    /// atomic across stages; an order mid-handoff may be counted in neither
    /// queue. Good enough for status reporting, which is its only use.
    pub fn depths(&self) -> Result<QueueDepths> {
        Ok(QueueDepths {
            preparation: self.preparation.len()?,
            transit: self.transit.len()?,
            delivered: self.delivered.len()?,
            failed: self.failed.len()?,
            verified: self.verified.len()?,
        })
    }
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-stage queue sizes (poison pills excluded).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDepths {
    pub preparation: usize,
    pub transit: usize,
    pub delivered: usize,
    pub failed: usize,
    pub verified: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Order, WorkItem};

    #[test]
    fn depths_reflect_queue_contents_without_pills() {
        let registry = OrderRegistry::new();
        registry
            .preparation()
            .add(WorkItem::Order(Order::new(0, 1)))
            .unwrap();
        registry.transit().add(WorkItem::Poison).unwrap();
        registry
            .transit()
            .add(WorkItem::Order(Order::new(1, 2)))
            .unwrap();

        let depths = registry.depths().unwrap();
        assert_eq!(
            depths,
            QueueDepths {
                preparation: 1,
                transit: 1,
                ..QueueDepths::default()
            }
        );
    }
}
