use core::fmt;

/// Terminal-per-stage outcome status of an order.
///
/// `Failed` is sticky: once set it never reverts, and the order's next stop
/// is the failed queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    Normal,
    Failed,
}

/// A unit of work flowing through the pipeline.
///
/// Created only by [`LockerPool::allocate`], which binds it to a locker and
/// assigns its sequence id. The claim is handed back by
/// [`LockerPool::release`]; an order whose locker was marked out of service
/// keeps the claim forever, since that locker never returns to the pool.
///
/// [`LockerPool::allocate`]: crate::LockerPool::allocate
/// [`LockerPool::release`]: crate::LockerPool::release
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    locker: Option<usize>,
    sequence: u64,
    status: OrderStatus,
}

impl Order {
    pub(crate) fn new(locker: usize, sequence: u64) -> Self {
        Self {
            locker: Some(locker),
            sequence,
            status: OrderStatus::Normal,
        }
    }

    /// Index of the locker this order currently claims, if any.
    pub fn locker(&self) -> Option<usize> {
        self.locker
    }

    /// Unique, strictly increasing sequence id, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_failed(&self) -> bool {
        self.status == OrderStatus::Failed
    }

    /// Marks the order failed. Sticky.
    pub fn fail(&mut self) {
        self.status = OrderStatus::Failed;
    }

    pub(crate) fn take_claim(&mut self) -> Option<usize> {
        self.locker.take()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order #{}", self.sequence)
    }
}

/// Element type of a [`StageQueue`].
///
/// Shutdown is signaled in-band: a `Poison` pill circulates through a stage's
/// queue so that every sibling consumer observes it once. Consumers must
/// re-insert an observed pill, never drop it.
///
/// [`StageQueue`]: crate::StageQueue
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkItem {
    Order(Order),
    Poison,
}

impl WorkItem {
    pub fn is_poison(&self) -> bool {
        matches!(self, Self::Poison)
    }
}
