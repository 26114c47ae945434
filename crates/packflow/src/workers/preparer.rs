use crate::{LockerPool, OrderRegistry, Pacing, Result, WorkItem};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// The producer role: occupies lockers and feeds the preparation queue.
///
/// One `Preparer` value is shared by every preparer thread of a run; the
/// claim counter spans all of them, so together they prepare exactly the
/// pool's target order count. A thread claims its slot *before* allocating,
/// and allocation may then block until a locker frees up.
///
/// Preparers emit no poison pill - downstream shutdown is the dispatchers'
/// job, driven by their own counter.
#[derive(Debug)]
pub struct Preparer {
    pool: Arc<LockerPool>,
    registry: Arc<OrderRegistry>,
    claimed: AtomicU64,
    pacing: Pacing,
}

impl Preparer {
    pub fn new(pool: Arc<LockerPool>, registry: Arc<OrderRegistry>, pacing: Pacing) -> Self {
        Self {
            pool,
            registry,
            claimed: AtomicU64::new(0),
            pacing,
        }
    }

    /// Thread body. Runs until the shared claim counter reaches the target.
    ///
    /// # Errors
    /// Propagates pool and queue lock poisoning; the claimed slot is then
    /// lost and the run is defective, so the caller should abort it.
    pub fn run(&self) -> Result<()> {
        while self.claim() {
            let order = self.pool.allocate()?;
            self.registry.preparation().add(WorkItem::Order(order))?;
            self.pacing.pause();
        }
        debug!("preparer done; all orders claimed");
        Ok(())
    }

    /// Claims the next preparation slot. Every `true` return obligates the
    /// caller to prepare exactly one order.
    fn claim(&self) -> bool {
        self.claimed.fetch_add(1, Ordering::Relaxed) < self.pool.target_orders()
    }
}
