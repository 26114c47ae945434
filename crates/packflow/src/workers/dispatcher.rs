use crate::{Error, FaultSource, LockerPool, OrderRegistry, Pacing, Result, Stage, WorkItem};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// The dispatch role: takes prepared orders and either frees their locker
/// into the transit queue or faults it into the failed sink.
///
/// One `Dispatcher` value is shared by every dispatcher thread; the dispatch
/// counter spans all of them. A thread claims a slot first and only then
/// blocks on the preparation queue, trusting the preparers to eventually
/// produce the claimed order.
///
/// When the counter reaches the run target, each thread waits the settle
/// delay and emits exactly one poison pill into the transit queue before
/// terminating - so a run with M dispatcher threads circulates up to M
/// pills, which the downstream protocol tolerates.
#[derive(Debug)]
pub struct Dispatcher<F> {
    pool: Arc<LockerPool>,
    registry: Arc<OrderRegistry>,
    dispatched: AtomicU64,
    faults: F,
    pacing: Pacing,
}

impl<F: FaultSource> Dispatcher<F> {
    pub fn new(
        pool: Arc<LockerPool>,
        registry: Arc<OrderRegistry>,
        faults: F,
        pacing: Pacing,
    ) -> Self {
        Self {
            pool,
            registry,
            dispatched: AtomicU64::new(0),
            faults,
            pacing,
        }
    }

    /// Thread body.
    ///
    /// # Errors
    /// - [`Error::UnexpectedPoison`] if a pill surfaces in the preparation
    ///   queue, which no protocol path ever feeds one into.
    /// - [`Error::LockPoisoned`] propagated from the pool or a queue.
    pub fn run(&self) -> Result<()> {
        while self.claim() {
            let WorkItem::Order(mut order) = self.registry.preparation().take()? else {
                return Err(Error::UnexpectedPoison {
                    stage: Stage::Preparation,
                });
            };

            if self.faults.dispatch_fault() {
                self.pool.mark_faulted(&order)?;
                order.fail();
                self.registry.failed().add(WorkItem::Order(order))?;
            } else {
                self.pool.release(&mut order)?;
                self.registry.transit().add(WorkItem::Order(order))?;
            }
            self.pacing.pause();
        }

        // Let in-flight takes settle, then hand shutdown downstream.
        self.pacing.settle();
        debug!("dispatch target reached; emitting poison pill");
        self.registry.transit().add(WorkItem::Poison)?;
        Ok(())
    }

    /// Claims the next dispatch slot, without overshooting once the target
    /// has been reached.
    fn claim(&self) -> bool {
        if self.dispatched.load(Ordering::Relaxed) >= self.pool.target_orders() {
            return false;
        }
        self.dispatched.fetch_add(1, Ordering::Relaxed) < self.pool.target_orders()
    }
}
