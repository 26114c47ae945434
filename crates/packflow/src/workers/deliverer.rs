use crate::{FaultSource, OrderRegistry, Pacing, Result, WorkItem};
use std::sync::Arc;
use tracing::{debug, info};

/// The delivery role: moves orders from transit to delivered, failing a
/// fraction of them into the failed sink.
///
/// Runs until it draws a poison pill from the transit queue. The pill is
/// re-inserted - never consumed - so every sibling deliverer eventually
/// observes it too; finalization state is local to each `run` activation.
/// On the way out, each thread emits one fresh pill into the delivered
/// queue for the verifiers.
#[derive(Debug)]
pub struct Deliverer<F> {
    registry: Arc<OrderRegistry>,
    faults: F,
    pacing: Pacing,
}

impl<F: FaultSource> Deliverer<F> {
    pub fn new(registry: Arc<OrderRegistry>, faults: F, pacing: Pacing) -> Self {
        Self {
            registry,
            faults,
            pacing,
        }
    }

    /// Thread body.
    ///
    /// # Errors
    /// Propagates queue lock poisoning.
    pub fn run(&self) -> Result<()> {
        loop {
            match self.registry.transit().take()? {
                WorkItem::Poison => {
                    // Put the pill back so sibling deliverers see it too.
                    self.registry.transit().add(WorkItem::Poison)?;
                    break;
                }
                WorkItem::Order(mut order) => {
                    if self.faults.delivery_fault() {
                        order.fail();
                        debug!(%order, "delivery failed");
                        self.registry.failed().add(WorkItem::Order(order))?;
                    } else {
                        debug!(%order, "order delivered");
                        self.registry.delivered().add(WorkItem::Order(order))?;
                    }
                }
            }
            self.pacing.pause();
        }

        self.pacing.settle();
        self.registry.delivered().add(WorkItem::Poison)?;
        info!("deliverer finished");
        Ok(())
    }
}
