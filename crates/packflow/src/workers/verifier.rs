use crate::{FaultSource, OrderRegistry, Pacing, Result, WorkItem};
use std::sync::Arc;
use tracing::{debug, info};

/// The final-verification role: moves orders from delivered to verified,
/// failing a small fraction into the failed sink.
///
/// Same termination shape as the deliverer - re-insert any observed pill,
/// finish the local activation - except there is no downstream queue, so a
/// finishing verifier emits nothing and terminates silently.
#[derive(Debug)]
pub struct Verifier<F> {
    registry: Arc<OrderRegistry>,
    faults: F,
    pacing: Pacing,
}

impl<F: FaultSource> Verifier<F> {
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
            match self.registry.delivered().take()? {
                WorkItem::Poison => {
                    // Put the pill back so sibling verifiers see it too.
                    self.registry.delivered().add(WorkItem::Poison)?;
                    break;
                }
                WorkItem::Order(mut order) => {
                    if self.faults.verification_fault() {
                        order.fail();
                        debug!(%order, "verification failed");
                        self.registry.failed().add(WorkItem::Order(order))?;
                    } else {
                        debug!(%order, "order verified");
                        self.registry.verified().add(WorkItem::Order(order))?;
                    }
                }
            }
            self.pacing.pause();
        }

        info!("verifier finished");
        Ok(())
    }
}
