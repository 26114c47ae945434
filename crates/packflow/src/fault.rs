use rand::{Rng, rng};

/// Decides whether a worker's probabilistic failure fires.
///
/// Faults are expected outcomes, not errors: a firing fault routes the order
/// to the failed queue (and, at dispatch, retires its locker for good). The
/// trait exists so that tests can pin the outcome - see [`NoFaults`] and
/// [`AlwaysFaults`] - while production runs draw from [`RandomFaults`].
pub trait FaultSource: Send + Sync {
    /// Does dispatching this order fault its locker?
    fn dispatch_fault(&self) -> bool;

    /// Does delivering this order fail?
    fn delivery_fault(&self) -> bool;

    /// Does final verification of this order fail?
    fn verification_fault(&self) -> bool;
}

/// Per-stage failure rates in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultRates {
    pub dispatch_pct: u32,
    pub delivery_pct: u32,
    pub verification_pct: u32,
}

impl Default for FaultRates {
    /// The canonical simulation rates: 15% of dispatches fault their locker,
    /// 10% of deliveries fail, 5% of verifications fail.
    fn default() -> Self {
        Self {
            dispatch_pct: 15,
            delivery_pct: 10,
            verification_pct: 5,
        }
    }
}

/// Draws each outcome from the thread-local RNG.
///
/// Stores no RNG state of its own: every call samples the calling thread's
/// generator, so concurrent workers never contend.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomFaults {
    rates: FaultRates,
}

impl RandomFaults {
    pub fn new(rates: FaultRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> FaultRates {
        self.rates
    }
}

impl FaultSource for RandomFaults {
    fn dispatch_fault(&self) -> bool {
        rng().random_ratio(self.rates.dispatch_pct, 100)
    }

    fn delivery_fault(&self) -> bool {
        rng().random_ratio(self.rates.delivery_pct, 100)
    }

    fn verification_fault(&self) -> bool {
        rng().random_ratio(self.rates.verification_pct, 100)
    }
}

/// Never fails. Every order reaches the verified queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFaults;

impl FaultSource for NoFaults {
    fn dispatch_fault(&self) -> bool {
        false
    }

    fn delivery_fault(&self) -> bool {
        false
    }

    fn verification_fault(&self) -> bool {
        false
    }
}

/// Always fails. Every order faults its locker at dispatch.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysFaults;

impl FaultSource for AlwaysFaults {
    fn dispatch_fault(&self) -> bool {
        true
    }

    fn delivery_fault(&self) -> bool {
        true
    }

    fn verification_fault(&self) -> bool {
        true
    }
}
