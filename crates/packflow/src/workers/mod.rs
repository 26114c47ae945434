//! Pipeline worker roles and their shared termination protocol.
//!
//! All four roles follow the same shape: claim work, mutate order and locker
//! state, push to the next queue (or the failed sink), pace, repeat. A role
//! value holds `Arc`s of the pool/registry and may be shared by any number
//! of threads; counters that span instances of a role are atomics, and the
//! deliverer/verifier finalization state is local to each `run` activation.
//!
//! Shutdown propagates downstream in-band: once the dispatch counter
//! reaches the run target, each dispatcher thread emits one poison pill
//! into the transit queue. Deliverers and verifiers re-insert every pill
//! they observe (so their siblings see it too) and, on their way out, emit
//! one fresh pill into their own output queue. Because queue removal is
//! uniformly random, a pill can be skipped while real orders remain;
//! termination is probabilistic and only certain once the real population
//! of a queue drains.

mod deliverer;
mod dispatcher;
mod preparer;
mod verifier;

pub use deliverer::*;
pub use dispatcher::*;
pub use preparer::*;
pub use verifier::*;

use rand::{Rng, rng};
use std::thread;
use std::time::Duration;

/// Worker pacing: randomized inter-iteration jitter plus the fixed settle
/// delay a role waits before emitting its poison pill.
///
/// Pacing decorrelates workers that would otherwise march in lock-step on
/// the same locks. It is a throughput-shaping knob, not a correctness
/// mechanism; [`Pacing::none`] turns all sleeping off for deterministic
/// tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    jitter_min_ms: u64,
    jitter_max_ms: u64,
    settle_ms: u64,
}

impl Pacing {
    /// Default preparer pacing.
    pub const PREPARER: Self = Self::new(90, 180, 0);
    /// Default dispatcher pacing, including the pre-pill settle delay.
    pub const DISPATCHER: Self = Self::new(60, 120, 100);
    /// Default deliverer pacing, including the pre-pill settle delay.
    pub const DELIVERER: Self = Self::new(90, 180, 100);
    /// Default verifier pacing.
    pub const VERIFIER: Self = Self::new(60, 120, 0);

    pub const fn new(jitter_min_ms: u64, jitter_max_ms: u64, settle_ms: u64) -> Self {
        Self {
            jitter_min_ms,
            jitter_max_ms,
            settle_ms,
        }
    }

    /// No sleeping at all.
    pub const fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Sleeps a uniformly random duration in `[jitter_min_ms, jitter_max_ms)`.
    pub(crate) fn pause(&self) {
        if self.jitter_max_ms > self.jitter_min_ms {
            let ms = rng().random_range(self.jitter_min_ms..self.jitter_max_ms);
            thread::sleep(Duration::from_millis(ms));
        }
    }

    /// Sleeps the fixed settle delay that precedes a poison-pill emission,
    /// letting in-flight takes drain first.
    pub(crate) fn settle(&self) {
        if self.settle_ms > 0 {
            thread::sleep(Duration::from_millis(self.settle_ms));
        }
    }
}
