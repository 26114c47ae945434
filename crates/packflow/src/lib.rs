//! Core of a concurrent warehouse order-fulfillment pipeline.
//!
//! Orders are prepared into a bounded pool of storage lockers, then flow
//! through four pipeline stages (preparation, dispatch, delivery, final
//! verification), each run by any number of worker threads. Stages hand off
//! work through blocking queues that remove a *uniformly random* element on
//! every take, and shut down by circulating poison pills.
//!
//! ## Structure
//!
//! - [`LockerPool`] - the bounded locker resource pool and its
//!   allocation/release/fault protocol.
//! - [`OrderRegistry`] / [`StageQueue`] - one blocking, randomized-removal
//!   queue per stage, each with its own lock and condition.
//! - [`Preparer`], [`Dispatcher`], [`Deliverer`], [`Verifier`] - the worker
//!   roles. Each value may be shared by several threads; cross-thread
//!   counters are atomic.
//! - [`FaultSource`] - the fault-injection seam. [`RandomFaults`] is the
//!   production implementation; [`NoFaults`] and [`AlwaysFaults`] pin the
//!   outcome for deterministic runs.
//!
//! The crate performs no I/O of its own: observers read the lock-light
//! snapshot accessors ([`LockerPool::snapshot`], [`OrderRegistry::depths`])
//! and every state change emits a [`tracing`] event.

mod error;
mod fault;
mod locker;
mod order;
mod pool;
mod queue;
mod registry;
mod stage;
mod workers;

pub use crate::error::*;
pub use crate::fault::*;
pub use crate::locker::*;
pub use crate::order::*;
pub use crate::pool::*;
pub use crate::queue::*;
pub use crate::registry::*;
pub use crate::stage::*;
pub use crate::workers::*;
