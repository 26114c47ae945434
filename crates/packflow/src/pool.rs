use crate::{Error, Locker, LockerSnapshot, Order, Result};
use rand::{Rng, rng};
use std::sync::{
    Condvar, Mutex,
    atomic::{AtomicU64, Ordering},
};
use tracing::{debug, trace, warn};

/// Allocation-protocol state guarded by the pool lock.
///
/// `occupied` counts lockers the protocol considers taken. It is incremented
/// on every allocation and decremented only by `release` - a faulted locker
/// stays counted forever, so accumulated faults shrink the effective pool
/// without lowering capacity. With enough faults, `allocate` starves by
/// construction.
#[derive(Debug)]
struct PoolState {
    occupied: usize,
}

/// The bounded locker resource pool.
///
/// One pool-wide lock serializes `allocate`/`release`/`mark_faulted`; a
/// single "slot freed" condition is broadcast on every release. The counting
/// accessors scan locker state atomically without the allocation lock, so
/// observers never contend with workers (their view is eventually
/// consistent, which is all reporting needs).
#[derive(Debug)]
pub struct LockerPool {
    lockers: Box<[Locker]>,
    state: Mutex<PoolState>,
    slot_freed: Condvar,
    /// Sequence ids handed out so far; the next order gets `prev + 1`.
    /// Incremented only under the pool lock, read lock-free by observers.
    sequence: AtomicU64,
    target_orders: u64,
}

impl LockerPool {
    /// Creates a pool of `capacity` empty lockers for a run that will
    /// prepare `target_orders` orders in total.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, target_orders: u64) -> Self {
        assert!(capacity > 0, "must have at least 1 locker");
        let lockers = (0..capacity).map(|_| Locker::new()).collect();
        Self {
            lockers,
            state: Mutex::new(PoolState { occupied: 0 }),
            slot_freed: Condvar::new(),
            sequence: AtomicU64::new(0),
            target_orders,
        }
    }

    /// Occupies a random empty locker and returns the order bound to it.
    ///
    /// Blocks cooperatively (releasing the pool lock) while the pool is
    /// full, i.e. while the occupied count equals capacity. Out-of-service
    /// lockers are never un-counted, so they keep the pool "fuller" than its
    /// empty-locker population suggests; that shrinkage is part of the
    /// protocol.
    ///
    /// The empty locker is found by probing uniformly random indices until
    /// one hits, not by a free list. Under high occupancy this spins longer;
    /// in exchange no locker is favored by allocation order.
    ///
    /// # Errors
    /// [`Error::LockPoisoned`] if a peer panicked while holding the pool
    /// lock (also covers being woken from a poisoned condition wait).
    pub fn allocate(&self) -> Result<Order> {
        let mut state = self.state.lock()?;
        while state.occupied == self.lockers.len() {
            trace!("all lockers occupied; waiting for a release");
            state = self.slot_freed.wait(state)?;
        }

        let index = loop {
            let candidate = rng().random_range(0..self.lockers.len());
            if self.lockers[candidate].is_empty() {
                break candidate;
            }
        };
        self.lockers[index].occupy();
        state.occupied += 1;

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let order = Order::new(index, sequence);
        debug!(%order, locker = index, "locker occupied");
        Ok(order)
    }

    /// Releases the locker claimed by `order` and wakes every thread blocked
    /// in [`allocate`](Self::allocate).
    ///
    /// # Errors
    /// - [`Error::NoClaim`] if the order holds no locker claim.
    /// - [`Error::LockPoisoned`] on a poisoned pool lock.
    pub fn release(&self, order: &mut Order) -> Result<()> {
        let index = order.take_claim().ok_or(Error::NoClaim {
            sequence: order.sequence(),
        })?;
        let mut state = self.state.lock()?;
        self.lockers[index].release();
        state.occupied -= 1;
        self.slot_freed.notify_all();
        debug!(%order, locker = index, "locker released");
        Ok(())
    }

    /// Marks the locker claimed by `order` out of service.
    ///
    /// The occupied count is *not* decremented and no waiter is woken: a
    /// faulted locker never returns to the pool. The order keeps its claim.
    ///
    /// # Errors
    /// - [`Error::NoClaim`] if the order holds no locker claim.
    /// - [`Error::LockPoisoned`] on a poisoned pool lock.
    pub fn mark_faulted(&self, order: &Order) -> Result<()> {
        let index = order.locker().ok_or(Error::NoClaim {
            sequence: order.sequence(),
        })?;
        let state = self.state.lock()?;
        self.lockers[index].mark_out_of_service();
        drop(state);
        warn!(%order, locker = index, "locker marked out of service");
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.lockers.len()
    }

    /// Total orders this run is supposed to prepare.
    pub fn target_orders(&self) -> u64 {
        self.target_orders
    }

    /// Sequence ids handed out so far.
    pub fn orders_prepared(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Count of out-of-service lockers. Lock-free scan.
    pub fn faulted_lockers(&self) -> usize {
        self.lockers.iter().filter(|l| l.is_out_of_service()).count()
    }

    /// Count of lockers still in service. Lock-free scan.
    pub fn functional_lockers(&self) -> usize {
        self.lockers.len() - self.faulted_lockers()
    }

    /// Point-in-time view of every locker, in index order. Lock-free.
    pub fn snapshot(&self) -> Vec<LockerSnapshot> {
        self.lockers
            .iter()
            .map(|l| LockerSnapshot {
                state: l.state(),
                occupancy: l.occupancy(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LockerState;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn allocate_binds_a_fresh_locker_and_sequence() {
        let pool = LockerPool::new(4, 10);
        let order = pool.allocate().unwrap();
        assert_eq!(order.sequence(), 1);
        let locker = order.locker().unwrap();
        assert_eq!(pool.snapshot()[locker].state, LockerState::Occupied);
        assert_eq!(pool.orders_prepared(), 1);
    }

    #[test]
    fn release_returns_the_claim_and_empties_the_locker() {
        let pool = LockerPool::new(2, 10);
        let mut order = pool.allocate().unwrap();
        let locker = order.locker().unwrap();
        pool.release(&mut order).unwrap();
        assert_eq!(order.locker(), None);
        assert_eq!(pool.snapshot()[locker].state, LockerState::Empty);
        // A second release has no claim left to return.
        assert_eq!(
            pool.release(&mut order),
            Err(Error::NoClaim { sequence: 1 })
        );
    }

    #[test]
    fn allocate_blocks_while_full_and_wakes_on_release() {
        let pool = Arc::new(LockerPool::new(2, 10));
        let mut held: Vec<_> = (0..2).map(|_| pool.allocate().unwrap()).collect();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.allocate().unwrap())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished(), "allocate must block while full");

        pool.release(&mut held[0]).unwrap();
        let order = waiter.join().unwrap();
        assert!(order.locker().is_some());
    }

    #[test]
    fn sequences_are_unique_and_thread_monotonic() {
        const THREADS: usize = 8;
        const PER_THREAD: u64 = 200;

        let pool = Arc::new(LockerPool::new(16, THREADS as u64 * PER_THREAD));
        let mut all = HashSet::with_capacity(THREADS * PER_THREAD as usize);

        thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    s.spawn(move || {
                        let mut seen = Vec::with_capacity(PER_THREAD as usize);
                        for _ in 0..PER_THREAD {
                            let mut order = pool.allocate().unwrap();
                            seen.push(order.sequence());
                            pool.release(&mut order).unwrap();
                        }
                        seen
                    })
                })
                .collect();

            for handle in handles {
                let seen = handle.join().unwrap();
                assert!(
                    seen.windows(2).all(|w| w[0] < w[1]),
                    "issuance order must be strictly increasing"
                );
                all.extend(seen);
            }
        });

        let total = THREADS as u64 * PER_THREAD;
        assert_eq!(all.len() as u64, total, "no duplicate sequence ids");
        assert_eq!(all.iter().copied().min(), Some(1));
        assert_eq!(all.iter().copied().max(), Some(total));
        assert_eq!(pool.orders_prepared(), total);
    }

    #[test]
    fn occupancy_counts_match_allocations_and_lockers_end_empty() {
        const THREADS: usize = 4;
        const PER_THREAD: u64 = 100;

        let pool = Arc::new(LockerPool::new(8, THREADS as u64 * PER_THREAD));
        thread::scope(|s| {
            for _ in 0..THREADS {
                let pool = Arc::clone(&pool);
                s.spawn(move || {
                    for _ in 0..PER_THREAD {
                        let mut order = pool.allocate().unwrap();
                        pool.release(&mut order).unwrap();
                    }
                });
            }
        });

        let snapshot = pool.snapshot();
        assert!(snapshot.iter().all(|l| l.state == LockerState::Empty));
        let total: u64 = snapshot.iter().map(|l| l.occupancy).sum();
        assert_eq!(total, THREADS as u64 * PER_THREAD);
    }

    #[test]
    fn faulted_lockers_are_never_reallocated() {
        let pool = LockerPool::new(2, 100);
        let faulty = pool.allocate().unwrap();
        let faulty_index = faulty.locker().unwrap();
        pool.mark_faulted(&faulty).unwrap();
        assert_eq!(pool.faulted_lockers(), 1);
        assert_eq!(pool.functional_lockers(), 1);
        // The faulted order keeps its claim.
        assert_eq!(faulty.locker(), Some(faulty_index));

        for _ in 0..50 {
            let mut order = pool.allocate().unwrap();
            assert_ne!(order.locker(), Some(faulty_index));
            pool.release(&mut order).unwrap();
        }
        assert_eq!(pool.snapshot()[faulty_index].occupancy, 1);
    }

    #[test]
    fn faults_permanently_shrink_the_pool() {
        let pool = Arc::new(LockerPool::new(2, 100));
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        pool.mark_faulted(&a).unwrap();
        pool.mark_faulted(&b).unwrap();

        // Both lockers are out of service but still counted as occupied, so
        // the pool believes itself full forever.
        let starved = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.allocate())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(
            !starved.is_finished(),
            "allocate must starve once every locker is faulted"
        );
        drop(starved); // detach; the waiter never returns
    }
}
