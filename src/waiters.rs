use crate::mutex::Condvar;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Orders blocked takers by demand, smallest first. Takers with equal
/// demand are ordered by registration.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct WaiterKey {
    pub demand: usize,
    seq: u64,
}

/// A blocked take request: its demand and the condition variable it
/// sleeps on. The condition variable is only ever paired with the
/// retrofit's one mutex.
#[derive(Debug)]
pub(crate) struct Waiter {
    key: WaiterKey,
    signal: Arc<Condvar>,
}

impl Waiter {
    pub fn signal(&self) -> &Condvar {
        &self.signal
    }
}

/// The priority queue of registered takers.
///
/// An ordered map rather than a binary heap: takers deregister
/// themselves by key, and a heap cannot remove arbitrary entries.
#[derive(Debug, Default)]
pub(crate) struct WaiterSet {
    waiters: BTreeMap<WaiterKey, Arc<Condvar>>,
    next_seq: u64,
}

impl WaiterSet {
    /// Creates a waiter with the given demand. It is not registered
    /// until [WaiterSet::push] is called.
    pub fn waiter(&mut self, demand: usize) -> Waiter {
        let seq = self.next_seq;
        self.next_seq += 1;
        Waiter {
            key: WaiterKey { demand, seq },
            signal: Arc::default(),
        }
    }

    /// Registers `waiter`. Reregistering keeps its original place
    /// among takers with the same demand.
    pub fn push(&mut self, waiter: &Waiter) {
        self.waiters.insert(waiter.key, waiter.signal.clone());
    }

    pub fn contains(&self, waiter: &Waiter) -> bool {
        self.waiters.contains_key(&waiter.key)
    }

    pub fn remove(&mut self, waiter: &Waiter) -> bool {
        self.waiters.remove(&waiter.key).is_some()
    }

    /// The smallest registered demand.
    pub fn peek(&self) -> Option<WaiterKey> {
        self.waiters.first_key_value().map(|(key, _)| *key)
    }

    pub fn pop(&mut self) -> Option<(WaiterKey, Arc<Condvar>)> {
        self.waiters.pop_first()
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Pops and signals every taker whose demand fits in `available`,
    /// smallest demand first, subtracting each demand as it goes.
    /// Returns the number signaled.
    ///
    /// The reservation is speculative. A signaled taker must recheck
    /// its condition under the lock and reregister if it lost a race.
    pub fn signal_fitting(&mut self, available: usize) -> usize {
        let mut remaining = available;
        let mut signaled = 0;
        while let Some(key) = self.peek() {
            if key.demand > remaining {
                break;
            }
            if let Some((key, signal)) = self.pop() {
                remaining -= key.demand;
                signal.notify_one();
                signaled += 1;
            }
        }
        signaled
    }

    /// Pops and signals every registered taker.
    pub fn signal_all(&mut self) -> usize {
        let mut signaled = 0;
        while let Some((_, signal)) = self.pop() {
            signal.notify_one();
            signaled += 1;
        }
        signaled
    }
}
