#![doc = include_str!("../README.md")]

#[macro_use]
mod trace;

mod collection;
mod error;
mod mutex;
mod policy;
mod waiters;

use std::error::Error;
use std::time::Duration;
use std::time::Instant;

use mutex::Mutex;
use mutex::MutexGuard;
use waiters::WaiterSet;

pub use collection::Collection;
pub use collection::Queue;
pub use error::Cancelled;
pub use policy::InvalidPolicy;
pub use policy::Policy;

#[derive(Debug)]
struct State<C, E> {
    container: C,
    waiters: WaiterSet,
    // Poison. While set, every take fails with a clone of it.
    cancelled: Option<E>,
}

impl<C: Collection, E: Clone> State<C, E> {
    fn check_cancelled(&self) -> Result<(), E> {
        match &self.cancelled {
            Some(kind) => Err(kind.clone()),
            None => Ok(()),
        }
    }

    /// If a take of `count` items under `policy` can be satisfied
    /// right now, returns the count hint to extract with.
    fn satisfiable(&self, count: Option<usize>, policy: Policy) -> Option<Option<usize>> {
        let len = self.container.len();
        if len >= count.unwrap_or(1) {
            Some(count)
        } else if policy == Policy::Partial && len > 0 {
            Some(Some(len))
        } else {
            None
        }
    }
}

impl<C: Collection, E> State<C, E> {
    fn signal_takers(&mut self) {
        let available = self.container.len();
        if self.waiters.signal_fitting(available) > 0 {
            trace!(available, waiting = self.waiters.len(), "signaled takers");
        }
    }
}

/// Wraps an ordered container, making it a blocking, cancellable
/// multi-producer, multi-consumer queue.
///
/// Producers mutate the container through [Retrofit::add]. Consumers
/// remove from it through [Retrofit::take], which blocks until the
/// requested number of items is present, the timeout expires, or the
/// retrofit is [cancelled](Retrofit::cancel).
///
/// Blocked takers are woken in ascending order of demand, not in
/// arrival order: a small take that arrives late can be satisfied
/// before a large one that has waited longer. Takers with equal
/// demand are woken in arrival order.
///
/// All state is protected by one non-reentrant mutex. Closures passed
/// to `add` and `take` run with it held and must not block or call
/// back into the same retrofit.
#[derive(Debug)]
pub struct Retrofit<C, E = Cancelled> {
    state: Mutex<State<C, E>>,
}

impl<C: Default, E> Default for Retrofit<C, E> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C, E> From<C> for Retrofit<C, E> {
    fn from(container: C) -> Self {
        Self::new(container)
    }
}

impl<C, E> Retrofit<C, E> {
    /// Takes ownership of `container`. Items already in it are
    /// available to takers.
    pub fn new(container: C) -> Self {
        Retrofit {
            state: Mutex::new(State {
                container,
                waiters: WaiterSet::default(),
                cancelled: None,
            }),
        }
    }

    /// Returns the wrapped container.
    pub fn into_inner(self) -> C {
        self.state.into_inner().container
    }

    /// Calls `f` with shared access to the container while the lock
    /// is held. Does not wake takers.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.lock().container)
    }

    /// Whether [Retrofit::cancel] has been called since construction or
    /// the last [Retrofit::uncancel].
    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled.is_some()
    }

    /// Clears cancellation. Subsequent takes block normally.
    ///
    /// Nobody is woken: no taker waits on cancellation being cleared.
    pub fn uncancel(&self) {
        let mut state = self.lock();
        if state.cancelled.take().is_some() {
            debug!("uncancelled");
        }
    }

    /// The number of takers currently registered as blocked.
    pub fn waiter_count(&self) -> usize {
        self.lock().waiters.len()
    }

    fn lock(&self) -> MutexGuard<'_, State<C, E>> {
        self.state.lock()
    }
}

impl<C: Collection, E> Retrofit<C, E> {
    /// Runs `mutator` on the container while the lock is held, then
    /// wakes the takers the new size could satisfy.
    ///
    /// Returns whatever `mutator` returns. If `mutator` panics, the
    /// lock is released and nobody is woken; items it added before
    /// panicking stay in the container.
    pub fn add<R>(&self, mutator: impl FnOnce(&mut C) -> R) -> R {
        let mut state = self.lock();
        let result = mutator(&mut state.container);
        state.signal_takers();
        result
    }

    /// The number of items in the container right now.
    pub fn len(&self) -> usize {
        self.lock().container.len()
    }

    /// Whether the container is empty right now.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Collection, E: Error + Clone> Retrofit<C, E> {
    /// Removes items with `extractor` once enough are available.
    ///
    /// `count` of `None` requests a single item and passes `None` to
    /// `extractor`, which should then remove one item. Otherwise
    /// `extractor` receives the number of items to remove: `count`
    /// when fully satisfied, or the current size when `policy` allows
    /// a partial take.
    ///
    /// With no `timeout`, blocks until satisfied or cancelled. When
    /// `timeout` elapses first, returns `Ok(None)`, unless `policy` is
    /// [Policy::PartialOnTimeout] and some items are available, in
    /// which case those are extracted.
    ///
    /// Returns the cancellation error if the retrofit is cancelled on
    /// entry or while blocked. `extractor` runs at most once, with the
    /// lock held.
    pub fn take<R>(
        &self,
        count: Option<usize>,
        timeout: Option<Duration>,
        policy: Policy,
        extractor: impl FnOnce(&mut C, Option<usize>) -> R,
    ) -> Result<Option<R>, E> {
        // A timeout too large to represent is the same as none.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        let mut state = self.lock();
        state.check_cancelled()?;
        if let Some(hint) = state.satisfiable(count, policy) {
            return Ok(Some(extractor(&mut state.container, hint)));
        }

        let demand = policy.demand(count.unwrap_or(1));
        let waiter = state.waiters.waiter(demand);
        state.waiters.push(&waiter);
        trace!(demand, %policy, "taker blocked");

        loop {
            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    waiter.signal().wait_timeout(state, remaining)
                }
                None => waiter.signal().wait(state),
            };

            if let Err(kind) = state.check_cancelled() {
                state.waiters.remove(&waiter);
                return Err(kind);
            }

            if let Some(hint) = state.satisfiable(count, policy) {
                state.waiters.remove(&waiter);
                return Ok(Some(extractor(&mut state.container, hint)));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                state.waiters.remove(&waiter);
                let len = state.container.len();
                trace!(available = len, %policy, "taker timed out");
                return Ok(match policy {
                    Policy::PartialOnTimeout if len > 0 => {
                        Some(extractor(&mut state.container, Some(len)))
                    }
                    _ => None,
                });
            }

            // Woken by a wake scan that speculatively reserved items
            // for us, but another taker got to them first.
            if !state.waiters.contains(&waiter) {
                state.waiters.push(&waiter);
            }
        }
    }

    /// Fails every blocked and future take with `kind` until
    /// [Retrofit::uncancel] is called.
    ///
    /// Every registered taker is woken exactly once. Calling again
    /// while cancelled replaces `kind`.
    pub fn cancel(&self, kind: E) {
        let mut state = self.lock();
        debug!(waiters = state.waiters.len(), error = %kind, "cancelling");
        state.waiters.signal_all();
        state.cancelled = Some(kind);
    }
}

impl<C: Queue, E: Error + Clone> Retrofit<C, E> {
    /// Appends one item and wakes takers.
    pub fn push(&self, item: C::Item) {
        self.add(|c| c.push_back(item))
    }

    /// Appends every item under one acquisition of the lock and wakes
    /// takers once.
    pub fn push_iter<I>(&self, items: I)
    where
        I: IntoIterator<Item = C::Item>,
    {
        // This iterator might be expensive. Evaluate it before the lock
        // is held.
        let items: Vec<_> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        self.add(|c| {
            for item in items {
                c.push_back(item);
            }
        })
    }

    /// Takes up to `count` items from the front. See [Retrofit::take]
    /// for how `timeout` and `policy` decide how many.
    pub fn shift(
        &self,
        count: usize,
        timeout: Option<Duration>,
        policy: Policy,
    ) -> Result<Option<Vec<C::Item>>, E> {
        self.take(Some(count), timeout, policy, |c, n| {
            c.drain_front(n.unwrap_or(count))
        })
    }

    /// Takes a single item from the front, waiting up to `timeout`.
    ///
    /// Returns `Ok(None)` on timeout.
    pub fn shift_one(&self, timeout: Option<Duration>) -> Result<Option<C::Item>, E> {
        self.take(None, timeout, Policy::PartialOnTimeout, |c, _| c.pop_front())
            .map(Option::flatten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn take_fast_path_does_not_register() {
        let r: Retrofit<VecDeque<u32>> = Retrofit::new(VecDeque::from([1, 2, 3]));
        assert_eq!(
            Ok(Some(vec![1, 2])),
            r.shift(2, None, Policy::AllOrNothing)
        );
        assert_eq!(0, r.waiter_count());
        assert_eq!(1, r.len());
    }

    #[test]
    fn count_hint_is_none_for_single_item_takes() {
        let r: Retrofit<Vec<u32>> = Retrofit::new(vec![7]);
        let hint = r.take(None, None, Policy::Partial, |c, hint| {
            c.clear();
            hint
        });
        assert_eq!(Ok(Some(None)), hint);
    }

    #[test]
    fn partial_take_is_hinted_with_current_size() {
        let r: Retrofit<Vec<u32>> = Retrofit::new(vec![7, 8]);
        let hint = r.take(Some(5), None, Policy::Partial, |_, hint| hint);
        assert_eq!(Ok(Some(Some(2))), hint);
    }

    #[test]
    fn zero_timeout_expires_immediately() {
        let r: Retrofit<Vec<u32>> = Retrofit::new(vec![7]);
        assert_eq!(
            Ok(None),
            r.shift(2, Some(Duration::ZERO), Policy::AllOrNothing)
        );
        assert_eq!(
            Ok(Some(vec![7])),
            r.shift(2, Some(Duration::ZERO), Policy::PartialOnTimeout)
        );
        assert_eq!(0, r.waiter_count());
    }

    #[test]
    fn cancelled_take_fails_without_extracting() {
        let r: Retrofit<Vec<u32>> = Retrofit::new(vec![7]);
        r.cancel(Cancelled);
        assert!(r.is_cancelled());
        assert_eq!(Err(Cancelled), r.shift_one(None));
        assert_eq!(1, r.len());

        r.uncancel();
        assert!(!r.is_cancelled());
        assert_eq!(Ok(Some(7)), r.shift_one(None));
    }

    #[test]
    fn add_returns_mutator_result() {
        let r: Retrofit<Vec<u32>> = Retrofit::default();
        assert_eq!(2, r.add(|c| {
            c.extend([1, 2]);
            c.len()
        }));
        assert_eq!(vec![1, 2], r.with(|c| c.clone()));
        assert_eq!(vec![1, 2], r.into_inner());
    }

    #[test]
    fn push_iter_with_nothing_is_noop() {
        let r: Retrofit<VecDeque<u32>> = Retrofit::default();
        r.push_iter([]);
        assert!(r.is_empty());
    }
}
