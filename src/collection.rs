use std::cmp::min;
use std::collections::LinkedList;
use std::collections::VecDeque;

/// The one capability [Retrofit](crate::Retrofit) needs from a wrapped
/// container: its current size.
pub trait Collection {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered container that appends at the back and removes from
/// the front. Enables the queue convenience methods on
/// [Retrofit](crate::Retrofit).
pub trait Queue: Collection {
    type Item;

    fn push_back(&mut self, item: Self::Item);

    fn pop_front(&mut self) -> Option<Self::Item>;

    /// Removes up to `n` items from the front, in order.
    fn drain_front(&mut self, n: usize) -> Vec<Self::Item> {
        let n = min(n, self.len());
        let mut v = Vec::with_capacity(n);
        while v.len() < n {
            match self.pop_front() {
                Some(item) => v.push(item),
                None => break,
            }
        }
        v
    }
}

impl<T> Collection for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T> Queue for Vec<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        self.push(item);
    }

    fn pop_front(&mut self) -> Option<T> {
        if Vec::is_empty(self) {
            None
        } else {
            Some(self.remove(0))
        }
    }

    fn drain_front(&mut self, n: usize) -> Vec<T> {
        let n = min(n, Vec::len(self));
        self.drain(..n).collect()
    }
}

impl<T> Collection for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

impl<T> Queue for VecDeque<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        VecDeque::push_back(self, item);
    }

    fn pop_front(&mut self) -> Option<T> {
        VecDeque::pop_front(self)
    }

    fn drain_front(&mut self, n: usize) -> Vec<T> {
        let n = min(n, VecDeque::len(self));
        self.drain(..n).collect()
    }
}

impl<T> Collection for LinkedList<T> {
    fn len(&self) -> usize {
        LinkedList::len(self)
    }
}

impl<T> Queue for LinkedList<T> {
    type Item = T;

    fn push_back(&mut self, item: T) {
        LinkedList::push_back(self, item);
    }

    fn pop_front(&mut self) -> Option<T> {
        LinkedList::pop_front(self)
    }
}
