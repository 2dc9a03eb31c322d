//! Tracked entity collection with guarded traversal.
//!
//! Structural changes (insert/remove) block while a traversal is alive. A
//! traversal ends with an explicit [`GuardedIter::finished_iterating`]; the
//! guard is also released on drop, so an unwinding consumer can't leave the
//! collection locked.

use std::hash::Hash;

use hashbrown::HashSet;
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxBuildHasher;

/// Iterator that holds exclusive access to its source until finished.
pub trait GuardedIter: Iterator {
    /// Signal that the traversal is done and release the source.
    fn finished_iterating(self);
}

/// A collection that can only be traversed under a guard.
pub trait EntitySource<E> {
    type Iter<'a>: GuardedIter<Item = E>
    where
        Self: 'a;

    /// Begin a guarded traversal. Mutations from other threads wait until it
    /// finishes; mutating from the traversing thread deadlocks.
    fn iter_guarded(&self) -> Self::Iter<'_>;
}

struct Inner<E> {
    /// Insertion order.
    order: Vec<E>,
    members: HashSet<E, FxBuildHasher>,
}

/// Insertion-ordered, duplicate-free set of entity handles.
pub struct TrackedEntities<E> {
    inner: Mutex<Inner<E>>,
}

impl<E> Default for TrackedEntities<E> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                order: Vec::new(),
                members: HashSet::default(),
            }),
        }
    }
}

impl<E: Clone + Eq + Hash> TrackedEntities<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `entity`. Returns false if it was already tracked.
    pub fn insert(&self, entity: E) -> bool {
        let mut inner = self.inner.lock();
        if !inner.members.insert(entity.clone()) {
            return false;
        }
        inner.order.push(entity);
        true
    }

    /// Stop tracking `entity`. Returns false if it wasn't tracked.
    pub fn remove(&self, entity: &E) -> bool {
        let mut inner = self.inner.lock();
        if !inner.members.remove(entity) {
            return false;
        }
        inner.order.retain(|e| e != entity);
        true
    }

    #[must_use]
    pub fn contains(&self, entity: &E) -> bool {
        self.inner.lock().members.contains(entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    /// Guarded traversal in insertion order.
    pub fn iter(&self) -> TrackedIter<'_, E> {
        TrackedIter {
            guard: self.inner.lock(),
            next: 0,
        }
    }
}

impl<E: Clone + Eq + Hash> EntitySource<E> for TrackedEntities<E> {
    type Iter<'a>
        = TrackedIter<'a, E>
    where
        Self: 'a;

    fn iter_guarded(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

/// Traversal guard over [`TrackedEntities`].
pub struct TrackedIter<'a, E> {
    guard: MutexGuard<'a, Inner<E>>,
    next: usize,
}

impl<E: Clone> Iterator for TrackedIter<'_, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let entity = self.guard.order.get(self.next)?.clone();
        self.next += 1;
        Some(entity)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.guard.order.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<E: Clone> GuardedIter for TrackedIter<'_, E> {
    fn finished_iterating(self) {
        drop(self);
    }
}
