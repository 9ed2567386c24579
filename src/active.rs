//! Per-node active sets: the ordered views selecting which pool items
//! are currently part of a node's LP.
//!
//! The set owns pool slot references and keeps the slots' activation
//! counters in step, so pool separation can skip items that are already
//! active and pool eviction never touches them. Each position carries a
//! redundant-age counter used for elimination by age.

use std::rc::Rc;

use crate::I;
use crate::pool::{PoolItem, PoolSlotRef};

#[derive(Debug)]
pub struct ActiveSet<T: PoolItem + ?Sized> {
    refs: Vec<PoolSlotRef<T>>,
    redundant_age: Vec<I>,
}

impl<T: PoolItem + ?Sized> ActiveSet<T> {
    pub fn new() -> Self {
        Self {
            refs: Vec::new(),
            redundant_age: Vec::new(),
        }
    }

    pub fn number(&self) -> I {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Appends an item and marks its slot active.
    pub fn insert(&mut self, slot_ref: PoolSlotRef<T>) {
        slot_ref.slot().borrow_mut().activate();
        self.refs.push(slot_ref);
        self.redundant_age.push(0);
    }

    /// Removes the positions in `indices` (ascending), releasing the
    /// slot references.
    pub fn remove(&mut self, indices: &[I]) {
        if indices.is_empty() {
            return;
        }
        let mut keep = vec![true; self.refs.len()];
        for &i in indices {
            assert!(i < self.refs.len(), "ActiveSet::remove: index out of range");
            keep[i] = false;
        }
        let mut k = 0;
        self.refs.retain(|r| {
            let keep_it = keep[k];
            k += 1;
            if !keep_it {
                r.slot().borrow_mut().deactivate();
            }
            keep_it
        });
        let mut k = 0;
        self.redundant_age.retain(|_| {
            let keep_it = keep[k];
            k += 1;
            keep_it
        });
    }

    /// The item at position `i`. Active slots are never evicted, so a
    /// missing item means the set invariant was violated elsewhere.
    pub fn item(&self, i: I) -> Rc<T> {
        self.refs[i]
            .item()
            .expect("active slot was reclaimed while active")
    }

    pub fn slot_ref(&self, i: I) -> &PoolSlotRef<T> {
        &self.refs[i]
    }

    /// A snapshot of all active items, in order.
    pub fn items(&self) -> Vec<Rc<T>> {
        (0..self.refs.len()).map(|i| self.item(i)).collect()
    }

    pub fn redundant_age(&self, i: I) -> I {
        self.redundant_age[i]
    }

    pub fn increment_age(&mut self, i: I) {
        self.redundant_age[i] += 1;
    }

    pub fn reset_age(&mut self, i: I) {
        self.redundant_age[i] = 0;
    }
}

impl<T: PoolItem + ?Sized> Default for ActiveSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PoolItem + ?Sized> Clone for ActiveSet<T> {
    /// A clone shares the slots and counts as a further activation of
    /// each of them (children derive their active sets from the parent).
    fn clone(&self) -> Self {
        for r in &self.refs {
            r.slot().borrow_mut().activate();
        }
        Self {
            refs: self.refs.clone(),
            redundant_age: self.redundant_age.clone(),
        }
    }
}

impl<T: PoolItem + ?Sized> Drop for ActiveSet<T> {
    fn drop(&mut self) {
        for r in &self.refs {
            r.slot().borrow_mut().deactivate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convar::{Constraint, LinearConstraint};
    use crate::pool::StandardPool;
    use crate::sparse::ConSense;
    use crate::E;

    fn pool_of(n: I) -> (StandardPool<dyn Constraint>, Vec<PoolSlotRef<dyn Constraint>>) {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(n, false);
        let refs = (0..n)
            .map(|i| {
                pool.insert(Rc::new(LinearConstraint::from_pairs(
                    &[i],
                    &[1.0],
                    ConSense::Less,
                    i as E,
                )))
                .unwrap()
            })
            .collect();
        (pool, refs)
    }

    #[test]
    fn insert_and_remove_track_activation() {
        let (pool, refs) = pool_of(3);
        let mut active: ActiveSet<dyn Constraint> = ActiveSet::new();
        for r in refs {
            active.insert(r);
        }
        assert_eq!(pool.slot(0).borrow().n_active(), 1);
        active.remove(&[0, 2]);
        assert_eq!(active.number(), 1);
        assert_eq!(active.item(0).rhs(), 1.0);
        assert_eq!(pool.slot(0).borrow().n_active(), 0);
        assert_eq!(pool.slot(1).borrow().n_active(), 1);
    }

    #[test]
    fn clone_counts_as_second_activation() {
        let (pool, refs) = pool_of(1);
        let mut active: ActiveSet<dyn Constraint> = ActiveSet::new();
        for r in refs {
            active.insert(r);
        }
        let child = active.clone();
        assert_eq!(pool.slot(0).borrow().n_active(), 2);
        drop(child);
        assert_eq!(pool.slot(0).borrow().n_active(), 1);
        drop(active);
        assert_eq!(pool.slot(0).borrow().n_active(), 0);
    }

    #[test]
    fn ages_follow_positions() {
        let (_pool, refs) = pool_of(3);
        let mut active: ActiveSet<dyn Constraint> = ActiveSet::new();
        for r in refs {
            active.insert(r);
        }
        active.increment_age(1);
        active.increment_age(1);
        active.increment_age(2);
        active.remove(&[0]);
        assert_eq!(active.redundant_age(0), 2);
        assert_eq!(active.redundant_age(1), 1);
        active.reset_age(0);
        assert_eq!(active.redundant_age(0), 0);
    }
}
