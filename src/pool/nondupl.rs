//! A pool that stores equivalent items at most once.
//!
//! Live slots are indexed by the item's hash key. An insertion that finds
//! an equivalent item already present drops the candidate and returns a
//! reference to the existing slot. Items stored here must implement
//! `pool_key`/`pool_equal` meaningfully.

use std::collections::HashMap;
use std::rc::Rc;

use crate::buffer::CutBuffer;
use crate::error::{Error, Result};
use crate::pool::standard::{Ranking, StandardPool};
use crate::pool::{PoolItem, PoolSlotRef, SlotPtr, references};
use crate::{E, I, Sense};

#[derive(Debug)]
pub struct NonDuplPool<T: PoolItem + ?Sized> {
    pool: StandardPool<T>,
    hash: HashMap<u64, Vec<I>>,
    auto_realloc: bool,
    n_duplications: I,
}

impl<T: PoolItem + ?Sized> NonDuplPool<T> {
    pub fn new(size: I, auto_realloc: bool) -> Self {
        Self {
            pool: StandardPool::new(size, false),
            hash: HashMap::new(),
            auto_realloc,
            n_duplications: 0,
        }
    }

    pub fn size(&self) -> I {
        self.pool.size()
    }

    pub fn number(&self) -> I {
        self.pool.number()
    }

    pub fn slot(&self, i: I) -> &SlotPtr<T> {
        self.pool.slot(i)
    }

    /// The slot holding an item equivalent to `item`, if one is present.
    pub fn present(&self, item: &T) -> Option<I> {
        let bucket = self.hash.get(&item.pool_key())?;
        for &i in bucket {
            let slot = self.pool.slot(i).borrow();
            if let Some(existing) = slot.item() {
                if existing.pool_equal(item) {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Inserts `item` unless an equivalent item is already stored; in
    /// that case the candidate is dropped and a reference to the
    /// existing slot is returned.
    pub fn insert(&mut self, item: Rc<T>) -> Result<PoolSlotRef<T>> {
        if let Some(i) = self.present(item.as_ref()) {
            self.n_duplications += 1;
            return Ok(PoolSlotRef::new(self.pool.slot(i)));
        }

        if !self.pool.has_free() {
            self.cleanup();
        }
        if !self.pool.has_free() {
            if self.auto_realloc {
                self.increase(self.size() + self.size() / 4 + 1)?;
            } else {
                return Err(Error::pool("pool is full and not growable"));
            }
        }

        let key = item.pool_key();
        let (idx, slot_ref) = self
            .pool
            .insert_in_free_slot(item)
            .expect("insert: free slot vanished");
        self.hash.entry(key).or_default().push(idx);
        Ok(slot_ref)
    }

    /// Drops every unreferenced item, keeping the hash index consistent.
    pub fn cleanup(&mut self) -> I {
        let mut n = 0;
        for i in 0..self.pool.size() {
            let key = {
                let slot = self.pool.slot(i).borrow();
                if slot.is_void() || slot.n_active() > 0 {
                    continue;
                }
                match slot.item() {
                    Some(item) => item.pool_key(),
                    None => continue,
                }
            };
            if references(self.pool.slot(i)) > 0 {
                continue;
            }
            if self.pool.soft_delete_slot(i) {
                self.unhash(key, i);
                n += 1;
            }
        }
        n
    }

    /// Grows the pool to `new_size` slots; the hash index and the
    /// statistics counters are unaffected.
    pub fn increase(&mut self, new_size: I) -> Result<()> {
        self.pool.increase(new_size)
    }

    pub fn separate(
        &self,
        z: &[E],
        co: &[Rc<T::Co>],
        sense: Sense,
        buffer: &mut CutBuffer<T>,
        min_abs_violation: E,
        ranking: Ranking,
    ) -> I {
        self.pool
            .separate(z, co, sense, buffer, min_abs_violation, ranking)
    }

    /// The number of rejected duplicate insertions and the number of
    /// hash collisions. Many collisions indicate a weak hash key.
    pub fn statistics(&self) -> (I, I) {
        let n_collisions = self
            .hash
            .values()
            .map(|bucket| bucket.len().saturating_sub(1))
            .sum();
        (self.n_duplications, n_collisions)
    }

    fn unhash(&mut self, key: u64, idx: I) {
        if let Some(bucket) = self.hash.get_mut(&key) {
            bucket.retain(|&i| i != idx);
            if bucket.is_empty() {
                self.hash.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convar::{Constraint, LinearConstraint};
    use crate::sparse::ConSense;

    fn con(support: &[I], rhs: E) -> Rc<dyn Constraint> {
        let coeff = vec![1.0; support.len()];
        Rc::new(LinearConstraint::from_pairs(support, &coeff, ConSense::Less, rhs))
    }

    #[test]
    fn duplicates_return_the_same_slot() {
        let mut pool: NonDuplPool<dyn Constraint> = NonDuplPool::new(4, false);
        let r0 = pool.insert(con(&[0, 1], 1.0)).unwrap();
        let r1 = pool.insert(con(&[0, 1], 1.0)).unwrap();
        assert!(Rc::ptr_eq(
            &r0.item().unwrap(),
            &r1.item().unwrap()
        ));
        assert_eq!(pool.number(), 1);
        assert_eq!(pool.statistics().0, 1);
    }

    #[test]
    fn distinct_items_occupy_distinct_slots() {
        let mut pool: NonDuplPool<dyn Constraint> = NonDuplPool::new(4, false);
        pool.insert(con(&[0], 1.0)).unwrap();
        pool.insert(con(&[1], 1.0)).unwrap();
        assert_eq!(pool.number(), 2);
        assert_eq!(pool.statistics().0, 0);
    }

    #[test]
    fn reinsert_after_soft_delete_reuses_the_slot() {
        let mut pool: NonDuplPool<dyn Constraint> = NonDuplPool::new(1, false);
        let r0 = pool.insert(con(&[0, 2], 3.0)).unwrap();
        let addr0 = Rc::as_ptr(r0.slot());
        drop(r0);
        assert_eq!(pool.cleanup(), 1);
        // The slot is reclaimed, then refilled by the equal item.
        let r1 = pool.insert(con(&[0, 2], 3.0)).unwrap();
        assert_eq!(Rc::as_ptr(r1.slot()), addr0);
        assert_eq!(pool.number(), 1);
    }

    #[test]
    fn present_probes_by_content() {
        let mut pool: NonDuplPool<dyn Constraint> = NonDuplPool::new(4, false);
        pool.insert(con(&[0, 1], 1.0)).unwrap();
        assert!(pool.present(con(&[0, 1], 1.0).as_ref()).is_some());
        assert!(pool.present(con(&[0, 3], 1.0).as_ref()).is_none());
    }
}
