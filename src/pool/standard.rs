//! The standard pool: a slot array with a free-slot list.

use std::rc::Rc;

use crate::buffer::CutBuffer;
use crate::error::{Error, Result};
use crate::pool::{PoolItem, PoolSlotRef, SlotPtr, new_slot, references};
use crate::{E, I, Sense};

/// How separated items are ranked when they are buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ranking {
    /// No rank; the buffer drains in FIFO order.
    None,
    /// The violation of the separated item.
    #[default]
    Violation,
    /// The absolute violation of the separated item.
    AbsViolation,
    /// The item's own rank.
    Rank,
}

#[derive(Debug)]
pub struct StandardPool<T: PoolItem + ?Sized> {
    slots: Vec<SlotPtr<T>>,
    free: Vec<I>,
    /// Grow automatically when the pool runs full.
    auto_realloc: bool,
}

impl<T: PoolItem + ?Sized> StandardPool<T> {
    /// An empty pool with `size` slots, all of them free.
    pub fn new(size: I, auto_realloc: bool) -> Self {
        let slots: Vec<SlotPtr<T>> = (0..size).map(|_| new_slot()).collect();
        let free = (0..size).rev().collect();
        Self {
            slots,
            free,
            auto_realloc,
        }
    }

    /// The maximal number of items the pool can hold without growing.
    pub fn size(&self) -> I {
        self.slots.len()
    }

    /// The number of occupied slots.
    pub fn number(&self) -> I {
        self.slots.len() - self.free.len()
    }

    pub fn slot(&self, i: I) -> &SlotPtr<T> {
        &self.slots[i]
    }

    pub(crate) fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    /// Fills a free slot without trying to make room first.
    pub(crate) fn insert_in_free_slot(&mut self, item: Rc<T>) -> Option<(I, PoolSlotRef<T>)> {
        let idx = self.free.pop()?;
        self.slots[idx].borrow_mut().fill(item);
        Some((idx, PoolSlotRef::new(&self.slots[idx])))
    }

    /// Inserts an item. When no free slot is available the pool first
    /// drops unreferenced items, then inactive items with the fewest
    /// references, and finally grows if automatic reallocation is
    /// enabled.
    pub fn insert(&mut self, item: Rc<T>) -> Result<PoolSlotRef<T>> {
        if !self.has_free() {
            self.cleanup();
        }
        if !self.has_free() {
            self.remove_non_active(self.size() / 10 + 1);
        }
        if !self.has_free() {
            if self.auto_realloc {
                self.increase(self.size() + self.size() / 4 + 1)?;
            } else {
                return Err(Error::pool("pool is full and not growable"));
            }
        }
        let (_, slot_ref) = self
            .insert_in_free_slot(item)
            .expect("insert: free slot vanished");
        Ok(slot_ref)
    }

    /// Soft-deletes the item in slot `i` if nothing references it.
    pub fn soft_delete_slot(&mut self, i: I) -> bool {
        {
            let slot = self.slots[i].borrow();
            if slot.is_void() || slot.n_active() > 0 {
                return false;
            }
        }
        if references(&self.slots[i]) > 0 {
            return false;
        }
        self.slots[i].borrow_mut().clear();
        self.free.push(i);
        true
    }

    /// Unconditionally clears slot `i`; stale references are invalidated
    /// through the slot version. Reserved for the pool's own room-making
    /// and teardown.
    fn hard_delete_slot(&mut self, i: I) {
        if self.slots[i].borrow().is_void() {
            return;
        }
        self.slots[i].borrow_mut().clear();
        self.free.push(i);
    }

    /// Drops every item without references and returns the number of
    /// reclaimed slots.
    pub fn cleanup(&mut self) -> I {
        let mut n = 0;
        for i in 0..self.slots.len() {
            if self.soft_delete_slot(i) {
                n += 1;
            }
        }
        n
    }

    /// Hard-deletes up to `max_remove` inactive items, fewest references
    /// first.
    pub(crate) fn remove_non_active(&mut self, max_remove: I) -> I {
        let mut candidates: Vec<(I, I)> = Vec::new();
        for (i, slot) in self.slots.iter().enumerate() {
            let s = slot.borrow();
            if !s.is_void() && s.n_active() == 0 {
                candidates.push((references(slot), i));
            }
        }
        candidates.sort_by_key(|&(refs, _)| refs);
        let mut n = 0;
        for &(_, i) in candidates.iter().take(max_remove) {
            self.hard_delete_slot(i);
            n += 1;
        }
        n
    }

    /// Grows the pool to `new_size` slots. Shrinking is an error.
    pub fn increase(&mut self, new_size: I) -> Result<()> {
        if new_size < self.slots.len() {
            return Err(Error::pool("a pool cannot shrink"));
        }
        for i in self.slots.len()..new_size {
            self.slots.push(new_slot());
            self.free.push(i);
        }
        Ok(())
    }

    /// Scans the pool for items violated by `z` (an LP solution against
    /// the active variables for a constraint pool; dual values against
    /// the active constraints for a variable pool) and buffers them,
    /// most violated first under the chosen ranking. Items already
    /// active in the querying node and items local to another subtree
    /// are skipped.
    ///
    /// Returns the number of buffered items.
    pub fn separate(
        &self,
        z: &[E],
        co: &[Rc<T::Co>],
        sense: Sense,
        buffer: &mut CutBuffer<T>,
        min_abs_violation: E,
        ranking: Ranking,
    ) -> I {
        let mut n = 0;
        for slot in &self.slots {
            if buffer.space() == 0 {
                break;
            }
            let item = {
                let s = slot.borrow();
                if s.is_void() || s.n_active() > 0 {
                    continue;
                }
                s.item().expect("separate: non-void slot without item")
            };
            if !item.sharable() {
                continue;
            }
            let Some(violation) = item.pool_violation(z, co, sense, min_abs_violation) else {
                continue;
            };
            if violation < min_abs_violation {
                continue;
            }
            let slot_ref = PoolSlotRef::new(slot);
            let inserted = match ranking {
                Ranking::None => buffer.insert(slot_ref),
                Ranking::Violation => buffer.insert_ranked(slot_ref, violation),
                Ranking::AbsViolation => buffer.insert_ranked(slot_ref, violation.abs()),
                Ranking::Rank => buffer.insert_ranked(slot_ref, item.pool_rank()),
            };
            if inserted.is_ok() {
                n += 1;
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convar::{Constraint, LinearConstraint, NumVariable, Variable};
    use crate::sparse::ConSense;

    fn con(rhs: E) -> Rc<dyn Constraint> {
        Rc::new(LinearConstraint::from_pairs(&[0], &[1.0], ConSense::Less, rhs))
    }

    #[test]
    fn full_pool_evicts_inactive_items() {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(2, false);
        let r0 = pool.insert(con(0.0)).unwrap();
        let r1 = pool.insert(con(1.0)).unwrap();
        let r1_extra = r1.clone();
        // Room is made by evicting the inactive item with the fewest
        // references; its references turn stale instead of dangling.
        let r2 = pool.insert(con(2.0)).unwrap();
        assert!(!r0.valid());
        assert!(r1.valid() && r1_extra.valid());
        assert_eq!(r2.item().unwrap().rhs(), 2.0);
        assert_eq!(pool.number(), 2);
    }

    #[test]
    fn cleanup_reclaims_unreferenced_slots() {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(2, false);
        let r0 = pool.insert(con(0.0)).unwrap();
        let _r1 = pool.insert(con(1.0)).unwrap();
        drop(r0);
        assert_eq!(pool.cleanup(), 1);
        assert_eq!(pool.number(), 1);
    }

    #[test]
    fn insert_reuses_dropped_slots() {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(1, false);
        let r0 = pool.insert(con(0.0)).unwrap();
        drop(r0);
        let r1 = pool.insert(con(5.0)).unwrap();
        assert_eq!(r1.item().unwrap().rhs(), 5.0);
    }

    #[test]
    fn auto_realloc_grows_on_demand() {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(1, true);
        let r0 = pool.insert(con(0.0)).unwrap();
        let r1 = pool.insert(con(1.0)).unwrap();
        assert!(pool.size() > 1);
        assert!(r0.valid() && r1.valid());
    }

    #[test]
    fn separate_collects_violated_constraints() {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(4, false);
        // x0 <= 1 (satisfied), x0 <= 0.2 (violated by 0.3), x0 <= 0.4 (violated by 0.1)
        let _r = [
            pool.insert(con(1.0)).unwrap(),
            pool.insert(con(0.2)).unwrap(),
            pool.insert(con(0.4)).unwrap(),
        ];
        let vars: Vec<Rc<dyn Variable>> = vec![Rc::new(NumVariable::binary(0, 1.0))];
        let mut buf: CutBuffer<dyn Constraint> = CutBuffer::new(8);
        let n = pool.separate(
            &[0.5],
            &vars,
            Sense::Min,
            &mut buf,
            0.001,
            Ranking::Violation,
        );
        assert_eq!(n, 2);
        let out = buf.extract(8);
        let rhs: Vec<E> = out.iter().map(|r| r.item().unwrap().rhs()).collect();
        assert_eq!(rhs, vec![0.2, 0.4]);
    }
}
