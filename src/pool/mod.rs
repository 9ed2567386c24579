//! Reference-counted repositories of constraints and variables.
//!
//! Items live in pool *slots* shared by every node of the enumeration
//! tree. A [`PoolSlotRef`] keeps its slot alive through reference
//! counting and records the slot's version at construction, so a slot
//! that has been reclaimed and refilled invalidates every stale
//! reference instead of silently handing out a different item.

mod nondupl;
mod standard;

use std::cell::RefCell;
use std::rc::Rc;

use crate::convar::{Constraint, Variable};
use crate::{E, I, Sense};

pub use nondupl::NonDuplPool;
pub use standard::{Ranking, StandardPool};

/// The capability a pool needs from its items: hashing and equality for
/// duplicate suppression, a rank for ordered separation, and a violation
/// test against a point expressed over the co-item set (the LP solution
/// and the active variables for constraints; the dual values and the
/// active constraints for variables).
pub trait PoolItem {
    type Co: ?Sized;

    fn pool_key(&self) -> u64;

    fn pool_equal(&self, other: &Self) -> bool;

    fn pool_rank(&self) -> E;

    /// The violation magnitude of `z`, or `None` if the item is not
    /// violated.
    fn pool_violation(&self, z: &[E], co: &[Rc<Self::Co>], sense: Sense, eps: E) -> Option<E>;

    /// False for items that must not be shared through pool separation
    /// (constraints local to a subtree).
    fn sharable(&self) -> bool {
        true
    }
}

impl PoolItem for dyn Constraint {
    type Co = dyn Variable;

    fn pool_key(&self) -> u64 {
        self.hash_key()
    }

    fn pool_equal(&self, other: &Self) -> bool {
        self.equal(other)
    }

    fn pool_rank(&self) -> E {
        self.rank()
    }

    fn pool_violation(&self, z: &[E], co: &[Rc<dyn Variable>], _sense: Sense, _eps: E) -> Option<E> {
        self.violation(co, z)
    }

    fn sharable(&self) -> bool {
        !self.local()
    }
}

impl PoolItem for dyn Variable {
    type Co = dyn Constraint;

    fn pool_key(&self) -> u64 {
        self.hash_key()
    }

    fn pool_equal(&self, other: &Self) -> bool {
        self.equal(other)
    }

    fn pool_rank(&self) -> E {
        self.rank()
    }

    fn pool_violation(&self, z: &[E], co: &[Rc<dyn Constraint>], sense: Sense, eps: E) -> Option<E> {
        let rc = self.red_cost(co, z);
        if self.improving(rc, sense, eps) {
            Some(rc.abs())
        } else {
            None
        }
    }
}

/// A cell holding one item. The slot's address is stable for the life of
/// the pool; the contained item changes only through a reclaim/refill
/// cycle, which bumps the version.
#[derive(Debug)]
pub struct PoolSlot<T: ?Sized> {
    item: Option<Rc<T>>,
    version: u64,
    /// How many active sets currently include this slot.
    n_active: I,
}

impl<T: ?Sized> PoolSlot<T> {
    fn void() -> Self {
        Self {
            item: None,
            version: 0,
            n_active: 0,
        }
    }

    pub fn item(&self) -> Option<Rc<T>> {
        self.item.clone()
    }

    pub fn is_void(&self) -> bool {
        self.item.is_none()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn n_active(&self) -> I {
        self.n_active
    }

    pub(crate) fn activate(&mut self) {
        self.n_active += 1;
    }

    pub(crate) fn deactivate(&mut self) {
        debug_assert!(self.n_active > 0);
        self.n_active -= 1;
    }

    fn fill(&mut self, item: Rc<T>) {
        debug_assert!(self.item.is_none());
        self.item = Some(item);
    }

    fn clear(&mut self) {
        self.item = None;
        self.version += 1;
        self.n_active = 0;
    }
}

/// A shared, interior-mutable pool slot.
pub type SlotPtr<T> = Rc<RefCell<PoolSlot<T>>>;

pub(crate) fn new_slot<T: ?Sized>() -> SlotPtr<T> {
    Rc::new(RefCell::new(PoolSlot::void()))
}

/// The number of references held on a slot besides the pool's own.
pub(crate) fn references<T: ?Sized>(slot: &SlotPtr<T>) -> I {
    Rc::strong_count(slot) - 1
}

/// An owning reference into a pool slot.
///
/// The reference keeps the slot's reference count up for as long as it
/// lives and survives slot refills only if its recorded version still
/// equals the slot's.
#[derive(Debug)]
pub struct PoolSlotRef<T: ?Sized> {
    slot: SlotPtr<T>,
    version: u64,
}

impl<T: ?Sized> PoolSlotRef<T> {
    pub(crate) fn new(slot: &SlotPtr<T>) -> Self {
        let version = slot.borrow().version();
        Self {
            slot: Rc::clone(slot),
            version,
        }
    }

    /// True while the slot still holds the item this reference was
    /// created for.
    pub fn valid(&self) -> bool {
        let s = self.slot.borrow();
        s.version() == self.version && !s.is_void()
    }

    /// The referenced item, or `None` if the slot has been reclaimed.
    pub fn item(&self) -> Option<Rc<T>> {
        let s = self.slot.borrow();
        if s.version() == self.version { s.item() } else { None }
    }

    pub fn slot(&self) -> &SlotPtr<T> {
        &self.slot
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: ?Sized> Clone for PoolSlotRef<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convar::LinearConstraint;
    use crate::sparse::ConSense;

    fn con(rhs: E) -> Rc<dyn Constraint> {
        Rc::new(LinearConstraint::from_pairs(&[0], &[1.0], ConSense::Less, rhs))
    }

    #[test]
    fn slot_ref_counts_references() {
        let slot: SlotPtr<dyn Constraint> = new_slot();
        slot.borrow_mut().fill(con(1.0));
        assert_eq!(references(&slot), 0);
        let r1 = PoolSlotRef::new(&slot);
        let r2 = r1.clone();
        assert_eq!(references(&slot), 2);
        drop(r1);
        assert_eq!(references(&slot), 1);
        assert!(r2.valid());
    }

    #[test]
    fn refill_invalidates_stale_refs() {
        let slot: SlotPtr<dyn Constraint> = new_slot();
        slot.borrow_mut().fill(con(1.0));
        let stale = PoolSlotRef::new(&slot);
        slot.borrow_mut().clear();
        slot.borrow_mut().fill(con(2.0));
        assert!(!stale.valid());
        assert!(stale.item().is_none());
        let fresh = PoolSlotRef::new(&slot);
        assert_eq!(fresh.item().unwrap().rhs(), 2.0);
    }
}
