//! A registry of per-node dual bounds with best/worst queries.
//!
//! Holds up to `n` dual bounds indexed by integer id, backed by an
//! [`IntSet`] for O(1) membership. The best and worst values are
//! maintained incrementally; a full rescan happens only when the entry
//! holding the current extreme is replaced or removed.

use crate::sets::IntSet;
use crate::{E, I};

#[derive(Debug, Clone)]
pub struct DualBound {
    set: IntSet,
    bounds: Vec<E>,
    best: E,
    best_index: Option<I>,
    worst: E,
    min_is_best: bool,
    infinity: E,
}

impl DualBound {
    pub fn new(infinity: E) -> Self {
        Self {
            set: IntSet::new(),
            bounds: Vec::new(),
            best: 0.0,
            best_index: None,
            worst: 0.0,
            min_is_best: true,
            infinity,
        }
    }

    /// Initializes an empty registry for up to `n` bounds. With
    /// `min_is_best` the minimum is reported by [`best`](Self::best),
    /// otherwise the maximum.
    pub fn initialize(&mut self, n: I, min_is_best: bool) {
        self.min_is_best = min_is_best;
        self.set.initialize(n);
        self.bounds = vec![0.0; n];
        self.update_best_and_worst();
    }

    /// The capacity of the registry.
    pub fn capacity(&self) -> I {
        self.bounds.len()
    }

    pub fn count(&self) -> I {
        self.set.count()
    }

    /// Inserts the bound `d` at index `i`, updating in place if an entry
    /// with this index already exists.
    pub fn insert(&mut self, i: I, d: E) {
        if self.set.exists(i) && (self.bounds[i] == self.best || self.bounds[i] == self.worst) {
            self.bounds[i] = d;
            self.update_best_and_worst();
        } else {
            self.set.insert(i);
            self.bounds[i] = d;
            if self.min_is_best {
                if d < self.best {
                    self.best = d;
                    self.best_index = Some(i);
                }
                if d > self.worst {
                    self.worst = d;
                }
            } else {
                if d > self.best {
                    self.best = d;
                    self.best_index = Some(i);
                }
                if d < self.worst {
                    self.worst = d;
                }
            }
        }
    }

    pub fn remove(&mut self, i: I) {
        if self.set.exists(i) {
            self.set.remove(i);
            if self.bounds[i] == self.best || self.bounds[i] == self.worst {
                self.update_best_and_worst();
            }
        }
    }

    /// True if `d` would be a new bound at `i` or strictly improve the
    /// bound stored there.
    pub fn better(&self, i: I, d: E) -> bool {
        if self.set.exists(i) {
            let old = self.bounds[i];
            if self.min_is_best {
                if d <= old {
                    return false;
                }
            } else if d >= old {
                return false;
            }
        }
        true
    }

    /// The best stored bound and its index.
    pub fn best(&self) -> (E, Option<I>) {
        (self.best, self.best_index)
    }

    /// The best of the stored bounds and `d`.
    pub fn best_with(&self, d: E) -> E {
        if self.min_is_best {
            d.min(self.best)
        } else {
            d.max(self.best)
        }
    }

    pub fn worst(&self) -> E {
        self.worst
    }

    /// The stored (index, bound) pairs, in insertion-dependent order.
    pub fn entries(&self) -> Vec<(I, E)> {
        self.set.iter().map(|i| (i, self.bounds[i])).collect()
    }

    fn update_best_and_worst(&mut self) {
        self.best_index = None;
        if self.min_is_best {
            self.best = self.infinity;
            self.worst = -self.infinity;
            for i in self.set.iter() {
                let d = self.bounds[i];
                if d < self.best {
                    self.best = d;
                    self.best_index = Some(i);
                }
                if d > self.worst {
                    self.worst = d;
                }
            }
        } else {
            self.best = -self.infinity;
            self.worst = self.infinity;
            for i in self.set.iter() {
                let d = self.bounds[i];
                if d > self.best {
                    self.best = d;
                    self.best_index = Some(i);
                }
                if d < self.worst {
                    self.worst = d;
                }
            }
        }
    }
}
