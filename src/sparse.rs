//! Sparse vectors and the matrix rows/columns built from them.
//!
//! A [`SparseVec`] keeps an explicit distinction between its allocated
//! capacity (`size`) and the number of nonzeros in use (`nnz`); when it
//! runs full it grows by a configurable percentage. [`Row`] extends the
//! vector with a sense and a right-hand side, [`Column`] with objective
//! coefficient and bounds.

use std::fmt;

use crate::{E, I};

/// The sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConSense {
    Less,
    Equal,
    Greater,
}

impl fmt::Display for ConSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConSense::Less => write!(f, "<="),
            ConSense::Equal => write!(f, "="),
            ConSense::Greater => write!(f, ">="),
        }
    }
}

/// A sparse vector of (support, coefficient) pairs.
#[derive(Debug, Clone)]
pub struct SparseVec {
    support: Vec<I>,
    coeff: Vec<E>,
    nnz: I,
    /// Growth in percent of the current size when the vector runs full.
    realloc_fac: E,
}

impl SparseVec {
    pub const DEFAULT_REALLOC_FAC: E = 10.0;

    /// An empty vector with room for `size` nonzeros.
    pub fn new(size: I) -> Self {
        Self::with_realloc_fac(size, Self::DEFAULT_REALLOC_FAC)
    }

    pub fn with_realloc_fac(size: I, realloc_fac: E) -> Self {
        Self {
            support: vec![0; size],
            coeff: vec![0.0; size],
            nnz: 0,
            realloc_fac,
        }
    }

    /// Builds a vector from parallel support/coefficient slices.
    pub fn from_pairs(support: &[I], coeff: &[E]) -> Self {
        assert_eq!(support.len(), coeff.len());
        Self {
            support: support.to_vec(),
            coeff: coeff.to_vec(),
            nnz: support.len(),
            realloc_fac: Self::DEFAULT_REALLOC_FAC,
        }
    }

    /// The allocated capacity.
    pub fn size(&self) -> I {
        self.support.len()
    }

    /// The number of nonzeros in use.
    pub fn nnz(&self) -> I {
        self.nnz
    }

    pub fn support(&self, i: I) -> I {
        assert!(i < self.nnz, "SparseVec::support: index {i} out of range");
        self.support[i]
    }

    pub fn coeff(&self, i: I) -> E {
        assert!(i < self.nnz, "SparseVec::coeff: index {i} out of range");
        self.coeff[i]
    }

    /// The coefficient of original index `name`, 0 if absent.
    pub fn orig_coeff(&self, name: I) -> E {
        for i in 0..self.nnz {
            if self.support[i] == name {
                return self.coeff[i];
            }
        }
        0.0
    }

    /// Appends a nonzero, growing the allocation if required.
    pub fn insert(&mut self, support: I, coeff: E) {
        if self.nnz == self.support.len() {
            self.realloc_default();
        }
        self.support[self.nnz] = support;
        self.coeff[self.nnz] = coeff;
        self.nnz += 1;
    }

    pub fn clear(&mut self) {
        self.nnz = 0;
    }

    /// Removes the entries at the positions in `del` (ascending) by
    /// shifting the remaining entries to the left.
    pub fn left_shift(&mut self, del: &[I]) {
        if del.is_empty() {
            return;
        }
        let mut current = del[0];
        for (k, &d) in del.iter().enumerate() {
            assert!(d < self.nnz, "SparseVec::left_shift: position out of range");
            let last = if k + 1 < del.len() { del[k + 1] } else { self.nnz };
            for i in d + 1..last {
                self.support[current] = self.support[i];
                self.coeff[current] = self.coeff[i];
                current += 1;
            }
        }
        self.nnz -= del.len();
    }

    /// Replaces each support value `s` by `new_name[s]`.
    pub fn rename(&mut self, new_name: &[I]) {
        for i in 0..self.nnz {
            self.support[i] = new_name[self.support[i]];
        }
    }

    pub fn copy(&mut self, other: &SparseVec) {
        if self.support.len() < other.nnz {
            self.realloc(other.nnz);
        }
        self.support[..other.nnz].copy_from_slice(&other.support[..other.nnz]);
        self.coeff[..other.nnz].copy_from_slice(&other.coeff[..other.nnz]);
        self.nnz = other.nnz;
    }

    /// The Euclidean norm of the coefficients.
    pub fn norm(&self) -> E {
        self.coeff[..self.nnz].iter().map(|c| c * c).sum::<E>().sqrt()
    }

    fn realloc_default(&mut self) {
        let grown = self.support.len() + (self.support.len() as E * self.realloc_fac / 100.0) as I + 1;
        self.realloc(grown);
    }

    /// Grows the allocation to `new_size`; never shrinks below `nnz`.
    pub fn realloc(&mut self, new_size: I) {
        let new_size = new_size.max(self.nnz);
        self.support.resize(new_size, 0);
        self.coeff.resize(new_size, 0.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, E)> + '_ {
        (0..self.nnz).map(|i| (self.support[i], self.coeff[i]))
    }
}

/// A constraint row: a sparse vector with a sense and a right-hand side.
#[derive(Debug, Clone)]
pub struct Row {
    vec: SparseVec,
    sense: ConSense,
    rhs: E,
}

impl Row {
    pub fn new(size: I, sense: ConSense, rhs: E) -> Self {
        Self {
            vec: SparseVec::new(size),
            sense,
            rhs,
        }
    }

    pub fn from_pairs(support: &[I], coeff: &[E], sense: ConSense, rhs: E) -> Self {
        Self {
            vec: SparseVec::from_pairs(support, coeff),
            sense,
            rhs,
        }
    }

    pub fn rhs(&self) -> E {
        self.rhs
    }

    pub fn set_rhs(&mut self, rhs: E) {
        self.rhs = rhs;
    }

    pub fn sense(&self) -> ConSense {
        self.sense
    }

    pub fn set_sense(&mut self, sense: ConSense) {
        self.sense = sense;
    }

    pub fn vec(&self) -> &SparseVec {
        &self.vec
    }

    pub fn vec_mut(&mut self) -> &mut SparseVec {
        &mut self.vec
    }

    pub fn nnz(&self) -> I {
        self.vec.nnz()
    }

    pub fn support(&self, i: I) -> I {
        self.vec.support(i)
    }

    pub fn coeff(&self, i: I) -> E {
        self.vec.coeff(i)
    }

    pub fn insert(&mut self, support: I, coeff: E) {
        self.vec.insert(support, coeff);
    }

    pub fn copy(&mut self, other: &Row) {
        self.vec.copy(&other.vec);
        self.sense = other.sense;
        self.rhs = other.rhs;
    }

    /// Removes the entries at positions `del` and shifts the right-hand
    /// side by `rhs_delta` (the substitution contribution of the removed
    /// variables).
    pub fn del_ind(&mut self, del: &[I], rhs_delta: E) {
        self.vec.left_shift(del);
        self.rhs -= rhs_delta;
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, (s, c)) in self.vec.iter().enumerate() {
            if k > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{c} x{s}")?;
        }
        write!(f, " {} {}", self.sense, self.rhs)
    }
}

/// A variable column: a sparse vector with objective coefficient and
/// bounds.
#[derive(Debug, Clone)]
pub struct Column {
    vec: SparseVec,
    obj: E,
    lb: E,
    ub: E,
}

impl Column {
    pub fn new(size: I, obj: E, lb: E, ub: E) -> Self {
        Self {
            vec: SparseVec::new(size),
            obj,
            lb,
            ub,
        }
    }

    pub fn from_pairs(support: &[I], coeff: &[E], obj: E, lb: E, ub: E) -> Self {
        Self {
            vec: SparseVec::from_pairs(support, coeff),
            obj,
            lb,
            ub,
        }
    }

    pub fn obj(&self) -> E {
        self.obj
    }

    pub fn lb(&self) -> E {
        self.lb
    }

    pub fn ub(&self) -> E {
        self.ub
    }

    pub fn vec(&self) -> &SparseVec {
        &self.vec
    }

    pub fn nnz(&self) -> I {
        self.vec.nnz()
    }

    pub fn support(&self, i: I) -> I {
        self.vec.support(i)
    }

    pub fn coeff(&self, i: I) -> E {
        self.vec.coeff(i)
    }

    pub fn insert(&mut self, support: I, coeff: E) {
        self.vec.insert(support, coeff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_grows_past_capacity() {
        let mut v = SparseVec::new(2);
        v.insert(0, 1.0);
        v.insert(3, 2.0);
        v.insert(7, 3.0);
        assert_eq!(v.nnz(), 3);
        assert!(v.size() >= 3);
        assert_eq!(v.support(2), 7);
        assert_eq!(v.orig_coeff(3), 2.0);
        assert_eq!(v.orig_coeff(5), 0.0);
    }

    #[test]
    fn left_shift_compacts() {
        let mut v = SparseVec::from_pairs(&[0, 1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        v.left_shift(&[1, 3]);
        assert_eq!(v.nnz(), 3);
        assert_eq!(
            v.iter().collect::<Vec<_>>(),
            vec![(0, 1.0), (2, 3.0), (4, 5.0)]
        );
    }

    #[test]
    fn row_del_ind_adjusts_rhs() {
        let mut r = Row::from_pairs(&[0, 1, 2], &[1.0, 1.0, 1.0], ConSense::Less, 10.0);
        r.del_ind(&[1], 3.0);
        assert_eq!(r.nnz(), 2);
        assert_eq!(r.rhs(), 7.0);
    }

    #[test]
    fn rename_remaps_support() {
        let mut v = SparseVec::from_pairs(&[0, 2], &[1.0, 1.0]);
        v.rename(&[5, 6, 7]);
        assert_eq!(v.iter().map(|(s, _)| s).collect::<Vec<_>>(), vec![5, 7]);
    }

    #[test]
    fn norm_is_euclidean() {
        let v = SparseVec::from_pairs(&[0, 1], &[3.0, 4.0]);
        assert_eq!(v.norm(), 5.0);
    }
}
