//! The per-node buffer for newly generated constraints and variables.
//!
//! Separators and pricers do not modify the node LP directly; they push
//! pool references into a bounded buffer. At the end of an iteration the
//! buffer is drained, best-ranked first, up to the per-iteration addition
//! cap; everything else is released again.

use crate::error::{Error, Result};
use crate::pool::{PoolItem, PoolSlotRef};
use crate::{E, I};

#[derive(Debug)]
pub struct CutBuffer<T: PoolItem + ?Sized> {
    refs: Vec<PoolSlotRef<T>>,
    ranks: Vec<E>,
    /// True while every insertion carried a rank.
    ranking: bool,
    max_size: I,
}

impl<T: PoolItem + ?Sized> CutBuffer<T> {
    pub fn new(max_size: I) -> Self {
        Self {
            refs: Vec::new(),
            ranks: Vec::new(),
            ranking: true,
            max_size,
        }
    }

    pub fn size(&self) -> I {
        self.max_size
    }

    pub fn number(&self) -> I {
        self.refs.len()
    }

    /// The number of items that can still be buffered.
    pub fn space(&self) -> I {
        self.max_size - self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Buffers an unranked item. Once an unranked item is present the
    /// buffer is drained in plain FIFO order.
    pub fn insert(&mut self, item: PoolSlotRef<T>) -> Result<()> {
        if self.space() == 0 {
            return Err(Error::buffer("cut buffer is full"));
        }
        self.ranking = false;
        self.refs.push(item);
        Ok(())
    }

    /// Buffers an item together with a rank; higher ranks are extracted
    /// first.
    pub fn insert_ranked(&mut self, item: PoolSlotRef<T>, rank: E) -> Result<()> {
        if self.space() == 0 {
            return Err(Error::buffer("cut buffer is full"));
        }
        self.refs.push(item);
        self.ranks.push(rank);
        Ok(())
    }

    /// Drains the buffer and returns up to `max_extract` items, ranked
    /// best-first when every item carried a rank and in insertion order
    /// otherwise (stable under equal ranks). The remaining references are
    /// released.
    pub fn extract(&mut self, max_extract: I) -> Vec<PoolSlotRef<T>> {
        let refs = std::mem::take(&mut self.refs);
        let ranks = std::mem::take(&mut self.ranks);
        let ranked = self.ranking && ranks.len() == refs.len();
        self.ranking = true;

        let mut order: Vec<I> = (0..refs.len()).collect();
        if ranked {
            order.sort_by(|&a, &b| ranks[b].partial_cmp(&ranks[a]).unwrap_or(std::cmp::Ordering::Equal));
        }

        let mut slots: Vec<Option<PoolSlotRef<T>>> = refs.into_iter().map(Some).collect();
        order
            .into_iter()
            .take(max_extract)
            .map(|i| slots[i].take().expect("extract: duplicate position"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::convar::{LinearConstraint, Constraint};
    use crate::pool::StandardPool;
    use crate::sparse::ConSense;

    fn pool_with(n: I) -> (StandardPool<dyn Constraint>, Vec<PoolSlotRef<dyn Constraint>>) {
        let mut pool: StandardPool<dyn Constraint> = StandardPool::new(n, false);
        let refs = (0..n)
            .map(|i| {
                let con = LinearConstraint::from_pairs(&[i], &[1.0], ConSense::Less, i as E);
                pool.insert(Rc::new(con)).unwrap()
            })
            .collect();
        (pool, refs)
    }

    #[test]
    fn overflow_is_an_error() {
        let (_pool, refs) = pool_with(3);
        let mut buf: CutBuffer<dyn Constraint> = CutBuffer::new(2);
        let mut it = refs.into_iter();
        buf.insert(it.next().unwrap()).unwrap();
        buf.insert(it.next().unwrap()).unwrap();
        assert_eq!(buf.space(), 0);
        assert!(buf.insert(it.next().unwrap()).is_err());
    }

    #[test]
    fn ranked_extraction_is_best_first_and_stable() {
        let (_pool, refs) = pool_with(4);
        let mut buf: CutBuffer<dyn Constraint> = CutBuffer::new(4);
        let ranks = [1.0, 3.0, 3.0, 2.0];
        for (r, rank) in refs.into_iter().zip(ranks) {
            buf.insert_ranked(r, rank).unwrap();
        }
        let out = buf.extract(3);
        let rhs: Vec<E> = out
            .iter()
            .map(|r| r.item().unwrap().rhs())
            .collect();
        // rank 3.0 entries keep their insertion order, then rank 2.0
        assert_eq!(rhs, vec![1.0, 2.0, 3.0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn unranked_extraction_is_fifo() {
        let (_pool, refs) = pool_with(3);
        let mut buf: CutBuffer<dyn Constraint> = CutBuffer::new(3);
        for r in refs {
            buf.insert(r).unwrap();
        }
        let out = buf.extract(2);
        let rhs: Vec<E> = out.iter().map(|r| r.item().unwrap().rhs()).collect();
        assert_eq!(rhs, vec![0.0, 1.0]);
    }
}
