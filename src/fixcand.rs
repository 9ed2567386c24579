//! Candidates for fixing by reduced cost.
//!
//! When the remaining-tree root is first processed, every variable that
//! sat at one of its bounds in the root LP becomes a candidate: moving
//! it off that bound worsens the objective by at least its reduced
//! cost, so the fixing expression `dual bound ± |reduced cost|` is a
//! valid bound on every solution with the variable off the bound.
//! Whenever the primal bound improves, candidates whose expression can
//! no longer beat it are fixed globally for the rest of the search.

use crate::convar::Variable;
use crate::pool::PoolSlotRef;
use crate::varstat::{FsVarStat, LpVarStat};
use crate::{E, I, Sense};

pub struct FixCand {
    candidates: Vec<PoolSlotRef<dyn Variable>>,
    fs_var_stat: Vec<FsVarStat>,
    /// The left-hand side of the fixing expression.
    lhs: Vec<E>,
}

/// A fixing decision produced by [`FixCand::fix_by_red_cost`].
pub struct Fixing {
    pub slot: PoolSlotRef<dyn Variable>,
    pub status: FsVarStat,
}

impl FixCand {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            fs_var_stat: Vec::new(),
            lhs: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> I {
        self.candidates.len()
    }

    /// Memorizes the candidates from the root LP: every variable at one
    /// of its bounds, with the bound it sat at and its fixing
    /// expression (the bound on every solution holding the variable off
    /// that bound).
    pub fn save_candidates(
        &mut self,
        vars: &[(PoolSlotRef<dyn Variable>, LpVarStat, E)],
        sense: Sense,
        dual_bound: E,
    ) {
        self.delete_all();
        for (slot, stat, reco) in vars {
            let status = match stat {
                LpVarStat::AtLowerBound => FsVarStat::FixedToLowerBound,
                LpVarStat::AtUpperBound => FsVarStat::FixedToUpperBound,
                _ => continue,
            };
            self.candidates.push(slot.clone());
            self.fs_var_stat.push(status);
            self.lhs.push(match sense {
                Sense::Min => dual_bound + reco.abs(),
                Sense::Max => dual_bound - reco.abs(),
            });
        }
    }

    /// Re-evaluates every candidate against the primal bound and
    /// returns the variables that can now be fixed; they are removed
    /// from the candidate set.
    ///
    /// With an integer objective a candidate is already fixable when its
    /// expression exceeds the next integer below (above, for
    /// maximization) the primal bound.
    pub fn fix_by_red_cost(
        &mut self,
        sense: Sense,
        primal_bound: E,
        obj_integer: bool,
        eps: E,
    ) -> Vec<Fixing> {
        let mut fixed = Vec::new();
        let mut keep_candidates = Vec::new();
        let mut keep_stat = Vec::new();
        let mut keep_lhs = Vec::new();
        for ((slot, status), lhs) in self
            .candidates
            .drain(..)
            .zip(self.fs_var_stat.drain(..))
            .zip(self.lhs.drain(..))
        {
            let fixable = match sense {
                Sense::Min => {
                    if obj_integer {
                        lhs > primal_bound - 1.0 + eps
                    } else {
                        lhs > primal_bound - eps
                    }
                }
                Sense::Max => {
                    if obj_integer {
                        lhs < primal_bound + 1.0 - eps
                    } else {
                        lhs < primal_bound + eps
                    }
                }
            };
            if fixable && slot.valid() {
                fixed.push(Fixing { slot, status });
            } else if slot.valid() {
                keep_candidates.push(slot);
                keep_stat.push(status);
                keep_lhs.push(lhs);
            }
        }
        self.candidates = keep_candidates;
        self.fs_var_stat = keep_stat;
        self.lhs = keep_lhs;
        fixed
    }

    /// Releases every candidate reference.
    pub fn delete_all(&mut self) {
        self.candidates.clear();
        self.fs_var_stat.clear();
        self.lhs.clear();
    }
}

impl Default for FixCand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::pool::StandardPool;
    use crate::convar::NumVariable;

    fn var_pool(n: I) -> (StandardPool<dyn Variable>, Vec<PoolSlotRef<dyn Variable>>) {
        let mut pool: StandardPool<dyn Variable> = StandardPool::new(n, false);
        let refs = (0..n)
            .map(|i| pool.insert(Rc::new(NumVariable::binary(i, 1.0))).unwrap())
            .collect();
        (pool, refs)
    }

    #[test]
    fn candidates_come_from_bound_statuses_only() {
        let (_pool, refs) = var_pool(3);
        let mut fc = FixCand::new();
        fc.save_candidates(
            &[
                (refs[0].clone(), LpVarStat::AtUpperBound, -0.3),
                (refs[1].clone(), LpVarStat::Basic, 0.0),
                (refs[2].clone(), LpVarStat::AtLowerBound, 0.7),
            ],
            Sense::Min,
            96.0,
        );
        assert_eq!(fc.len(), 2);
    }

    #[test]
    fn improving_primal_bound_triggers_fixing() {
        let (_pool, refs) = var_pool(2);
        let mut fc = FixCand::new();
        // dual bound 96, reduced costs 0.3 and 5.0
        fc.save_candidates(
            &[
                (refs[0].clone(), LpVarStat::AtUpperBound, -0.3),
                (refs[1].clone(), LpVarStat::AtLowerBound, 5.0),
            ],
            Sense::Min,
            96.0,
        );
        // primal bound 100: only the 5.0 candidate exceeds it
        let fixed = fc.fix_by_red_cost(Sense::Min, 100.0, false, 1.0e-4);
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].status, FsVarStat::FixedToLowerBound);
        assert_eq!(fc.len(), 1);
        // primal bound tightens to 96.2: 96 + 0.3 > 96.2 fixes the rest
        let fixed = fc.fix_by_red_cost(Sense::Min, 96.2, false, 1.0e-4);
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].status, FsVarStat::FixedToUpperBound);
        assert!(fc.is_empty());
    }

    #[test]
    fn integer_objective_fixes_earlier() {
        let (_pool, refs) = var_pool(1);
        let mut fc = FixCand::new();
        fc.save_candidates(&[(refs[0].clone(), LpVarStat::AtLowerBound, 0.5)], Sense::Min, 9.0);
        // lhs = 9.5; plain rule cannot fix against primal 10, but with an
        // integer objective the next better solution is at most 9.
        let fixed = fc.fix_by_red_cost(Sense::Min, 10.0, false, 1.0e-4);
        assert!(fixed.is_empty());
        let fixed = fc.fix_by_red_cost(Sense::Min, 10.0, true, 1.0e-4);
        assert_eq!(fixed.len(), 1);
    }
}
