//! Branching rules.
//!
//! A rule describes how a child subdivides its parent's feasible
//! region: setting a binary variable, imposing new bounds, pinning a
//! value, or adding a branching constraint. The closed set of kinds is
//! dispatched statically through [`BranchRule`].
//!
//! `extract` applies a rule to the child's local state when the child is
//! activated. `extract_lp`/`unextract_lp` apply and undo a rule directly
//! on a node LP, which is how candidates are probed during strong
//! branching.

use enum_dispatch::enum_dispatch;

use crate::convar::ConRc;
use crate::error::{Error, Result};
use crate::lp::LpSub;
use crate::varstat::{FsVarStat, VarType};
use crate::{E, I};

/// The mutable child state a rule is applied to: the local variable
/// statuses, the local bounds, and the branching constraints scheduled
/// for activation.
pub struct BranchContext<'a> {
    pub fs_var_stat: &'a mut [FsVarStat],
    pub lb: &'a mut [E],
    pub ub: &'a mut [E],
    pub branch_cons: &'a mut Vec<ConRc>,
    pub machine_eps: E,
}

#[enum_dispatch]
pub trait BranchRuleOps {
    /// Applies the rule to a child's local state.
    fn extract(&self, ctx: &mut BranchContext<'_>) -> Result<()>;

    /// Applies the rule directly to a node LP for a strong-branching
    /// probe.
    fn extract_lp(&mut self, lp: &mut LpSub) -> Result<()>;

    /// Undoes a previous [`extract_lp`](Self::extract_lp).
    fn unextract_lp(&mut self, lp: &mut LpSub) -> Result<()>;

    /// True if the rule sets a binary variable.
    fn branch_on_set_var(&self) -> bool;

    /// For set-branching rules: true if the variable is set to its
    /// upper bound.
    fn set_to_upper_bound(&self) -> bool;
}

/// Sets a binary variable to its lower or its upper bound.
pub struct SetBranch {
    variable: I,
    status: FsVarStat,
    old_bounds: Option<(E, E)>,
}

impl SetBranch {
    pub fn to_upper(variable: I) -> Self {
        Self {
            variable,
            status: FsVarStat::SetToUpperBound,
            old_bounds: None,
        }
    }

    pub fn to_lower(variable: I) -> Self {
        Self {
            variable,
            status: FsVarStat::SetToLowerBound,
            old_bounds: None,
        }
    }

    pub fn variable(&self) -> I {
        self.variable
    }
}

impl BranchRuleOps for SetBranch {
    fn extract(&self, ctx: &mut BranchContext<'_>) -> Result<()> {
        let i = self.variable;
        let old = ctx.fs_var_stat[i];
        if old.contradicts(self.status, ctx.lb[i], ctx.ub[i], ctx.machine_eps) {
            return Err(Error::fix_set(format!(
                "branch on variable {i} contradicts its status"
            )));
        }
        ctx.fs_var_stat[i] = self.status;
        Ok(())
    }

    fn extract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        let i = self.variable;
        let (lb, ub) = lp.bounds(i)?;
        self.old_bounds = Some((lb, ub));
        if self.status == FsVarStat::SetToUpperBound {
            lp.change_l_bound(i, ub)
        } else {
            lp.change_u_bound(i, lb)
        }
    }

    fn unextract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        let i = self.variable;
        let (lb, ub) = self
            .old_bounds
            .take()
            .ok_or_else(|| Error::new(crate::error::ErrorKind::BranchingRule, "unextract before extract"))?;
        lp.change_l_bound(i, lb)?;
        lp.change_u_bound(i, ub)
    }

    fn branch_on_set_var(&self) -> bool {
        true
    }

    fn set_to_upper_bound(&self) -> bool {
        self.status == FsVarStat::SetToUpperBound
    }
}

/// Imposes a new bound interval on an integer variable.
pub struct BoundBranch {
    variable: I,
    lb: E,
    ub: E,
    old_bounds: Option<(E, E)>,
}

impl BoundBranch {
    pub fn new(variable: I, lb: E, ub: E) -> Self {
        Self {
            variable,
            lb,
            ub,
            old_bounds: None,
        }
    }

    pub fn variable(&self) -> I {
        self.variable
    }
}

impl BranchRuleOps for BoundBranch {
    fn extract(&self, ctx: &mut BranchContext<'_>) -> Result<()> {
        let i = self.variable;
        if let Some(v) = ctx.fs_var_stat[i].value(ctx.lb[i], ctx.ub[i]) {
            if v < self.lb - ctx.machine_eps || v > self.ub + ctx.machine_eps {
                return Err(Error::fix_set(format!(
                    "bound branch on variable {i} contradicts its held value"
                )));
            }
        }
        ctx.lb[i] = self.lb;
        ctx.ub[i] = self.ub;
        Ok(())
    }

    fn extract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        let i = self.variable;
        self.old_bounds = Some(lp.bounds(i)?);
        lp.change_l_bound(i, self.lb)?;
        lp.change_u_bound(i, self.ub)
    }

    fn unextract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        let i = self.variable;
        let (lb, ub) = self
            .old_bounds
            .take()
            .ok_or_else(|| Error::new(crate::error::ErrorKind::BranchingRule, "unextract before extract"))?;
        lp.change_l_bound(i, lb)?;
        lp.change_u_bound(i, ub)
    }

    fn branch_on_set_var(&self) -> bool {
        false
    }

    fn set_to_upper_bound(&self) -> bool {
        false
    }
}

/// Pins a variable to an explicit value within the subtree.
pub struct ValBranch {
    variable: I,
    value: E,
    old_bounds: Option<(E, E)>,
}

impl ValBranch {
    pub fn new(variable: I, value: E) -> Self {
        Self {
            variable,
            value,
            old_bounds: None,
        }
    }
}

impl BranchRuleOps for ValBranch {
    fn extract(&self, ctx: &mut BranchContext<'_>) -> Result<()> {
        let i = self.variable;
        let next = FsVarStat::Set(self.value);
        if ctx.fs_var_stat[i].contradicts(next, ctx.lb[i], ctx.ub[i], ctx.machine_eps) {
            return Err(Error::fix_set(format!(
                "value branch on variable {i} contradicts its status"
            )));
        }
        ctx.fs_var_stat[i] = next;
        Ok(())
    }

    fn extract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        let i = self.variable;
        self.old_bounds = Some(lp.bounds(i)?);
        lp.change_l_bound(i, self.value)?;
        lp.change_u_bound(i, self.value)
    }

    fn unextract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        let i = self.variable;
        let (lb, ub) = self
            .old_bounds
            .take()
            .ok_or_else(|| Error::new(crate::error::ErrorKind::BranchingRule, "unextract before extract"))?;
        lp.change_l_bound(i, lb)?;
        lp.change_u_bound(i, ub)
    }

    fn branch_on_set_var(&self) -> bool {
        false
    }

    fn set_to_upper_bound(&self) -> bool {
        false
    }
}

/// Adds a branching constraint, valid in the child's subtree.
pub struct ConBranch {
    constraint: ConRc,
    added_row: bool,
}

impl ConBranch {
    pub fn new(constraint: ConRc) -> Self {
        Self {
            constraint,
            added_row: false,
        }
    }
}

impl BranchRuleOps for ConBranch {
    fn extract(&self, ctx: &mut BranchContext<'_>) -> Result<()> {
        ctx.branch_cons.push(self.constraint.clone());
        Ok(())
    }

    fn extract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        lp.add_branching_row(self.constraint.as_ref())?;
        self.added_row = true;
        Ok(())
    }

    fn unextract_lp(&mut self, lp: &mut LpSub) -> Result<()> {
        if self.added_row {
            lp.remove_last_row()?;
            self.added_row = false;
        }
        Ok(())
    }

    fn branch_on_set_var(&self) -> bool {
        false
    }

    fn set_to_upper_bound(&self) -> bool {
        false
    }
}

/// The closed set of branching-rule kinds.
#[enum_dispatch(BranchRuleOps)]
pub enum BranchRule {
    SetBranch,
    BoundBranch,
    ValBranch,
    ConBranch,
}

/// Selects up to `n_candidates` branching-variable candidates among the
/// fractional discrete variables, closest to one half first; with
/// `expensive`, ties prefer the larger objective coefficient. The
/// returned order is deterministic (stable on the variable position).
pub fn close_half_candidates(
    x: &[E],
    var_type: &[VarType],
    fs_var_stat: &[FsVarStat],
    obj: &[E],
    machine_eps: E,
    n_candidates: I,
    expensive: bool,
) -> Vec<I> {
    let mut candidates: Vec<I> = (0..x.len())
        .filter(|&i| {
            var_type[i].discrete()
                && !fs_var_stat[i].fixed_or_set()
                && {
                    let frac = x[i] - x[i].floor();
                    frac > machine_eps && frac < 1.0 - machine_eps
                }
        })
        .collect();
    candidates.sort_by(|&a, &b| {
        let da = (x[a] - x[a].floor() - 0.5).abs();
        let db = (x[b] - x[b].floor() - 0.5).abs();
        da.partial_cmp(&db)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                if expensive {
                    obj[b]
                        .abs()
                        .partial_cmp(&obj[a].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .then(a.cmp(&b))
    });
    candidates.truncate(n_candidates);
    candidates
}
