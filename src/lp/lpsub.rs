//! The node-local linear program.
//!
//! `LpSub` presents the LP engine a compact formulation of a node's
//! active sets while hiding fixed and set variables: an eliminated
//! variable is substituted into the right-hand side of every row it
//! appears in, and the solution accessors translate back to the node's
//! "original" index space (the positions of the active variable set).

use crate::convar::{ConRc, VarRc};
use crate::error::{Error, Result};
use crate::lp::{LpMethod, LpSolver, LpStatus};
use crate::sparse::{Column, Row};
use crate::varstat::{FsVarStat, LpVarStat, SlackStat};
use crate::{E, I, Sense, Tol};

pub struct LpSub {
    solver: Box<dyn LpSolver>,
    /// Snapshot of the active variables, for row materialization.
    vars: Vec<VarRc>,
    /// `orig_to_lp[i]` is the LP column of active variable `i`, `None`
    /// when the variable is eliminated.
    orig_to_lp: Vec<Option<I>>,
    lp_to_orig: Vec<I>,
    /// The substituted value of each eliminated variable (0 otherwise).
    elim_val: Vec<E>,
    /// The objective contribution of each eliminated variable.
    elim_add: Vec<E>,
    /// Total objective contribution of the eliminated variables.
    value_add: E,
}

impl LpSub {
    /// Builds the node LP from the active sets. A variable is eliminated
    /// when it is fixed or set, elimination is enabled, and it was not
    /// basic in the preceding LP; a fixed or set variable that stays in
    /// the LP has its bounds collapsed to the held value instead.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        mut solver: Box<dyn LpSolver>,
        sense: Sense,
        cons: &[ConRc],
        vars: &[VarRc],
        fs_stat: &[FsVarStat],
        lb: &[E],
        ub: &[E],
        prior_stat: Option<&[LpVarStat]>,
        eliminate_fixed_set: bool,
    ) -> Result<Self> {
        let n_orig = vars.len();
        let mut orig_to_lp: Vec<Option<I>> = vec![None; n_orig];
        let mut lp_to_orig: Vec<I> = Vec::with_capacity(n_orig);
        let mut elim_val = vec![0.0; n_orig];
        let mut elim_add = vec![0.0; n_orig];
        let mut value_add = 0.0;

        for i in 0..n_orig {
            let held = fs_stat[i].value(lb[i], ub[i]);
            let was_basic = prior_stat.map(|s| s[i].basic()).unwrap_or(false);
            match held {
                Some(v) if eliminate_fixed_set && !was_basic => {
                    elim_val[i] = v;
                    elim_add[i] = vars[i].obj() * v;
                    value_add += elim_add[i];
                }
                _ => {
                    orig_to_lp[i] = Some(lp_to_orig.len());
                    lp_to_orig.push(i);
                }
            }
        }

        let n_col = lp_to_orig.len();
        let mut obj = Vec::with_capacity(n_col);
        let mut col_lb = Vec::with_capacity(n_col);
        let mut col_ub = Vec::with_capacity(n_col);
        for &i in &lp_to_orig {
            obj.push(vars[i].obj());
            match fs_stat[i].value(lb[i], ub[i]) {
                Some(v) => {
                    col_lb.push(v);
                    col_ub.push(v);
                }
                None => {
                    col_lb.push(lb[i]);
                    col_ub.push(ub[i]);
                }
            }
        }

        let mut rows = Vec::with_capacity(cons.len());
        for con in cons {
            let full = con.gen_row(vars);
            rows.push(translate_row(&full, &orig_to_lp, &elim_val));
        }

        solver.initialize(
            sense,
            rows.len(),
            rows.len(),
            n_col,
            n_col,
            &obj,
            &col_lb,
            &col_ub,
            &rows,
        )?;

        Ok(Self {
            solver,
            vars: vars.to_vec(),
            orig_to_lp,
            lp_to_orig,
            elim_val,
            elim_add,
            value_add,
        })
    }

    pub fn solve(&mut self, method: LpMethod) -> Result<LpStatus> {
        self.solver.optimize(method)
    }

    pub fn status(&self) -> LpStatus {
        self.solver.status()
    }

    pub fn infeasible(&self) -> bool {
        self.solver.infeasible()
    }

    /// The number of columns loaded into the LP.
    pub fn n_col(&self) -> I {
        self.solver.n_col()
    }

    pub fn n_row(&self) -> I {
        self.solver.n_row()
    }

    /// The number of active variables, eliminated ones included.
    pub fn n_orig_cols(&self) -> I {
        self.orig_to_lp.len()
    }

    pub fn n_eliminated(&self) -> I {
        self.orig_to_lp.iter().filter(|e| e.is_none()).count()
    }

    pub fn eliminated(&self, i: I) -> bool {
        self.orig_to_lp[i].is_none()
    }

    pub fn elim_val(&self, i: I) -> E {
        self.elim_val[i]
    }

    pub fn orig_to_lp(&self, i: I) -> Option<I> {
        self.orig_to_lp[i]
    }

    pub fn lp_to_orig(&self, j: I) -> I {
        self.lp_to_orig[j]
    }

    /// The true objective value: the LP value plus the contribution of
    /// the eliminated variables.
    pub fn value(&self) -> E {
        self.solver.value() + self.value_add
    }

    /// The solution value of active variable `i`.
    pub fn x_val(&self, i: I) -> E {
        match self.orig_to_lp[i] {
            Some(j) => self.solver.x_val(j),
            None => self.elim_val[i],
        }
    }

    /// The reduced cost of active variable `i`; eliminated variables
    /// have none.
    pub fn reco(&self, i: I) -> Option<E> {
        self.orig_to_lp[i].map(|j| self.solver.reco(j))
    }

    pub fn lp_var_stat(&self, i: I) -> LpVarStat {
        match self.orig_to_lp[i] {
            Some(j) => self.solver.lp_var_stat(j),
            None => LpVarStat::Eliminated,
        }
    }

    pub fn y_val(&self, r: I) -> E {
        self.solver.y_val(r)
    }

    pub fn slack_stat(&self, r: I) -> SlackStat {
        self.solver.slack_stat(r)
    }

    pub fn slack(&self, r: I) -> E {
        self.solver.slack(r)
    }

    /// Replaces the right-hand side of every loaded row.
    pub fn change_rhs(&mut self, rhs: &[E]) -> Result<()> {
        self.solver.change_rhs(rhs)
    }

    /// The current LP bounds of active variable `i`.
    pub fn bounds(&self, i: I) -> Result<(E, E)> {
        match self.orig_to_lp[i] {
            Some(j) => Ok((self.solver.l_bound(j), self.solver.u_bound(j))),
            None => Err(Error::lp_sub("bounds of an eliminated variable")),
        }
    }

    /// Materializes and appends one branching row (used by
    /// strong-branching probes).
    pub fn add_branching_row(&mut self, con: &dyn crate::convar::Constraint) -> Result<()> {
        let full = con.gen_row(&self.vars);
        let translated = translate_row(&full, &self.orig_to_lp, &self.elim_val);
        self.solver.add_rows(std::slice::from_ref(&translated))
    }

    /// Removes the most recently added row.
    pub fn remove_last_row(&mut self) -> Result<()> {
        let m = self.solver.n_row();
        if m == 0 {
            return Err(Error::lp_sub("remove_last_row on an LP without rows"));
        }
        self.solver.rem_rows(&[m - 1])
    }

    /// Changes the lower bound of active variable `i`.
    pub fn change_l_bound(&mut self, i: I, v: E) -> Result<()> {
        match self.orig_to_lp[i] {
            Some(j) => self.solver.change_l_bound(j, v),
            None => Err(Error::lp_sub("bound change on an eliminated variable")),
        }
    }

    pub fn change_u_bound(&mut self, i: I, v: E) -> Result<()> {
        match self.orig_to_lp[i] {
            Some(j) => self.solver.change_u_bound(j, v),
            None => Err(Error::lp_sub("bound change on an eliminated variable")),
        }
    }

    pub fn set_simplex_iteration_limit(&mut self, limit: I) -> Result<()> {
        self.solver.set_simplex_iteration_limit(limit)
    }

    /// Adds constraints; rows are expressed over the original (active
    /// variable) index space and translated here.
    pub fn add_cons(&mut self, rows: &[Row]) -> Result<()> {
        let translated: Vec<Row> = rows
            .iter()
            .map(|r| translate_row(r, &self.orig_to_lp, &self.elim_val))
            .collect();
        self.solver.add_rows(&translated)
    }

    pub fn remove_cons(&mut self, ind: &[I]) -> Result<()> {
        self.solver.rem_rows(ind)
    }

    /// Appends variables; each column is expressed over the current LP
    /// rows. The new variables are never eliminated.
    pub fn add_vars(&mut self, new_vars: &[VarRc], cols: &[Column]) -> Result<()> {
        if new_vars.len() != cols.len() {
            return Err(Error::lp_sub("add_vars: variable/column count mismatch"));
        }
        self.solver.add_cols(cols)?;
        for var in new_vars {
            let orig = self.orig_to_lp.len();
            self.orig_to_lp.push(Some(self.lp_to_orig.len()));
            self.lp_to_orig.push(orig);
            self.elim_val.push(0.0);
            self.elim_add.push(0.0);
            self.vars.push(var.clone());
        }
        Ok(())
    }

    /// Removes active variables by original index and restores the
    /// translation invariants.
    pub fn remove_vars(&mut self, orig_ind: &[I]) -> Result<()> {
        let mut lp_ind: Vec<I> = Vec::new();
        let mut remove = vec![false; self.orig_to_lp.len()];
        for &i in orig_ind {
            if i >= self.orig_to_lp.len() {
                return Err(Error::lp_sub("remove_vars: index out of range"));
            }
            remove[i] = true;
            if let Some(j) = self.orig_to_lp[i] {
                lp_ind.push(j);
            }
        }
        self.solver.rem_cols(&lp_ind)?;

        let mut orig_to_lp = Vec::new();
        let mut lp_to_orig = Vec::new();
        let mut elim_val = Vec::new();
        let mut elim_add = Vec::new();
        let mut vars = Vec::new();
        let mut value_add = self.value_add;
        for i in 0..self.orig_to_lp.len() {
            if remove[i] {
                if self.orig_to_lp[i].is_none() {
                    value_add -= self.elim_add[i];
                }
                continue;
            }
            match self.orig_to_lp[i] {
                Some(_) => {
                    orig_to_lp.push(Some(lp_to_orig.len()));
                    lp_to_orig.push(orig_to_lp.len() - 1);
                }
                None => orig_to_lp.push(None),
            }
            elim_val.push(self.elim_val[i]);
            elim_add.push(self.elim_add[i]);
            vars.push(self.vars[i].clone());
        }
        self.orig_to_lp = orig_to_lp;
        self.lp_to_orig = lp_to_orig;
        self.elim_val = elim_val;
        self.elim_add = elim_add;
        self.vars = vars;
        self.value_add = value_add;
        Ok(())
    }
}

/// Rewrites a row over the original index space into the LP index
/// space, substituting eliminated variables into the right-hand side.
fn translate_row(row: &Row, orig_to_lp: &[Option<I>], elim_val: &[E]) -> Row {
    let mut out = Row::new(row.nnz(), row.sense(), row.rhs());
    let mut rhs_delta = 0.0;
    for (s, c) in row.vec().iter() {
        match orig_to_lp[s] {
            Some(j) => out.insert(j, c),
            None => rhs_delta += c * elim_val[s],
        }
    }
    out.set_rhs(row.rhs() - rhs_delta);
    out
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::convar::{LinearConstraint, NumVariable};
    use crate::lp::DenseSimplex;
    use crate::sparse::ConSense;
    use crate::varstat::VarType;

    fn vars(n: I) -> Vec<VarRc> {
        (0..n)
            .map(|j| Rc::new(NumVariable::new(j, 1.0, 0.0, 1.0, VarType::Binary)) as VarRc)
            .collect()
    }

    fn solver() -> Box<dyn LpSolver> {
        Box::new(DenseSimplex::new(Tol::default()))
    }

    #[test]
    fn elimination_substitutes_into_the_rhs() {
        // min x0 + x1 + x2  s.t.  x0 + x1 + x2 >= 2, x1 fixed to 1 and
        // eliminated: internal LP is x0 + x2 >= 1 over two columns.
        let vars = vars(3);
        let cons: Vec<ConRc> = vec![Rc::new(LinearConstraint::from_pairs(
            &[0, 1, 2],
            &[1.0, 1.0, 1.0],
            ConSense::Greater,
            2.0,
        ))];
        let fs = [
            FsVarStat::Free,
            FsVarStat::FixedToUpperBound,
            FsVarStat::Free,
        ];
        let mut lp = LpSub::build(
            solver(),
            Sense::Min,
            &cons,
            &vars,
            &fs,
            &[0.0, 0.0, 0.0],
            &[1.0, 1.0, 1.0],
            None,
            true,
        )
        .unwrap();
        assert_eq!(lp.n_col(), 2);
        assert_eq!(lp.n_orig_cols(), 3);
        assert_eq!(lp.n_eliminated(), 1);
        assert!(lp.eliminated(1));
        assert_eq!(lp.solve(LpMethod::Dual).unwrap(), LpStatus::Optimal);
        // x1 contributes 1 to the objective, one more unit is needed
        assert!((lp.value() - 2.0).abs() < 1.0e-9);
        assert!((lp.x_val(1) - 1.0).abs() < 1.0e-9);
        assert_eq!(lp.lp_var_stat(1), LpVarStat::Eliminated);
        assert_eq!(lp.reco(1), None);
    }

    #[test]
    fn translation_round_trips_for_live_variables() {
        let vars = vars(4);
        let cons: Vec<ConRc> = Vec::new();
        let fs = [
            FsVarStat::Free,
            FsVarStat::SetToLowerBound,
            FsVarStat::Free,
            FsVarStat::Free,
        ];
        let lp = LpSub::build(
            solver(),
            Sense::Min,
            &cons,
            &vars,
            &fs,
            &[0.0; 4],
            &[1.0; 4],
            None,
            true,
        )
        .unwrap();
        for i in 0..4 {
            if let Some(j) = lp.orig_to_lp(i) {
                assert_eq!(lp.lp_to_orig(j), i);
            }
        }
        assert_eq!(lp.n_col() + lp.n_eliminated(), lp.n_orig_cols());
    }

    #[test]
    fn collapsed_bounds_without_elimination() {
        // x1 set to upper but kept in the LP: bounds collapse to 1.
        let vars = vars(2);
        let cons: Vec<ConRc> = vec![Rc::new(LinearConstraint::from_pairs(
            &[0, 1],
            &[1.0, 1.0],
            ConSense::Less,
            2.0,
        ))];
        let fs = [FsVarStat::Free, FsVarStat::SetToUpperBound];
        let mut lp = LpSub::build(
            solver(),
            Sense::Min,
            &cons,
            &vars,
            &fs,
            &[0.0, 0.0],
            &[1.0, 1.0],
            None,
            false,
        )
        .unwrap();
        assert_eq!(lp.n_col(), 2);
        assert_eq!(lp.solve(LpMethod::Dual).unwrap(), LpStatus::Optimal);
        assert!((lp.x_val(1) - 1.0).abs() < 1.0e-9);
        assert!((lp.value() - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn add_and_remove_variables_restore_translation() {
        let all = vars(3);
        let cons: Vec<ConRc> = vec![Rc::new(LinearConstraint::from_pairs(
            &[0, 1, 2],
            &[1.0, 1.0, 1.0],
            ConSense::Less,
            2.0,
        ))];
        let fs = [FsVarStat::Free, FsVarStat::FixedToLowerBound, FsVarStat::Free];
        let mut lp = LpSub::build(
            solver(),
            Sense::Min,
            &cons,
            &all,
            &fs,
            &[0.0; 3],
            &[1.0; 3],
            None,
            true,
        )
        .unwrap();
        assert_eq!(lp.n_col(), 2);
        let new_var: VarRc = Rc::new(NumVariable::new(3, -1.0, 0.0, 1.0, VarType::Binary));
        lp.add_vars(&[new_var], &[Column::from_pairs(&[0], &[1.0], -1.0, 0.0, 1.0)])
            .unwrap();
        assert_eq!(lp.n_col(), 3);
        assert_eq!(lp.n_orig_cols(), 4);
        assert_eq!(lp.orig_to_lp(3), Some(2));
        assert_eq!(lp.lp_to_orig(2), 3);

        lp.remove_vars(&[0]).unwrap();
        assert_eq!(lp.n_col(), 2);
        assert_eq!(lp.n_orig_cols(), 3);
        // position 0 is now the eliminated variable, 1 and 2 are live
        assert!(lp.eliminated(0));
        assert_eq!(lp.orig_to_lp(1), Some(0));
        assert_eq!(lp.orig_to_lp(2), Some(1));
        for i in 0..3 {
            if let Some(j) = lp.orig_to_lp(i) {
                assert_eq!(lp.lp_to_orig(j), i);
            }
        }
    }
}
