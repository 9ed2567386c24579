//! Subproblems: the nodes of the enumeration tree.
//!
//! A node's life cycle:
//!
//! ```text
//!      Unprocessed --select--> Processing --+--> Fathomed
//!                                           +--> Processed (-> children Unprocessed)
//!                                           +--> Dormant
//!      Dormant ----requeue----> Processing
//! ```
//!
//! While a node is `Processing` it runs the cutting/pricing loop: solve
//! the relaxation, try to fathom by bound or infeasibility, fix and set
//! variables by reduced cost, test feasibility, watch for tailing off,
//! separate cutting planes, price out variables, apply the buffered
//! changes, and iterate; when nothing improves any more, branch.

use std::rc::Rc;

use crate::active::ActiveSet;
use crate::branching::{
    BranchContext, BranchRule, BranchRuleOps, BoundBranch, SetBranch, close_half_candidates,
};
use crate::buffer::CutBuffer;
use crate::convar::{ConRc, Constraint, VarRc, Variable};
use crate::error::{Error, ErrorKind, Result};
use crate::lp::{LpMethod, LpStatus, LpSub};
use crate::master::{ConElimMode, Master, VarElimMode};
use crate::model::{LpSolution, Model};
use crate::pool::PoolSlotRef;
use crate::sparse::Column;
use crate::tailoff::TailOff;
use crate::varstat::{FsVarStat, LpVarStat, SlackStat};
use crate::{E, I, Sense};

/// The state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubStatus {
    #[default]
    Unprocessed,
    Processing,
    Processed,
    Dormant,
    Fathomed,
}

/// How a processing round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeOutcome {
    Fathomed,
    Branched,
    Dormant,
}

/// A node of the enumeration tree.
pub struct Sub {
    pub(crate) id: I,
    pub(crate) level: I,
    pub(crate) parent: Option<I>,
    pub(crate) children: Vec<I>,
    pub(crate) status: SubStatus,
    /// Active constraints; released when the node is fathomed.
    pub(crate) actcon: Option<ActiveSet<dyn Constraint>>,
    /// Active variables; released when the node is fathomed.
    pub(crate) actvar: Option<ActiveSet<dyn Variable>>,
    pub(crate) fs_var_stat: Vec<FsVarStat>,
    pub(crate) lp_var_stat: Vec<LpVarStat>,
    pub(crate) slack_stat: Vec<SlackStat>,
    /// Local bounds, narrowed by branching.
    pub(crate) lb: Vec<E>,
    pub(crate) ub: Vec<E>,
    pub(crate) dual_bound: E,
    /// The rule that produced this node from its parent.
    pub(crate) branch_rule: Option<BranchRule>,
    /// Branching constraints awaiting activation.
    pub(crate) branch_cons: Vec<ConRc>,
    pub(crate) tailoff: TailOff,
    pub(crate) n_iterations: I,
    /// Number of processing rounds (dormant reawakenings included).
    pub(crate) n_opt: I,
    pub(crate) dormant_rounds: I,
    pub(crate) lp: Option<LpSub>,
    pub(crate) con_buffer: CutBuffer<dyn Constraint>,
    pub(crate) var_buffer: CutBuffer<dyn Variable>,
}

impl Sub {
    /// The root node over the given initial active sets.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn root(
        actcon: ActiveSet<dyn Constraint>,
        actvar: ActiveSet<dyn Variable>,
        sense: Sense,
        infinity: E,
        tailoff_n_lps: I,
        tailoff_percent: E,
        max_con_buffered: I,
        max_var_buffered: I,
    ) -> Self {
        let n_var = actvar.number();
        let n_con = actcon.number();
        let vars = actvar.items();
        let lb = vars.iter().map(|v| v.lb()).collect();
        let ub = vars.iter().map(|v| v.ub()).collect();
        Self {
            id: 0,
            level: 1,
            parent: None,
            children: Vec::new(),
            status: SubStatus::Unprocessed,
            actcon: Some(actcon),
            actvar: Some(actvar),
            fs_var_stat: vec![FsVarStat::Free; n_var],
            lp_var_stat: vec![LpVarStat::Unknown; n_var],
            slack_stat: vec![SlackStat::Unknown; n_con],
            lb,
            ub,
            dual_bound: if sense.min() { -infinity } else { infinity },
            branch_rule: None,
            branch_cons: Vec::new(),
            tailoff: TailOff::new(tailoff_n_lps, tailoff_percent),
            n_iterations: 0,
            n_opt: 0,
            dormant_rounds: 0,
            lp: None,
            con_buffer: CutBuffer::new(max_con_buffered),
            var_buffer: CutBuffer::new(max_var_buffered),
        }
    }

    pub fn id(&self) -> I {
        self.id
    }

    pub fn level(&self) -> I {
        self.level
    }

    pub fn status(&self) -> SubStatus {
        self.status
    }

    pub fn dual_bound(&self) -> E {
        self.dual_bound
    }

    pub fn branch_rule(&self) -> Option<&BranchRule> {
        self.branch_rule.as_ref()
    }

    pub fn n_active_vars(&self) -> I {
        self.actvar.as_ref().map(ActiveSet::number).unwrap_or(0)
    }

    pub fn n_active_cons(&self) -> I {
        self.actcon.as_ref().map(ActiveSet::number).unwrap_or(0)
    }

    /// Releases the LP and every pool reference (fathoming).
    pub(crate) fn release(&mut self) {
        self.lp = None;
        self.actcon = None;
        self.actvar = None;
        self.branch_cons.clear();
        self.con_buffer = CutBuffer::new(0);
        self.var_buffer = CutBuffer::new(0);
    }
}

enum FixSetOutcome {
    Unchanged,
    Changed,
    Contradiction,
}

impl<M: Model> Master<M> {
    /// Runs one processing round of the node `id`.
    pub(crate) fn optimize_sub(&mut self, id: I) -> Result<()> {
        let mut sub = self.subs[id]
            .take()
            .ok_or_else(|| Error::new(ErrorKind::Global, "selected node is missing"))?;
        let outcome = self.process_node(&mut sub);
        self.subs[id] = Some(sub);
        outcome.map(|_| ())
    }

    fn process_node(&mut self, sub: &mut Sub) -> Result<NodeOutcome> {
        sub.status = SubStatus::Processing;
        sub.n_opt += 1;
        sub.n_iterations = 0;
        if !self.activate(sub)? {
            self.fathom(sub);
            return Ok(NodeOutcome::Fathomed);
        }
        let outcome = self.cutting_loop(sub);
        sub.lp = None;
        outcome
    }

    /// Builds the node LP and reconciles the local statuses with the
    /// globally fixed variables. Returns false when a global fixing
    /// contradicts the node's local state (the node is then fathomed).
    fn activate(&mut self, sub: &mut Sub) -> Result<bool> {
        // branching constraints generated by the rule enter the cut pool
        for con in std::mem::take(&mut sub.branch_cons) {
            let slot = self.cut_pool.insert(con)?;
            sub.slack_stat.push(SlackStat::Unknown);
            sub.actcon
                .as_mut()
                .ok_or_else(|| Error::new(ErrorKind::Active, "activation after release"))?
                .insert(slot);
        }

        let actvar = sub
            .actvar
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Active, "activation after release"))?;
        let vars = actvar.items();
        for (i, var) in vars.iter().enumerate() {
            if let Some(&global) = self.global_fs.get(&var.number()) {
                if sub.fs_var_stat[i].contradicts(global, sub.lb[i], sub.ub[i], self.tol.machine_eps)
                {
                    return Ok(false);
                }
                if !sub.fs_var_stat[i].fixed() {
                    sub.fs_var_stat[i] = global;
                }
            }
        }

        let cons = sub
            .actcon
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Active, "activation after release"))?
            .items();
        let prior = if sub.lp_var_stat.len() == vars.len() {
            Some(sub.lp_var_stat.as_slice())
        } else {
            None
        };
        let lp = LpSub::build(
            self.new_lp_solver(),
            self.sense,
            &cons,
            &vars,
            &sub.fs_var_stat,
            &sub.lb,
            &sub.ub,
            prior,
            self.config.eliminate_fixed_set,
        )?;
        sub.lp = Some(lp);
        Ok(true)
    }

    fn cutting_loop(&mut self, sub: &mut Sub) -> Result<NodeOutcome> {
        let mut method = if self.config.solve_approx {
            LpMethod::Approximate
        } else {
            LpMethod::Dual
        };
        loop {
            let solve_result = {
                let lp = sub.lp.as_mut().expect("LP present while processing");
                lp.solve(method)
            };
            let status = match solve_result {
                Ok(s) => s,
                Err(e) if e.kind() == ErrorKind::LpIf && method != LpMethod::Dual => {
                    self.out(
                        "requested LP method unavailable, falling back to the dual simplex",
                        crate::callback::OutputLevel::Full,
                    );
                    method = LpMethod::Dual;
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.n_lp += 1;
            if self.config.print_lp {
                let (n_row, n_col, value) = {
                    let lp = sub.lp.as_ref().expect("LP present while processing");
                    (lp.n_row(), lp.n_col(), lp.value())
                };
                self.out(
                    &format!(
                        "subproblem {}: LP with {} rows, {} columns, value {}",
                        sub.id, n_row, n_col, value
                    ),
                    crate::callback::OutputLevel::Full,
                );
            }

            match status {
                LpStatus::Optimal => {}
                LpStatus::Infeasible => {
                    if self.try_make_feasible(sub)? {
                        method = LpMethod::Primal;
                        continue;
                    }
                    self.fathom(sub);
                    return Ok(NodeOutcome::Fathomed);
                }
                other => {
                    return Err(Error::new(
                        ErrorKind::LpStatus,
                        format!("node LP finished with status {other:?}"),
                    ));
                }
            }

            let value = sub.lp.as_ref().expect("LP present").value();
            self.emit_lp_line(sub, value);

            // Without pricing the LP value is a valid dual bound right
            // away; with pricing it only becomes one once a pricing
            // round finds no improving variable (see below).
            if !self.pricing {
                self.settle_node_bound(sub, value);
                if self.primal_violated(sub.dual_bound) {
                    self.fathom(sub);
                    return Ok(NodeOutcome::Fathomed);
                }
            }

            if self.config.fix_set_by_red_cost {
                match self.fix_and_set_by_red_cost(sub)? {
                    FixSetOutcome::Contradiction => {
                        self.fathom(sub);
                        return Ok(NodeOutcome::Fathomed);
                    }
                    FixSetOutcome::Changed => {
                        method = LpMethod::Dual;
                        continue;
                    }
                    FixSetOutcome::Unchanged => {}
                }
            }

            let sol = self.snapshot(sub);
            if self.model.feasible(&sol) {
                if self.better_primal(value) {
                    self.update_primal_bound(value)?;
                    self.tree_log.paint_node(sub.id, 2);
                }
                self.fathom(sub);
                return Ok(NodeOutcome::Fathomed);
            }

            if let Some(improved) = self.model.improve(&sol) {
                if self.better_primal(improved) {
                    self.update_primal_bound(improved)?;
                }
                if self.primal_violated(sub.dual_bound) {
                    self.fathom(sub);
                    return Ok(NodeOutcome::Fathomed);
                }
            }

            sub.tailoff.update(value);
            sub.n_iterations += 1;
            let stalled = sub.tailoff.tail_off();

            if self.config.max_iterations >= 0
                && sub.n_iterations as i64 >= self.config.max_iterations
            {
                if self.delayed_branching(sub.n_opt) {
                    self.make_dormant(sub);
                    return Ok(NodeOutcome::Dormant);
                }
                return self.branch(sub);
            }

            let mut n_new = 0;
            if !stalled {
                if self.separation_due(sub) {
                    n_new += self.separate_round(sub, &sol)?;
                }
                let pricing_due = self.config.pricing_freq > 0
                    && sub.n_iterations % self.config.pricing_freq == 0;
                if n_new == 0 || pricing_due {
                    let n_vars = self.pricing_round(sub, &sol)?;
                    if n_vars > 0 {
                        sub.tailoff.reset();
                    }
                    n_new += n_vars;
                }
            }

            if n_new > 0 {
                self.eliminate_round(sub)?;
                let n_added = self.apply_buffered(sub)?;
                if n_added > 0 {
                    method = LpMethod::Dual;
                    continue;
                }
            }

            // nothing priced out, so the LP value is a valid bound now
            if self.pricing {
                self.settle_node_bound(sub, value);
                if self.primal_violated(sub.dual_bound) {
                    self.fathom(sub);
                    return Ok(NodeOutcome::Fathomed);
                }
            }

            return self.branch(sub);
        }
    }

    /// Folds a proven LP value into the node's monotone dual bound and
    /// the global bound.
    fn settle_node_bound(&mut self, sub: &mut Sub, value: E) {
        if self.better_node_bound(value, sub.dual_bound) {
            sub.dual_bound = value;
            if Some(sub.id) == self.root {
                self.root_dual_bound = value;
            }
        }
        self.refresh_dual_bound(Some(sub.dual_bound));
    }

    /// A snapshot of the current LP solution in the node's index space.
    fn snapshot(&self, sub: &Sub) -> LpSolution {
        let lp = sub.lp.as_ref().expect("LP present while processing");
        let vars = sub.actvar.as_ref().expect("active variables").items();
        let cons = sub.actcon.as_ref().expect("active constraints").items();
        let x = (0..lp.n_orig_cols()).map(|i| lp.x_val(i)).collect();
        let y = (0..lp.n_row()).map(|r| lp.y_val(r)).collect();
        LpSolution {
            value: lp.value(),
            x,
            y,
            vars,
            cons,
            tol: self.tol,
        }
    }

    /// Asks the model for variables that could restore feasibility and
    /// activates them. True if anything was added.
    fn try_make_feasible(&mut self, sub: &mut Sub) -> Result<bool> {
        let candidates = self.model.make_feasible();
        if candidates.is_empty() {
            return Ok(false);
        }
        for var in candidates {
            let slot = self.var_pool.insert(var)?;
            if sub.var_buffer.space() > 0 {
                sub.var_buffer.insert(slot)?;
            }
        }
        let added = self.apply_buffered(sub)?;
        sub.tailoff.reset();
        Ok(added > 0)
    }

    /// Fixes variables globally by reduced cost at the remaining-tree
    /// root and sets them locally elsewhere.
    fn fix_and_set_by_red_cost(&mut self, sub: &mut Sub) -> Result<FixSetOutcome> {
        let is_r_root = Some(sub.id) == self.r_root;
        let at_bound: Vec<(I, LpVarStat, E)> = {
            let lp = sub.lp.as_ref().expect("LP present while processing");
            (0..lp.n_orig_cols())
                .filter(|&i| !lp.eliminated(i) && !sub.fs_var_stat[i].fixed_or_set())
                .filter_map(|i| {
                    let stat = lp.lp_var_stat(i);
                    if stat.at_bound() {
                        lp.reco(i).map(|rc| (i, stat, rc))
                    } else {
                        None
                    }
                })
                .collect()
        };

        // the candidate set follows the remaining-tree root
        if is_r_root && self.fix_cand_root != Some(sub.id) {
            let actvar = sub.actvar.as_ref().expect("active variables");
            let saved: Vec<(PoolSlotRef<dyn Variable>, LpVarStat, E)> = at_bound
                .iter()
                .map(|&(i, stat, rc)| (actvar.slot_ref(i).clone(), stat, rc))
                .collect();
            self.fix_cand.save_candidates(&saved, self.sense, sub.dual_bound);
            self.fix_cand_root = Some(sub.id);
        }

        let mut changed = false;

        // candidates fixable against the tightened primal bound
        let fixings = self.fix_cand.fix_by_red_cost(
            self.sense,
            self.primal_bound,
            self.config.obj_integer,
            self.tol.eps,
        );
        for fixing in fixings {
            let Some(var) = fixing.slot.item() else {
                continue;
            };
            self.global_fs.insert(var.number(), fixing.status);
            self.n_fixed += 1;
            match self.apply_status_to_node(sub, var.as_ref(), fixing.status)? {
                Some(true) => changed = true,
                Some(false) => return Ok(FixSetOutcome::Contradiction),
                None => {
                    // inactive variable fixed to a nonzero value: queue
                    // it for activation through the variable pool
                    let held_nonzero = matches!(
                        fixing.status,
                        FsVarStat::FixedToUpperBound | FsVarStat::Fixed(_)
                    );
                    if held_nonzero && sub.var_buffer.space() > 0 {
                        sub.var_buffer.insert(fixing.slot.clone())?;
                        changed = true;
                    }
                }
            }
        }

        // local setting (global fixing at the remaining-tree root)
        for (i, stat, rc) in at_bound {
            let lhs = sub.dual_bound + rc.abs();
            let strong = match self.sense {
                Sense::Min => {
                    if self.config.obj_integer {
                        lhs > self.primal_bound - 1.0 + self.tol.eps
                    } else {
                        lhs > self.primal_bound - self.tol.eps
                    }
                }
                Sense::Max => {
                    let lhs = sub.dual_bound - rc.abs();
                    if self.config.obj_integer {
                        lhs < self.primal_bound + 1.0 - self.tol.eps
                    } else {
                        lhs < self.primal_bound + self.tol.eps
                    }
                }
            };
            if !strong {
                continue;
            }
            let status = match (stat, is_r_root) {
                (LpVarStat::AtLowerBound, true) => FsVarStat::FixedToLowerBound,
                (LpVarStat::AtUpperBound, true) => FsVarStat::FixedToUpperBound,
                (LpVarStat::AtLowerBound, false) => FsVarStat::SetToLowerBound,
                (LpVarStat::AtUpperBound, false) => FsVarStat::SetToUpperBound,
                _ => continue,
            };
            if sub.fs_var_stat[i].contradicts(status, sub.lb[i], sub.ub[i], self.tol.machine_eps) {
                return Ok(FixSetOutcome::Contradiction);
            }
            if sub.fs_var_stat[i] == status {
                continue;
            }
            sub.fs_var_stat[i] = status;
            if is_r_root {
                let var = sub.actvar.as_ref().expect("active variables").item(i);
                self.global_fs.insert(var.number(), status);
                self.n_fixed += 1;
            }
            let value = status
                .value(sub.lb[i], sub.ub[i])
                .expect("a set status holds a value");
            let lp = sub.lp.as_mut().expect("LP present while processing");
            lp.change_l_bound(i, value)?;
            lp.change_u_bound(i, value)?;
            changed = true;
        }

        if changed {
            Ok(FixSetOutcome::Changed)
        } else {
            Ok(FixSetOutcome::Unchanged)
        }
    }

    /// Applies a global fixing to the node if the variable is active.
    /// `Some(true)`: applied; `Some(false)`: contradiction; `None`: the
    /// variable is not active in this node.
    fn apply_status_to_node(
        &self,
        sub: &mut Sub,
        var: &dyn Variable,
        status: FsVarStat,
    ) -> Result<Option<bool>> {
        let actvar = sub.actvar.as_ref().expect("active variables");
        let pos = (0..actvar.number()).find(|&i| actvar.item(i).number() == var.number());
        let Some(i) = pos else {
            return Ok(None);
        };
        if sub.fs_var_stat[i].contradicts(status, sub.lb[i], sub.ub[i], self.tol.machine_eps) {
            return Ok(Some(false));
        }
        if sub.fs_var_stat[i] == status {
            return Ok(Some(true));
        }
        sub.fs_var_stat[i] = status;
        if let Some(v) = status.value(sub.lb[i], sub.ub[i]) {
            if let Some(lp) = sub.lp.as_mut() {
                if !lp.eliminated(i) {
                    lp.change_l_bound(i, v)?;
                    lp.change_u_bound(i, v)?;
                }
            }
        }
        Ok(Some(true))
    }

    fn separation_due(&self, sub: &Sub) -> bool {
        if !self.cutting {
            return false;
        }
        let k = self.config.skip_factor;
        if k <= 1 {
            return true;
        }
        match self.config.skipping_mode {
            crate::master::SkippingMode::SkipByNode => self.n_sub_selected % k == 0,
            crate::master::SkippingMode::SkipByLevel => sub.level % k == 0,
        }
    }

    /// One separation round: the model separator plus the cut pool.
    fn separate_round(&mut self, sub: &mut Sub, sol: &LpSolution) -> Result<I> {
        let mut n = 0;
        let mut distance_sum = 0.0;
        for con in self.model.separate(sol) {
            let violation = con.violation(&sol.vars, &sol.x).unwrap_or(0.0);
            distance_sum += con.distance(&sol.vars, &sol.x);
            let slot = self.cut_pool.insert(con)?;
            if sub.con_buffer.space() > 0 {
                sub.con_buffer.insert_ranked(slot, violation)?;
                n += 1;
            }
        }
        if self.config.show_average_cut_distance && n > 0 {
            self.out(
                &format!("average distance of the generated cuts: {}", distance_sum / n as E),
                crate::callback::OutputLevel::Full,
            );
        }
        n += self.cut_pool.separate(
            &sol.x,
            &sol.vars,
            self.sense,
            &mut sub.con_buffer,
            0.001,
            crate::pool::Ranking::Violation,
        );
        Ok(n)
    }

    /// One pricing round: the model pricer plus the variable pool.
    fn pricing_round(&mut self, sub: &mut Sub, sol: &LpSolution) -> Result<I> {
        if !self.pricing {
            return Ok(0);
        }
        let mut n = 0;
        for var in self.model.price(sol) {
            let rc = var.red_cost(&sol.cons, &sol.y);
            let slot = self.var_pool.insert(var)?;
            if sub.var_buffer.space() > 0 {
                sub.var_buffer.insert_ranked(slot, rc.abs())?;
                n += 1;
            }
        }
        n += self.var_pool.separate(
            &sol.y,
            &sol.cons,
            self.sense,
            &mut sub.var_buffer,
            self.tol.eps,
            crate::pool::Ranking::Violation,
        );
        Ok(n)
    }

    /// Removes constraints and variables flagged for elimination.
    fn eliminate_round(&mut self, sub: &mut Sub) -> Result<I> {
        let mut n_removed = 0;

        let rem_cons: Vec<I> = {
            let lp = sub.lp.as_ref().expect("LP present while processing");
            let actcon = sub.actcon.as_mut().expect("active constraints");
            let mut marked = Vec::new();
            for r in 0..actcon.number() {
                let eligible = match self.config.con_elim_mode {
                    ConElimMode::None => false,
                    ConElimMode::NonBinding => lp.slack(r).abs() > self.config.con_elim_eps,
                    ConElimMode::Basic => lp.slack_stat(r).basic(),
                };
                let dynamic = actcon.item(r).dynamic();
                if eligible && dynamic {
                    actcon.increment_age(r);
                    if actcon.redundant_age(r) >= self.config.con_elim_age {
                        marked.push(r);
                    }
                } else {
                    actcon.reset_age(r);
                }
            }
            marked
        };
        if !rem_cons.is_empty() {
            sub.lp
                .as_mut()
                .expect("LP present while processing")
                .remove_cons(&rem_cons)?;
            sub.actcon
                .as_mut()
                .expect("active constraints")
                .remove(&rem_cons);
            retain_by_index(&mut sub.slack_stat, &rem_cons);
            self.n_rem_cons += rem_cons.len();
            n_removed += rem_cons.len();
        }

        if self.config.var_elim_mode == VarElimMode::ReducedCost {
            let rem_vars: Vec<I> = {
                let lp = sub.lp.as_ref().expect("LP present while processing");
                let actvar = sub.actvar.as_mut().expect("active variables");
                let mut marked = Vec::new();
                for i in 0..actvar.number() {
                    let eligible = !lp.eliminated(i)
                        && !sub.fs_var_stat[i].fixed_or_set()
                        && lp.lp_var_stat(i).at_bound()
                        && lp.x_val(i).abs() < self.tol.machine_eps
                        && lp
                            .reco(i)
                            .map(|rc| rc.abs() > self.config.var_elim_eps)
                            .unwrap_or(false);
                    if eligible {
                        actvar.increment_age(i);
                        if actvar.redundant_age(i) >= self.config.var_elim_age {
                            marked.push(i);
                        }
                    } else {
                        actvar.reset_age(i);
                    }
                }
                marked
            };
            if !rem_vars.is_empty() {
                sub.lp
                    .as_mut()
                    .expect("LP present while processing")
                    .remove_vars(&rem_vars)?;
                sub.actvar
                    .as_mut()
                    .expect("active variables")
                    .remove(&rem_vars);
                retain_by_index(&mut sub.fs_var_stat, &rem_vars);
                retain_by_index(&mut sub.lp_var_stat, &rem_vars);
                retain_by_index(&mut sub.lb, &rem_vars);
                retain_by_index(&mut sub.ub, &rem_vars);
                self.n_rem_vars += rem_vars.len();
                n_removed += rem_vars.len();
            }
        }

        Ok(n_removed)
    }

    /// Drains the node buffers into the LP and the active sets, capped
    /// by the per-iteration addition limits.
    fn apply_buffered(&mut self, sub: &mut Sub) -> Result<I> {
        let mut n_added = 0;

        let con_refs = sub.con_buffer.extract(self.config.max_con_add);
        if !con_refs.is_empty() {
            let vars = sub.actvar.as_ref().expect("active variables").items();
            let actcon = sub.actcon.as_ref().expect("active constraints");
            let mut seen: Vec<*const _> = (0..actcon.number())
                .map(|r| std::rc::Rc::as_ptr(actcon.slot_ref(r).slot()))
                .collect();
            let mut rows = Vec::new();
            let mut live = Vec::new();
            for r in con_refs {
                // a slot may arrive twice (separator and pool scan) or
                // already sit in the active set
                let ptr = std::rc::Rc::as_ptr(r.slot());
                if seen.contains(&ptr) {
                    continue;
                }
                if let Some(con) = r.item() {
                    seen.push(ptr);
                    rows.push(con.gen_row(&vars));
                    live.push(r);
                }
            }
            if !rows.is_empty() {
                sub.lp
                    .as_mut()
                    .expect("LP present while processing")
                    .add_cons(&rows)?;
                let actcon = sub.actcon.as_mut().expect("active constraints");
                for r in live {
                    actcon.insert(r);
                    sub.slack_stat.push(SlackStat::Unknown);
                    n_added += 1;
                    self.n_add_cons += 1;
                }
            }
        }

        let var_refs = sub.var_buffer.extract(self.config.max_var_add);
        if !var_refs.is_empty() {
            let cons = sub.actcon.as_ref().expect("active constraints").items();
            let mut added_var = false;
            for r in var_refs {
                let Some(var) = r.item() else {
                    continue;
                };
                let actvar = sub.actvar.as_mut().expect("active variables");
                let already_active =
                    (0..actvar.number()).any(|i| actvar.item(i).equal(var.as_ref()));
                if already_active {
                    continue;
                }
                let status = self
                    .global_fs
                    .get(&var.number())
                    .copied()
                    .unwrap_or(FsVarStat::Free);
                let (lb, ub) = match status.value(var.lb(), var.ub()) {
                    Some(v) => (v, v),
                    None => (var.lb(), var.ub()),
                };
                let generated = var.gen_column(&cons);
                let mut support = Vec::with_capacity(generated.nnz());
                let mut coeff = Vec::with_capacity(generated.nnz());
                for (s, c) in generated.vec().iter() {
                    support.push(s);
                    coeff.push(c);
                }
                let col = Column::from_pairs(&support, &coeff, var.obj(), lb, ub);
                sub.lp
                    .as_mut()
                    .expect("LP present while processing")
                    .add_vars(&[var.clone()], &[col])?;
                actvar.insert(r);
                sub.fs_var_stat.push(status);
                sub.lp_var_stat.push(LpVarStat::Unknown);
                sub.lb.push(var.lb());
                sub.ub.push(var.ub());
                n_added += 1;
                self.n_add_vars += 1;
                added_var = true;
            }
            if added_var {
                sub.tailoff.reset();
            }
        }

        Ok(n_added)
    }

    /// Chooses a branching variable and creates the children.
    fn branch(&mut self, sub: &mut Sub) -> Result<NodeOutcome> {
        if sub.level + 1 > self.config.max_level {
            self.max_level_hit = true;
            self.fathom(sub);
            return Ok(NodeOutcome::Fathomed);
        }

        // a problem-specific rule factory takes precedence
        let sol = self.snapshot(sub);
        if let Some(rules) = self.model.branching_rules(&sol) {
            if rules.is_empty() {
                return Err(Error::new(
                    ErrorKind::BranchingRule,
                    "the branching-rule factory produced no rule",
                ));
            }
            sub.status = SubStatus::Processed;
            self.tree_log.paint_node(sub.id, 3);
            for rule in rules {
                self.create_child(sub, rule)?;
            }
            return Ok(NodeOutcome::Branched);
        }

        let (x, types, objs) = {
            let lp = sub.lp.as_ref().expect("LP present while processing");
            let vars = sub.actvar.as_ref().expect("active variables").items();
            let x: Vec<E> = (0..lp.n_orig_cols()).map(|i| lp.x_val(i)).collect();
            let types: Vec<_> = vars.iter().map(|v| v.var_type()).collect();
            let objs: Vec<E> = vars.iter().map(|v| v.obj()).collect();
            (x, types, objs)
        };
        let expensive = self.config.branching_strategy
            == crate::master::BranchingStrategy::CloseHalfExpensive;
        let candidates = close_half_candidates(
            &x,
            &types,
            &sub.fs_var_stat,
            &objs,
            self.tol.machine_eps,
            self.config.n_branching_candidates.max(1),
            expensive,
        );
        let Some(&first) = candidates.first() else {
            return Err(Error::new(
                ErrorKind::BranchingVariable,
                "no fractional variable to branch on",
            ));
        };
        let chosen = if candidates.len() > 1 && self.config.n_strong_branching_iterations > 0 {
            self.rank_branching_candidates(sub, &candidates, &x, &types)?
        } else {
            first
        };

        let rules: Vec<BranchRule> = if types[chosen].binary() {
            vec![
                BranchRule::from(SetBranch::to_upper(chosen)),
                BranchRule::from(SetBranch::to_lower(chosen)),
            ]
        } else {
            let floor = x[chosen].floor();
            vec![
                BranchRule::from(BoundBranch::new(chosen, floor + 1.0, sub.ub[chosen])),
                BranchRule::from(BoundBranch::new(chosen, sub.lb[chosen], floor)),
            ]
        };

        sub.status = SubStatus::Processed;
        self.tree_log.paint_node(sub.id, 3);
        for rule in rules {
            self.create_child(sub, rule)?;
        }
        Ok(NodeOutcome::Branched)
    }

    /// Evaluates the branching candidates by limited dual-simplex
    /// probes and returns the candidate whose weaker child keeps the
    /// best bound.
    fn rank_branching_candidates(
        &mut self,
        sub: &mut Sub,
        candidates: &[I],
        x: &[E],
        types: &[crate::varstat::VarType],
    ) -> Result<I> {
        let iterations = self.config.n_strong_branching_iterations;
        let lp = sub.lp.as_mut().expect("LP present while processing");
        lp.set_simplex_iteration_limit(iterations)?;
        let mut best: Option<(I, E)> = None;
        for &cand in candidates {
            let mut rules: Vec<BranchRule> = if types[cand].binary() {
                vec![
                    BranchRule::from(SetBranch::to_upper(cand)),
                    BranchRule::from(SetBranch::to_lower(cand)),
                ]
            } else {
                let floor = x[cand].floor();
                vec![
                    BranchRule::from(BoundBranch::new(cand, floor + 1.0, sub.ub[cand])),
                    BranchRule::from(BoundBranch::new(cand, sub.lb[cand], floor)),
                ]
            };
            let mut weakest: Option<E> = None;
            for rule in rules.iter_mut() {
                rule.extract_lp(lp)?;
                let probe = lp.solve(LpMethod::Dual);
                let value = match probe {
                    Ok(LpStatus::Optimal) | Ok(LpStatus::LimitReached) => lp.value(),
                    Ok(LpStatus::Infeasible) => {
                        if self.sense.min() {
                            self.tol.infinity
                        } else {
                            -self.tol.infinity
                        }
                    }
                    _ => sub.dual_bound,
                };
                rule.unextract_lp(lp)?;
                weakest = Some(match weakest {
                    None => value,
                    Some(w) => {
                        if self.sense.min() {
                            w.min(value)
                        } else {
                            w.max(value)
                        }
                    }
                });
            }
            let score = weakest.unwrap_or(sub.dual_bound);
            let better = match best {
                None => true,
                Some((_, s)) => {
                    if self.sense.min() {
                        score > s
                    } else {
                        score < s
                    }
                }
            };
            if better {
                best = Some((cand, score));
            }
        }
        lp.set_simplex_iteration_limit(I::MAX)?;
        Ok(best.map(|(c, _)| c).unwrap_or(candidates[0]))
    }

    /// Creates a child under `rule`; a rule contradicting the node's
    /// state produces no child (its region is empty).
    fn create_child(&mut self, parent: &mut Sub, rule: BranchRule) -> Result<Option<I>> {
        let mut fs = parent.fs_var_stat.clone();
        let mut lb = parent.lb.clone();
        let mut ub = parent.ub.clone();
        let mut branch_cons = Vec::new();
        {
            let mut ctx = BranchContext {
                fs_var_stat: &mut fs,
                lb: &mut lb,
                ub: &mut ub,
                branch_cons: &mut branch_cons,
                machine_eps: self.tol.machine_eps,
            };
            match rule.extract(&mut ctx) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::FixSet => return Ok(None),
                Err(e) => return Err(e),
            }
        }

        let id = self.subs.len();
        let child = Sub {
            id,
            level: parent.level + 1,
            parent: Some(parent.id),
            children: Vec::new(),
            status: SubStatus::Unprocessed,
            actcon: parent.actcon.clone(),
            actvar: parent.actvar.clone(),
            fs_var_stat: fs,
            lp_var_stat: parent.lp_var_stat.clone(),
            slack_stat: parent.slack_stat.clone(),
            lb,
            ub,
            dual_bound: parent.dual_bound,
            branch_rule: Some(rule),
            branch_cons,
            tailoff: TailOff::new(self.config.tailoff_n_lps, self.config.tailoff_percent),
            n_iterations: 0,
            n_opt: 0,
            dormant_rounds: 0,
            lp: None,
            con_buffer: CutBuffer::new(self.config.max_con_buffered),
            var_buffer: CutBuffer::new(self.config.max_var_buffered),
        };
        let child_bound = child.dual_bound;
        parent.children.push(id);
        self.subs.push(Some(child));
        self.n_sub += 1;
        if parent.level + 1 > self.highest_level {
            self.highest_level = parent.level + 1;
        }
        self.open_subs.insert(id, child_bound);
        self.tree_log.new_node(parent.id, id, 5);
        Ok(Some(id))
    }

    /// Closes a node: every pool reference is released and the node
    /// leaves the open set for good.
    pub(crate) fn fathom(&mut self, sub: &mut Sub) {
        sub.status = SubStatus::Fathomed;
        sub.release();
        self.open_subs.remove(sub.id);
        self.tree_log.paint_node(sub.id, 1);
    }

    fn make_dormant(&mut self, sub: &mut Sub) {
        sub.status = SubStatus::Dormant;
        sub.dormant_rounds += 1;
        sub.lp = None;
        self.open_subs.insert_dormant(sub.id, sub.dual_bound);
        self.tree_log.paint_node(sub.id, 6);
    }

    /// True if `candidate` is a better node bound than `current`.
    fn better_node_bound(&self, candidate: E, current: E) -> bool {
        match self.sense {
            Sense::Min => candidate > current,
            Sense::Max => candidate < current,
        }
    }

    fn emit_lp_line(&mut self, sub: &Sub, value: E) {
        let event = crate::callback::SearchEvent::LpSolved {
            id: sub.id,
            n_iter: sub.n_iterations,
            value,
            dual_bound: self.dual_bound,
            primal_bound: self.primal_bound,
        };
        self.callback.on_event(&event);
    }
}

/// Removes the positions `del` (ascending) from `v`.
pub(crate) fn retain_by_index<T>(v: &mut Vec<T>, del: &[I]) {
    let mut keep = vec![true; v.len()];
    for &i in del {
        keep[i] = false;
    }
    let mut k = 0;
    v.retain(|_| {
        k += 1;
        keep[k - 1]
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_by_index_removes_positions() {
        let mut v = vec![10, 20, 30, 40];
        retain_by_index(&mut v, &[1, 3]);
        assert_eq!(v, vec![10, 30]);
    }

    #[test]
    fn status_default_is_unprocessed() {
        assert_eq!(SubStatus::default(), SubStatus::Unprocessed);
    }
}
