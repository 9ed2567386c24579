//! The bundled LP engine: a bounded-variable two-phase primal simplex
//! on dense storage.
//!
//! One slack column is appended per row (its bounds follow the row
//! sense); rows whose slack cannot absorb the initial residual receive
//! an artificial column that phase 1 drives to zero. The basis is
//! refactorized from scratch at every iteration, and both the entering
//! and the leaving variable follow Bland's rule, so the iteration cannot
//! cycle.
//!
//! Method routing: `dual_simplex` runs the same primal core (a cold
//! solve reaches the same optimum; warm-started dual pivoting is a
//! backend refinement this engine does not carry). `barrier` and
//! `approximate` report an unsupported method.

use faer::Mat;

use crate::error::{Error, Result};
use crate::linalg::DenseLu;
use crate::lp::{LpSolver, LpStatus, SolStat, unsupported_method};
use crate::sparse::{Column, ConSense, Row};
use crate::varstat::{LpVarStat, SlackStat};
use crate::{E, I, Sense, Tol};

const DUAL_TOL: E = 1.0e-7;
const FEAS_TOL: E = 1.0e-7;
const RATIO_TOL: E = 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarState {
    Basic,
    AtLower,
    AtUpper,
    FreeZero,
}

pub struct DenseSimplex {
    tol: Tol,
    sense: Sense,
    /// Dense structural coefficients, `rows[i][j]`.
    rows: Vec<Vec<E>>,
    row_sense: Vec<ConSense>,
    rhs: Vec<E>,
    obj: Vec<E>,
    lb: Vec<E>,
    ub: Vec<E>,
    max_row: I,
    max_col: I,
    iter_limit: Option<I>,
    n_opt: I,
    status: LpStatus,
    value: E,
    x: Vec<E>,
    reco: Vec<E>,
    y: Vec<E>,
    slack: Vec<E>,
    vstat: Vec<LpVarStat>,
    sstat: Vec<SlackStat>,
    sol: SolStat,
}

impl DenseSimplex {
    pub fn new(tol: Tol) -> Self {
        Self {
            tol,
            sense: Sense::Min,
            rows: Vec::new(),
            row_sense: Vec::new(),
            rhs: Vec::new(),
            obj: Vec::new(),
            lb: Vec::new(),
            ub: Vec::new(),
            max_row: 0,
            max_col: 0,
            iter_limit: None,
            n_opt: 0,
            status: LpStatus::Unoptimized,
            value: 0.0,
            x: Vec::new(),
            reco: Vec::new(),
            y: Vec::new(),
            slack: Vec::new(),
            vstat: Vec::new(),
            sstat: Vec::new(),
            sol: SolStat::Missing,
        }
    }

    fn invalidate(&mut self) {
        self.status = LpStatus::Unoptimized;
        self.sol = SolStat::Missing;
    }

    fn finite_lb(&self, v: E) -> bool {
        !self.tol.is_minus_infinity(v)
    }

    fn finite_ub(&self, v: E) -> bool {
        !self.tol.is_infinity(v)
    }

    /// The entry of working column `var` in `row`. Columns are ordered
    /// structural, slack, artificial.
    fn col_entry(rows: &[Vec<E>], n: I, m: I, art: &[(I, E)], var: I, row: I) -> E {
        if var < n {
            rows[row][var]
        } else if var < n + m {
            if var - n == row { 1.0 } else { 0.0 }
        } else {
            let (r, sign) = art[var - n - m];
            if r == row { sign } else { 0.0 }
        }
    }

    /// `cost[var] - y^T a_var` for the working column `var`.
    fn priced_cost(
        rows: &[Vec<E>],
        n: I,
        m: I,
        art: &[(I, E)],
        y: &[E],
        cost: E,
        var: I,
    ) -> E {
        let mut d = cost;
        if var < n {
            for i in 0..m {
                let a = rows[i][var];
                if a != 0.0 {
                    d -= y[i] * a;
                }
            }
        } else if var < n + m {
            d -= y[var - n];
        } else {
            let (r, sign) = art[var - n - m];
            d -= y[r] * sign;
        }
        d
    }

    fn solve_core(&mut self) -> Result<LpStatus> {
        let m = self.rows.len();
        let n = self.obj.len();
        if n == 0 {
            return Err(Error::lp("solve called on a linear program without columns"));
        }
        self.n_opt += 1;
        let inf = self.tol.infinity;
        let min_sign = if self.sense.max() { -1.0 } else { 1.0 };

        let nt = n + m;
        let mut c = vec![0.0; nt];
        let mut l = vec![0.0; nt];
        let mut u = vec![0.0; nt];
        for j in 0..n {
            c[j] = min_sign * self.obj[j];
            l[j] = self.lb[j];
            u[j] = self.ub[j];
        }
        for i in 0..m {
            match self.row_sense[i] {
                ConSense::Less => {
                    l[nt - m + i] = 0.0;
                    u[nt - m + i] = inf;
                }
                ConSense::Greater => {
                    l[n + i] = -inf;
                    u[n + i] = 0.0;
                }
                ConSense::Equal => {
                    l[n + i] = 0.0;
                    u[n + i] = 0.0;
                }
            }
        }

        let mut state = vec![VarState::AtLower; nt];
        let mut x = vec![0.0; nt];
        for j in 0..n {
            if self.finite_lb(l[j]) {
                state[j] = VarState::AtLower;
                x[j] = l[j];
            } else if self.finite_ub(u[j]) {
                state[j] = VarState::AtUpper;
                x[j] = u[j];
            } else {
                state[j] = VarState::FreeZero;
                x[j] = 0.0;
            }
        }

        // Start from the slack basis; rows whose residual the slack
        // cannot absorb get an artificial column instead.
        let mut resid = self.rhs.clone();
        for j in 0..n {
            if x[j] != 0.0 {
                for i in 0..m {
                    resid[i] -= self.rows[i][j] * x[j];
                }
            }
        }
        let mut basis: Vec<I> = (n..nt).collect();
        let mut art: Vec<(I, E)> = Vec::new();
        for i in 0..m {
            let s = resid[i];
            if s >= l[n + i] - FEAS_TOL && s <= u[n + i] + FEAS_TOL {
                x[n + i] = s;
                state[n + i] = VarState::Basic;
            } else {
                let clamped = if s < l[n + i] { l[n + i] } else { u[n + i] };
                x[n + i] = clamped;
                state[n + i] = if s < l[n + i] {
                    VarState::AtLower
                } else {
                    VarState::AtUpper
                };
                let r = s - clamped;
                let sign = if r > 0.0 { 1.0 } else { -1.0 };
                art.push((i, sign));
                basis[i] = nt + art.len() - 1;
                x.push(r.abs());
                state.push(VarState::Basic);
                c.push(0.0);
                l.push(0.0);
                u.push(inf);
            }
        }
        let total = nt + art.len();
        let mut phase = if art.is_empty() { 2 } else { 1 };
        let mut iters: I = 0;

        loop {
            let bmat = Mat::from_fn(m, m, |i, j| {
                Self::col_entry(&self.rows, n, m, &art, basis[j], i)
            });
            let lu = DenseLu::factorize(&bmat)
                .map_err(|e| Error::lp(format!("basis factorization failed: {e}")))?;

            let mut rhs_vec = self.rhs.clone();
            for j in 0..total {
                if state[j] != VarState::Basic && x[j] != 0.0 {
                    for i in 0..m {
                        let a = Self::col_entry(&self.rows, n, m, &art, j, i);
                        if a != 0.0 {
                            rhs_vec[i] -= a * x[j];
                        }
                    }
                }
            }
            let xb = lu.solve(&rhs_vec);
            for (i, &k) in basis.iter().enumerate() {
                x[k] = xb[i];
            }

            let phase_cost = |j: I| -> E {
                if phase == 1 {
                    if j >= nt { 1.0 } else { 0.0 }
                } else {
                    c[j]
                }
            };
            let cb: Vec<E> = basis.iter().map(|&k| phase_cost(k)).collect();
            let y = lu.solve_transposed(&cb);

            // Entering variable, Bland's rule: the first eligible index.
            let mut entering: Option<(I, E)> = None;
            for j in 0..total {
                if state[j] == VarState::Basic || u[j] - l[j] < RATIO_TOL {
                    continue;
                }
                let d = Self::priced_cost(&self.rows, n, m, &art, &y, phase_cost(j), j);
                let dir = match state[j] {
                    VarState::AtLower if d < -DUAL_TOL => 1.0,
                    VarState::AtUpper if d > DUAL_TOL => -1.0,
                    VarState::FreeZero if d < -DUAL_TOL => 1.0,
                    VarState::FreeZero if d > DUAL_TOL => -1.0,
                    _ => continue,
                };
                entering = Some((j, dir));
                break;
            }

            let Some((j_in, dir)) = entering else {
                if phase == 1 {
                    let infeas: E = (nt..total).map(|k| x[k].abs()).sum();
                    if infeas > FEAS_TOL {
                        self.status = LpStatus::Infeasible;
                        self.value = min_sign * inf;
                        self.sol = SolStat::Missing;
                        return Ok(LpStatus::Infeasible);
                    }
                    for k in nt..total {
                        u[k] = 0.0;
                    }
                    phase = 2;
                    continue;
                }
                self.extract(LpStatus::Optimal, n, m, &x, &y, &state, min_sign, &art);
                return Ok(LpStatus::Optimal);
            };

            let colj: Vec<E> = (0..m)
                .map(|i| Self::col_entry(&self.rows, n, m, &art, j_in, i))
                .collect();
            let w = lu.solve(&colj);

            // Ratio test, first pass: the step length.
            let mut t_min = if self.finite_lb(l[j_in]) && self.finite_ub(u[j_in]) {
                u[j_in] - l[j_in]
            } else {
                E::INFINITY
            };
            for i in 0..m {
                let k = basis[i];
                let delta = -dir * w[i];
                if delta < -RATIO_TOL {
                    if self.finite_lb(l[k]) {
                        t_min = t_min.min((x[k] - l[k]) / (-delta));
                    }
                } else if delta > RATIO_TOL && self.finite_ub(u[k]) {
                    t_min = t_min.min((u[k] - x[k]) / delta);
                }
            }
            if t_min.is_infinite() {
                if phase == 1 {
                    return Err(Error::lp("unbounded direction in feasibility phase"));
                }
                self.status = LpStatus::Unbounded;
                self.value = -min_sign * inf;
                self.sol = SolStat::Missing;
                return Ok(LpStatus::Unbounded);
            }
            let t = t_min.max(0.0);

            // Second pass: the leaving variable, smallest index among the
            // blockers at the minimum ratio.
            let mut leave: Option<(I, VarState)> = None;
            let mut leave_var = I::MAX;
            for i in 0..m {
                let k = basis[i];
                let delta = -dir * w[i];
                if delta < -RATIO_TOL && self.finite_lb(l[k]) {
                    let cap = (x[k] - l[k]) / (-delta);
                    if cap <= t + RATIO_TOL && k < leave_var {
                        leave = Some((i, VarState::AtLower));
                        leave_var = k;
                    }
                } else if delta > RATIO_TOL && self.finite_ub(u[k]) {
                    let cap = (u[k] - x[k]) / delta;
                    if cap <= t + RATIO_TOL && k < leave_var {
                        leave = Some((i, VarState::AtUpper));
                        leave_var = k;
                    }
                }
            }

            x[j_in] += dir * t;
            for i in 0..m {
                let k = basis[i];
                x[k] -= dir * w[i] * t;
            }
            match leave {
                None => {
                    // Bound-to-bound flip of the entering variable.
                    state[j_in] = if dir > 0.0 {
                        VarState::AtUpper
                    } else {
                        VarState::AtLower
                    };
                    x[j_in] = if dir > 0.0 { u[j_in] } else { l[j_in] };
                }
                Some((r, hit)) => {
                    let k_out = basis[r];
                    state[k_out] = hit;
                    x[k_out] = if hit == VarState::AtLower {
                        l[k_out]
                    } else {
                        u[k_out]
                    };
                    basis[r] = j_in;
                    state[j_in] = VarState::Basic;
                }
            }

            iters += 1;
            if let Some(limit) = self.iter_limit {
                if iters >= limit {
                    if phase == 2 {
                        let cb: Vec<E> = basis.iter().map(|&k| c[k]).collect();
                        let bmat = Mat::from_fn(m, m, |i, j| {
                            Self::col_entry(&self.rows, n, m, &art, basis[j], i)
                        });
                        if let Ok(lu) = DenseLu::factorize(&bmat) {
                            let y = lu.solve_transposed(&cb);
                            self.extract(LpStatus::LimitReached, n, m, &x, &y, &state, min_sign, &art);
                            return Ok(LpStatus::LimitReached);
                        }
                    }
                    self.status = LpStatus::LimitReached;
                    self.value = min_sign * inf;
                    self.sol = SolStat::Missing;
                    return Ok(LpStatus::LimitReached);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn extract(
        &mut self,
        status: LpStatus,
        n: I,
        m: I,
        x: &[E],
        y: &[E],
        state: &[VarState],
        min_sign: E,
        art: &[(I, E)],
    ) {
        self.status = status;
        self.x = x[..n].to_vec();
        self.slack = x[n..n + m].to_vec();
        self.value = (0..n).map(|j| self.obj[j] * x[j]).sum();
        self.y = y.iter().map(|v| min_sign * v).collect();
        self.reco = (0..n)
            .map(|j| {
                if state[j] == VarState::Basic {
                    0.0
                } else {
                    let d = Self::priced_cost(
                        &self.rows,
                        n,
                        m,
                        art,
                        y,
                        min_sign * self.obj[j],
                        j,
                    );
                    min_sign * d
                }
            })
            .collect();
        self.vstat = state[..n]
            .iter()
            .map(|s| match s {
                VarState::Basic => LpVarStat::Basic,
                VarState::AtLower => LpVarStat::AtLowerBound,
                VarState::AtUpper => LpVarStat::AtUpperBound,
                VarState::FreeZero => LpVarStat::NonBasicFree,
            })
            .collect();
        self.sstat = state[n..n + m]
            .iter()
            .map(|s| match s {
                VarState::Basic => SlackStat::Basic,
                _ => SlackStat::NonBasicZero,
            })
            .collect();
        self.sol = SolStat::Available;
    }
}

impl LpSolver for DenseSimplex {
    fn initialize(
        &mut self,
        sense: Sense,
        n_row: I,
        max_row: I,
        n_col: I,
        max_col: I,
        obj: &[E],
        lb: &[E],
        ub: &[E],
        rows: &[Row],
    ) -> Result<()> {
        if obj.len() != n_col || lb.len() != n_col || ub.len() != n_col || rows.len() != n_row {
            return Err(Error::lp("initialize: inconsistent dimensions"));
        }
        self.sense = sense;
        self.obj = obj.to_vec();
        self.lb = lb.to_vec();
        self.ub = ub.to_vec();
        self.max_row = max_row.max(n_row);
        self.max_col = max_col.max(n_col);
        self.rows = Vec::with_capacity(n_row);
        self.row_sense = Vec::with_capacity(n_row);
        self.rhs = Vec::with_capacity(n_row);
        for row in rows {
            let mut dense = vec![0.0; n_col];
            for (s, v) in row.vec().iter() {
                if s >= n_col {
                    return Err(Error::lp("initialize: row support out of range"));
                }
                dense[s] = v;
            }
            self.rows.push(dense);
            self.row_sense.push(row.sense());
            self.rhs.push(row.rhs());
        }
        self.invalidate();
        Ok(())
    }

    fn load_basis(&mut self, var_stat: &[LpVarStat], slack_stat: &[SlackStat]) -> Result<()> {
        // The engine restarts cold on every solve; an offered basis is
        // accepted and only validated for shape.
        if var_stat.len() != self.obj.len() || slack_stat.len() != self.rows.len() {
            return Err(Error::lp("load_basis: inconsistent dimensions"));
        }
        Ok(())
    }

    fn sense(&self) -> Sense {
        self.sense
    }

    fn n_row(&self) -> I {
        self.rows.len()
    }

    fn max_row(&self) -> I {
        self.max_row
    }

    fn n_col(&self) -> I {
        self.obj.len()
    }

    fn max_col(&self) -> I {
        self.max_col
    }

    fn nnz(&self) -> I {
        self.rows
            .iter()
            .map(|r| r.iter().filter(|&&v| v != 0.0).count())
            .sum()
    }

    fn obj(&self, i: I) -> E {
        self.obj[i]
    }

    fn l_bound(&self, i: I) -> E {
        self.lb[i]
    }

    fn u_bound(&self, i: I) -> E {
        self.ub[i]
    }

    fn rhs(&self, i: I) -> E {
        self.rhs[i]
    }

    fn row(&self, i: I) -> Row {
        let mut row = Row::new(
            self.rows[i].iter().filter(|&&v| v != 0.0).count(),
            self.row_sense[i],
            self.rhs[i],
        );
        for (j, &v) in self.rows[i].iter().enumerate() {
            if v != 0.0 {
                row.insert(j, v);
            }
        }
        row
    }

    fn primal_simplex(&mut self) -> Result<LpStatus> {
        self.solve_core()
    }

    fn dual_simplex(&mut self) -> Result<LpStatus> {
        self.solve_core()
    }

    fn barrier(&mut self, _crossover: bool) -> Result<LpStatus> {
        Err(unsupported_method("DenseSimplex", "barrier"))
    }

    fn approximate(&mut self) -> Result<LpStatus> {
        Err(unsupported_method("DenseSimplex", "approximate"))
    }

    fn status(&self) -> LpStatus {
        self.status
    }

    fn n_opt(&self) -> I {
        self.n_opt
    }

    fn value(&self) -> E {
        self.value
    }

    fn x_val(&self, i: I) -> E {
        self.x[i]
    }

    fn reco(&self, i: I) -> E {
        self.reco[i]
    }

    fn y_val(&self, i: I) -> E {
        self.y[i]
    }

    fn slack(&self, i: I) -> E {
        self.slack[i]
    }

    fn lp_var_stat(&self, i: I) -> LpVarStat {
        self.vstat[i]
    }

    fn slack_stat(&self, i: I) -> SlackStat {
        self.sstat[i]
    }

    fn x_status(&self) -> SolStat {
        self.sol
    }

    fn reco_status(&self) -> SolStat {
        self.sol
    }

    fn y_status(&self) -> SolStat {
        self.sol
    }

    fn slack_status(&self) -> SolStat {
        self.sol
    }

    fn basis_status(&self) -> SolStat {
        self.sol
    }

    fn add_rows(&mut self, rows: &[Row]) -> Result<()> {
        let n_col = self.obj.len();
        for row in rows {
            let mut dense = vec![0.0; n_col];
            for (s, v) in row.vec().iter() {
                if s >= n_col {
                    return Err(Error::lp("add_rows: row support out of range"));
                }
                dense[s] = v;
            }
            self.rows.push(dense);
            self.row_sense.push(row.sense());
            self.rhs.push(row.rhs());
        }
        self.max_row = self.max_row.max(self.rows.len());
        self.invalidate();
        Ok(())
    }

    fn rem_rows(&mut self, ind: &[I]) -> Result<()> {
        let m = self.rows.len();
        let mut keep = vec![true; m];
        for &i in ind {
            if i >= m {
                return Err(Error::lp("rem_rows: index out of range"));
            }
            keep[i] = false;
        }
        let mut k = 0;
        self.rows.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        k = 0;
        self.row_sense.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        k = 0;
        self.rhs.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        self.invalidate();
        Ok(())
    }

    fn add_cols(&mut self, cols: &[Column]) -> Result<()> {
        let m = self.rows.len();
        for col in cols {
            self.obj.push(col.obj());
            self.lb.push(col.lb());
            self.ub.push(col.ub());
            for row in self.rows.iter_mut() {
                row.push(0.0);
            }
            let j = self.obj.len() - 1;
            for (i, v) in col.vec().iter() {
                if i >= m {
                    return Err(Error::lp("add_cols: column support out of range"));
                }
                self.rows[i][j] = v;
            }
        }
        self.max_col = self.max_col.max(self.obj.len());
        self.invalidate();
        Ok(())
    }

    fn rem_cols(&mut self, ind: &[I]) -> Result<()> {
        let n = self.obj.len();
        let mut keep = vec![true; n];
        for &j in ind {
            if j >= n {
                return Err(Error::lp("rem_cols: index out of range"));
            }
            keep[j] = false;
        }
        let mut k = 0;
        self.obj.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        k = 0;
        self.lb.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        k = 0;
        self.ub.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        for row in self.rows.iter_mut() {
            let mut k = 0;
            row.retain(|_| {
                k += 1;
                keep[k - 1]
            });
        }
        self.invalidate();
        Ok(())
    }

    fn change_rhs(&mut self, rhs: &[E]) -> Result<()> {
        if rhs.len() != self.rhs.len() {
            return Err(Error::lp("change_rhs: inconsistent dimension"));
        }
        self.rhs.copy_from_slice(rhs);
        self.invalidate();
        Ok(())
    }

    fn change_l_bound(&mut self, i: I, lb: E) -> Result<()> {
        if i >= self.lb.len() {
            return Err(Error::lp("change_l_bound: index out of range"));
        }
        self.lb[i] = lb;
        self.invalidate();
        Ok(())
    }

    fn change_u_bound(&mut self, i: I, ub: E) -> Result<()> {
        if i >= self.ub.len() {
            return Err(Error::lp("change_u_bound: index out of range"));
        }
        self.ub[i] = ub;
        self.invalidate();
        Ok(())
    }

    fn set_simplex_iteration_limit(&mut self, limit: I) -> Result<()> {
        self.iter_limit = Some(limit);
        Ok(())
    }

    fn simplex_iteration_limit(&self) -> Result<I> {
        self.iter_limit
            .ok_or_else(|| Error::lp("no iteration limit set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const INF: E = 1.0e32;

    fn engine() -> DenseSimplex {
        DenseSimplex::new(Tol::default())
    }

    fn load(
        lp: &mut DenseSimplex,
        sense: Sense,
        obj: &[E],
        lb: &[E],
        ub: &[E],
        rows: &[Row],
    ) {
        lp.initialize(sense, rows.len(), rows.len(), obj.len(), obj.len(), obj, lb, ub, rows)
            .unwrap();
    }

    #[test]
    fn single_variable_without_constraints() {
        let mut lp = engine();
        load(&mut lp, Sense::Min, &[1.0], &[0.0], &[10.0], &[]);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        assert_eq!(lp.value(), 0.0);
        assert_eq!(lp.x_val(0), 0.0);
        assert_eq!(lp.lp_var_stat(0), LpVarStat::AtLowerBound);
    }

    #[test]
    fn maximization_uses_the_upper_bounds() {
        let mut lp = engine();
        // max 2x + y  s.t.  x + y <= 3,  x in [0,2], y in [0,2]
        let rows = [Row::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Less, 3.0)];
        load(&mut lp, Sense::Max, &[2.0, 1.0], &[0.0, 0.0], &[2.0, 2.0], &rows);
        assert_eq!(lp.dual_simplex().unwrap(), LpStatus::Optimal);
        assert!((lp.value() - 5.0).abs() < 1.0e-9);
        assert!((lp.x_val(0) - 2.0).abs() < 1.0e-9);
        assert!((lp.x_val(1) - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn equality_row_needs_phase_one() {
        let mut lp = engine();
        // min x + y  s.t.  x + y = 2
        let rows = [Row::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Equal, 2.0)];
        load(&mut lp, Sense::Min, &[1.0, 1.0], &[0.0, 0.0], &[5.0, 5.0], &rows);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        assert!((lp.value() - 2.0).abs() < 1.0e-9);
    }

    #[test]
    fn greater_row_duals() {
        let mut lp = engine();
        // min x  s.t.  x >= 2, x in [0,10]
        let rows = [Row::from_pairs(&[0], &[1.0], ConSense::Greater, 2.0)];
        load(&mut lp, Sense::Min, &[1.0], &[0.0], &[10.0], &rows);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        assert!((lp.value() - 2.0).abs() < 1.0e-9);
        assert!((lp.x_val(0) - 2.0).abs() < 1.0e-9);
        assert!((lp.y_val(0) - 1.0).abs() < 1.0e-9);
        assert!((lp.slack(0)).abs() < 1.0e-9);
    }

    #[test]
    fn infeasible_bounds_are_detected() {
        let mut lp = engine();
        // x <= -1 with x in [0,1]
        let rows = [Row::from_pairs(&[0], &[1.0], ConSense::Less, -1.0)];
        load(&mut lp, Sense::Min, &[1.0], &[0.0], &[1.0], &rows);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Infeasible);
        assert!(lp.infeasible());
        assert_eq!(lp.x_status(), SolStat::Missing);
    }

    #[test]
    fn unbounded_direction_is_detected() {
        let mut lp = engine();
        load(&mut lp, Sense::Min, &[-1.0], &[0.0], &[INF], &[]);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Unbounded);
    }

    #[test]
    fn empty_lp_is_an_error() {
        let mut lp = engine();
        load(&mut lp, Sense::Min, &[], &[], &[], &[]);
        let err = lp.primal_simplex().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lp);
    }

    #[test]
    fn barrier_reports_unsupported() {
        let mut lp = engine();
        load(&mut lp, Sense::Min, &[1.0], &[0.0], &[1.0], &[]);
        assert_eq!(
            lp.barrier(true).unwrap_err().kind(),
            ErrorKind::LpIf
        );
    }

    #[test]
    fn reduced_costs_at_the_upper_bound() {
        let mut lp = engine();
        // max x with x in [0,1]: optimal at the upper bound, positive
        // reduced cost under the maximization convention.
        load(&mut lp, Sense::Max, &[1.0], &[0.0], &[1.0], &[]);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        assert_eq!(lp.lp_var_stat(0), LpVarStat::AtUpperBound);
        assert!((lp.reco(0) - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn fractional_relaxation_of_a_knapsack() {
        let mut lp = engine();
        // max 3x0 + 2x1 + x2  s.t.  2x0 + x1 + x2 <= 2, x binary-relaxed
        let rows = [Row::from_pairs(&[0, 1, 2], &[2.0, 1.0, 1.0], ConSense::Less, 2.0)];
        load(
            &mut lp,
            Sense::Max,
            &[3.0, 2.0, 1.0],
            &[0.0, 0.0, 0.0],
            &[1.0, 1.0, 1.0],
            &rows,
        );
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        // x1 = 1, then x0 = 0.5: value 3.5
        assert!((lp.value() - 3.5).abs() < 1.0e-9);
        assert!((lp.x_val(1) - 1.0).abs() < 1.0e-9);
        assert!((lp.x_val(0) - 0.5).abs() < 1.0e-9);
    }

    #[test]
    fn mutators_invalidate_the_solution() {
        let mut lp = engine();
        let rows = [Row::from_pairs(&[0], &[1.0], ConSense::Less, 1.0)];
        load(&mut lp, Sense::Min, &[1.0], &[0.0], &[2.0], &rows);
        lp.primal_simplex().unwrap();
        assert_eq!(lp.status(), LpStatus::Optimal);
        lp.change_u_bound(0, 1.5).unwrap();
        assert_eq!(lp.status(), LpStatus::Unoptimized);
        assert_eq!(lp.x_status(), SolStat::Missing);
        assert_eq!(lp.n_row(), 1);
        assert_eq!(lp.n_col(), 1);
    }

    #[test]
    fn add_and_remove_rows_and_cols() {
        let mut lp = engine();
        let rows = [Row::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Less, 2.0)];
        load(&mut lp, Sense::Max, &[1.0, 1.0], &[0.0, 0.0], &[2.0, 2.0], &rows);
        lp.add_rows(&[Row::from_pairs(&[0], &[1.0], ConSense::Less, 1.0)])
            .unwrap();
        assert_eq!(lp.n_row(), 2);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        assert!((lp.value() - 2.0).abs() < 1.0e-9);
        lp.rem_rows(&[1]).unwrap();
        assert_eq!(lp.n_row(), 1);
        lp.add_cols(&[Column::from_pairs(&[0], &[1.0], 5.0, 0.0, 1.0)])
            .unwrap();
        assert_eq!(lp.n_col(), 3);
        assert_eq!(lp.primal_simplex().unwrap(), LpStatus::Optimal);
        // the new column dominates: x2 = 1, remaining capacity to x0/x1
        assert!((lp.value() - 6.0).abs() < 1.0e-9);
        lp.rem_cols(&[2]).unwrap();
        assert_eq!(lp.n_col(), 2);
        let r = lp.row(0);
        assert_eq!(r.nnz(), 2);
    }
}
