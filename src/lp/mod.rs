//! The LP-solver capability.
//!
//! The framework talks to a linear-programming engine exclusively
//! through the [`LpSolver`] trait: load, modify, solve, query. The
//! concrete engine is chosen once by the master and passed down to every
//! node. A backend need not support every solution method; unsupported
//! methods fail with an explicit [`LpIf`](crate::error::ErrorKind::LpIf)
//! kind.
//!
//! [`DenseSimplex`] is the bundled engine: a bounded-variable two-phase
//! primal simplex on dense storage.

pub mod lpsub;
pub mod simplex;

pub use lpsub::LpSub;
pub use simplex::DenseSimplex;

use crate::error::{Error, ErrorKind, Result};
use crate::sparse::{Column, Row};
use crate::varstat::{LpVarStat, SlackStat};
use crate::{E, I, Sense};

/// The optimization status of a linear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpStatus {
    /// The optimal solution has been computed.
    Optimal,
    /// Optimization (or reoptimization) is still required.
    #[default]
    Unoptimized,
    /// An error happened during optimization.
    Error,
    /// A primal feasible but not optimal solution has been found.
    Feasible,
    /// The linear program is primal infeasible.
    Infeasible,
    /// The linear program is unbounded.
    Unbounded,
    /// The iteration limit was reached.
    LimitReached,
}

/// Availability of a part of the LP solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolStat {
    Available,
    #[default]
    Missing,
}

/// The solution method for a linear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpMethod {
    Primal,
    Dual,
    BarrierAndCrossover,
    BarrierNoCrossover,
    Approximate,
}

/// Constructs the error every backend returns for a method it does not
/// implement.
pub fn unsupported_method(backend: &str, method: &str) -> Error {
    Error::new(
        ErrorKind::LpIf,
        format!("{backend}: method {method} is not supported"),
    )
}

/// The capability interface every LP engine provides.
///
/// Column indices run over the loaded columns, row indices over the
/// loaded rows. Solution accessors must only be called when the
/// corresponding status reports [`SolStat::Available`].
pub trait LpSolver {
    /// Loads the linear program. Any previously loaded program is
    /// discarded.
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<()>;

    /// Loads a starting basis for the next optimization.
    fn load_basis(&mut self, var_stat: &[LpVarStat], slack_stat: &[SlackStat]) -> Result<()>;

    fn sense(&self) -> Sense;

    fn n_row(&self) -> I;

    fn max_row(&self) -> I;

    fn n_col(&self) -> I;

    fn max_col(&self) -> I;

    /// The number of nonzeros of the constraint matrix.
    fn nnz(&self) -> I;

    fn obj(&self, i: I) -> E;

    fn l_bound(&self, i: I) -> E;

    fn u_bound(&self, i: I) -> E;

    fn rhs(&self, i: I) -> E;

    fn row(&self, i: I) -> Row;

    /// Performs the optimization with the given method.
    fn optimize(&mut self, method: LpMethod) -> Result<LpStatus> {
        match method {
            LpMethod::Primal => self.primal_simplex(),
            LpMethod::Dual => self.dual_simplex(),
            LpMethod::BarrierAndCrossover => self.barrier(true),
            LpMethod::BarrierNoCrossover => self.barrier(false),
            LpMethod::Approximate => self.approximate(),
        }
    }

    fn primal_simplex(&mut self) -> Result<LpStatus>;

    fn dual_simplex(&mut self) -> Result<LpStatus>;

    fn barrier(&mut self, crossover: bool) -> Result<LpStatus>;

    fn approximate(&mut self) -> Result<LpStatus>;

    fn status(&self) -> LpStatus;

    fn infeasible(&self) -> bool {
        self.status() == LpStatus::Infeasible
    }

    /// The number of optimizations performed since the program was
    /// loaded.
    fn n_opt(&self) -> I;

    fn value(&self) -> E;

    fn x_val(&self, i: I) -> E;

    /// The reduced cost of column `i`.
    fn reco(&self, i: I) -> E;

    /// The dual value of row `i`.
    fn y_val(&self, i: I) -> E;

    /// The value of the slack variable of row `i`.
    fn slack(&self, i: I) -> E;

    fn lp_var_stat(&self, i: I) -> LpVarStat;

    fn slack_stat(&self, i: I) -> SlackStat;

    fn x_status(&self) -> SolStat;

    fn reco_status(&self) -> SolStat;

    fn y_status(&self) -> SolStat;

    fn slack_status(&self) -> SolStat;

    fn basis_status(&self) -> SolStat;

    fn add_rows(&mut self, rows: &[Row]) -> Result<()>;

    fn rem_rows(&mut self, ind: &[I]) -> Result<()>;

    fn add_cols(&mut self, cols: &[Column]) -> Result<()>;

    fn rem_cols(&mut self, ind: &[I]) -> Result<()>;

    fn change_rhs(&mut self, rhs: &[E]) -> Result<()>;

    fn change_l_bound(&mut self, i: I, lb: E) -> Result<()>;

    fn change_u_bound(&mut self, i: I, ub: E) -> Result<()>;

    fn set_simplex_iteration_limit(&mut self, limit: I) -> Result<()>;

    fn simplex_iteration_limit(&self) -> Result<I>;
}
