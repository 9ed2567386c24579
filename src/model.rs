//! The problem-specific collaborators.
//!
//! The framework drives the search; everything the application knows
//! about its problem enters through [`Model`]: the initial constraint
//! and variable system, the feasibility test, and the separation,
//! pricing, and primal-heuristic routines. Every hook except the initial
//! system has a default that simply contributes nothing.

use crate::convar::{ConRc, VarRc};
use crate::{E, I, Sense, Tol};

/// A snapshot of a node's LP solution, handed to the model hooks.
///
/// `x[j]` is the value of `vars[j]`, `y[i]` the dual value of `cons[i]`,
/// and `value` the objective value including eliminated variables.
pub struct LpSolution {
    pub value: E,
    pub x: Vec<E>,
    pub y: Vec<E>,
    pub vars: Vec<VarRc>,
    pub cons: Vec<ConRc>,
    pub tol: Tol,
}

impl LpSolution {
    /// True if every discrete variable takes an integer value (within
    /// the safety tolerance).
    pub fn integer_feasible(&self) -> bool {
        self.x
            .iter()
            .zip(&self.vars)
            .all(|(&x, v)| !v.var_type().discrete() || self.tol.is_integer_eps(x, self.tol.eps))
    }

    /// The fractional discrete variables of the solution.
    pub fn fractional_vars(&self) -> Vec<I> {
        (0..self.x.len())
            .filter(|&j| {
                self.vars[j].var_type().discrete()
                    && !self.tol.is_integer_eps(self.x[j], self.tol.eps)
            })
            .collect()
    }
}

/// The problem-specific part of a branch-and-cut application.
pub trait Model {
    /// The sense of the objective function.
    fn sense(&self) -> Sense;

    /// The name of the problem instance, used for log files and the
    /// optimum-verification file.
    fn problem_name(&self) -> String {
        "problem".to_string()
    }

    /// The variables of the initial formulation.
    fn initial_vars(&mut self) -> Vec<VarRc>;

    /// The constraints of the initial formulation.
    fn initial_cons(&mut self) -> Vec<ConRc>;

    /// Initial cutting planes seeding the cut pool.
    fn initial_cuts(&mut self) -> Vec<ConRc> {
        Vec::new()
    }

    /// The feasibility test for an LP solution that satisfies all
    /// integrality requirements. The default accepts exactly the
    /// integer-feasible solutions.
    fn feasible(&mut self, solution: &LpSolution) -> bool {
        solution.integer_feasible()
    }

    /// The separation routine: constraints violated by `solution`.
    fn separate(&mut self, _solution: &LpSolution) -> Vec<ConRc> {
        Vec::new()
    }

    /// The pricing routine: variables whose activation could improve
    /// `solution`.
    fn price(&mut self, _solution: &LpSolution) -> Vec<VarRc> {
        Vec::new()
    }

    /// A primal heuristic: the value of an improved feasible solution
    /// derived from `solution`, if one was found.
    fn improve(&mut self, _solution: &LpSolution) -> Option<E> {
        None
    }

    /// Called on an infeasible node LP: variables whose activation could
    /// restore feasibility. Returning none fathoms the node.
    fn make_feasible(&mut self) -> Vec<VarRc> {
        Vec::new()
    }

    /// A custom branching-rule factory. Returning `None` hands the
    /// decision to the built-in close-half variable branching.
    fn branching_rules(
        &mut self,
        _solution: &LpSolution,
    ) -> Option<Vec<crate::branching::BranchRule>> {
        None
    }
}
