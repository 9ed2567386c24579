//! Cutting-plane generation and constraint elimination.

use std::rc::Rc;

use crate::Sense;
use crate::convar::{ConRc, Constraint, LinearConstraint, NumVariable, VarRc};
use crate::model::{LpSolution, Model};
use crate::sparse::ConSense;
use crate::tests::quiet_master;
use crate::{E, Status};

/// Two binary variables under a loose initial constraint; the separator
/// produces the tightened cuts on demand.
struct CutModel {
    /// Right-hand sides of the cuts handed out so far.
    generated: Vec<E>,
    /// The cuts to generate, loosest first.
    cut_rhs: Vec<E>,
    initial_rhs: E,
}

impl CutModel {
    fn new(initial_rhs: E, cut_rhs: &[E]) -> Self {
        Self {
            generated: Vec::new(),
            cut_rhs: cut_rhs.to_vec(),
            initial_rhs,
        }
    }
}

impl Model for CutModel {
    fn sense(&self) -> Sense {
        Sense::Max
    }

    fn problem_name(&self) -> String {
        "cut-model".to_string()
    }

    fn initial_vars(&mut self) -> Vec<VarRc> {
        vec![
            Rc::new(NumVariable::binary(0, 1.0)),
            Rc::new(NumVariable::binary(1, 1.0)),
        ]
    }

    fn initial_cons(&mut self) -> Vec<ConRc> {
        vec![Rc::new(LinearConstraint::from_pairs(
            &[0, 1],
            &[1.0, 1.0],
            ConSense::Less,
            self.initial_rhs,
        ))]
    }

    fn separate(&mut self, solution: &LpSolution) -> Vec<ConRc> {
        let sum = solution.x[0] + solution.x[1];
        let mut cuts: Vec<ConRc> = Vec::new();
        for &rhs in &self.cut_rhs {
            if sum > rhs + 0.01 && !self.generated.contains(&rhs) {
                self.generated.push(rhs);
                cuts.push(Rc::new(LinearConstraint::from_pairs(
                    &[0, 1],
                    &[1.0, 1.0],
                    ConSense::Less,
                    rhs,
                )));
                break;
            }
        }
        cuts
    }
}

#[test]
fn a_cutting_plane_closes_the_gap_without_branching() {
    let model = CutModel::new(1.5, &[1.0]);
    let mut master = quiet_master(model, true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 1.0);
    // one node, at least two LPs, one added cut
    assert_eq!(master.n_sub(), 1);
    assert!(master.n_lp() >= 2);
    assert_eq!(master.n_add_cons(), 1);
    assert_eq!(master.model().generated.len(), 1);
}

#[test]
fn non_binding_constraints_are_eliminated_by_age() {
    // the first cut makes the initial constraint non-binding; the
    // second separation round removes it before adding the final cut
    let model = CutModel::new(1.9, &[1.4, 1.0]);
    let mut master = quiet_master(model, true, false);
    master
        .parameters_mut()
        .insert("ConstraintEliminationMode", "NonBinding");
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 1.0);
    assert_eq!(master.n_sub(), 1);
    assert_eq!(master.n_rem_cons(), 1);
    assert_eq!(master.n_add_cons(), 2);
    assert_eq!(master.model().generated, vec![1.4, 1.0]);
}

/// A model whose cut sits in the cut pool from the start: the pool scan
/// alone must find and activate it.
struct PooledCutModel;

impl Model for PooledCutModel {
    fn sense(&self) -> Sense {
        Sense::Max
    }

    fn problem_name(&self) -> String {
        "pooled-cut".to_string()
    }

    fn initial_vars(&mut self) -> Vec<VarRc> {
        vec![
            Rc::new(NumVariable::binary(0, 1.0)),
            Rc::new(NumVariable::binary(1, 1.0)),
        ]
    }

    fn initial_cons(&mut self) -> Vec<ConRc> {
        vec![Rc::new(LinearConstraint::from_pairs(
            &[0, 1],
            &[1.0, 1.0],
            ConSense::Less,
            1.5,
        ))]
    }

    fn initial_cuts(&mut self) -> Vec<ConRc> {
        vec![Rc::new(LinearConstraint::from_pairs(
            &[0, 1],
            &[1.0, 1.0],
            ConSense::Less,
            1.0,
        ))]
    }
}

#[test]
fn pool_separation_activates_a_seeded_cut() {
    let model = PooledCutModel;
    let mut master = quiet_master(model, true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 1.0);
    assert_eq!(master.n_sub(), 1);
}

#[test]
fn duplicate_cuts_are_stored_once() {
    // the separator's cut is byte-identical to the seeded one; the
    // non-duplicating cut pool must coalesce them
    let a = LinearConstraint::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Less, 1.0);
    let b = LinearConstraint::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Less, 1.0);
    assert!(a.equal(&b));
    assert_eq!(a.hash_key(), b.hash_key());
}
