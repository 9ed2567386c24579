//! Branch-and-bound integration on small knapsack instances.

use rstest::rstest;

use crate::sparse::ConSense;
use crate::sub::SubStatus;
use crate::tests::{Ip, quiet_master};
use crate::{Sense, Status};

fn knapsack() -> Ip {
    // max 3x0 + 2x1 + x2  s.t.  2x0 + x1 + x2 <= 2; optimum 3
    Ip::new(Sense::Max, "knapsack")
        .binary(3.0)
        .binary(2.0)
        .binary(1.0)
        .con(&[0, 1, 2], &[2.0, 1.0, 1.0], ConSense::Less, 2.0)
}

#[rstest]
#[case("BestFirst")]
#[case("BreadthFirst")]
#[case("DepthFirst")]
#[case("DiveAndBest")]
fn knapsack_is_solved_under_every_strategy(#[case] strategy: &str) {
    let mut master = quiet_master(knapsack(), true, false);
    master
        .parameters_mut()
        .insert("EnumerationStrategy", strategy);
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 3.0);
    assert_eq!(master.dual_bound(), 3.0);
    assert!(master.n_sub() >= 3);
    // every node ended terminal
    for id in 0..master.n_sub() {
        let status = master.sub(id).unwrap().status();
        assert!(matches!(status, SubStatus::Fathomed | SubStatus::Processed));
    }
}

#[test]
fn history_tracks_the_bounds_monotonically() {
    let mut master = quiet_master(knapsack(), true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    let samples = master.history().samples();
    assert!(!samples.is_empty());
    for w in samples.windows(2) {
        assert!(w[0].time <= w[1].time);
        // maximization: the primal bound rises, the dual bound falls
        assert!(w[0].primal_bound <= w[1].primal_bound + 1.0e-9);
        assert!(w[0].dual_bound >= w[1].dual_bound - 1.0e-9);
    }
}

#[test]
fn minimization_with_integer_objective() {
    let model = Ip::new(Sense::Min, "neg-knapsack")
        .binary(-3.0)
        .binary(-2.0)
        .binary(-1.0)
        .con(&[0, 1, 2], &[2.0, 1.0, 1.0], ConSense::Less, 2.0);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("ObjInteger", "true");
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), -3.0);
}

#[test]
fn strong_branching_over_two_candidates() {
    // both variables are fractional in the root relaxation; with two
    // candidates the choice is made by limited LP probes
    let model = Ip::new(Sense::Max, "two-frac")
        .binary(1.0)
        .binary(1.0)
        .con(&[0], &[1.0], ConSense::Less, 0.5)
        .con(&[1], &[1.0], ConSense::Less, 0.5);
    let mut master = quiet_master(model, true, false);
    master
        .parameters_mut()
        .insert("NBranchingVariableCandidates", "2");
    master
        .parameters_mut()
        .insert("NStrongBranchingIterations", "50");
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 0.0);
    assert!(master.n_sub() >= 3);
}

#[test]
fn iteration_cap_with_delayed_branching_shelves_the_root() {
    let mut master = quiet_master(knapsack(), true, false);
    master.parameters_mut().insert("MaxIterations", "1");
    master
        .parameters_mut()
        .insert("DelayedBranchingThreshold", "1");
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 3.0);
    // the root was selected twice: shelved dormant once, then branched
    assert_eq!(master.n_sub_selected(), 4);
    assert_eq!(master.n_sub(), 3);
}

#[test]
fn active_set_sizes_match_the_node_lp() {
    let mut master = quiet_master(knapsack(), true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    // fathomed nodes released their active sets
    for id in 0..master.n_sub() {
        let sub = master.sub(id).unwrap();
        if sub.status() == SubStatus::Fathomed {
            assert_eq!(sub.n_active_vars(), 0);
            assert_eq!(sub.n_active_cons(), 0);
        }
    }
}

#[test]
fn reduced_cost_fixing_reaches_the_global_status() {
    // the root LP has x1 at its upper and x2 at its lower bound; once
    // the primal bound hits the optimum both fixing expressions bind
    let mut master = quiet_master(knapsack(), true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    assert!(master.n_fixed() >= 1);
}
