//! Bound management, fathoming, and the termination gates.

use std::fs;

use crate::sparse::ConSense;
use crate::sub::SubStatus;
use crate::tests::{Ip, quiet_master};
use crate::varstat::VarType;
use crate::{Sense, Status};

#[test]
fn trivial_min_lp_root() {
    // a single continuous variable and no constraints: the root
    // relaxation is already feasible at the lower bound
    let model = Ip::new(Sense::Min, "trivial").var(1.0, 0.0, 10.0, VarType::Continuous);
    let mut master = quiet_master(model, true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 0.0);
    assert_eq!(master.dual_bound(), 0.0);
    assert_eq!(master.n_sub_selected(), 1);
    assert_eq!(
        master.sub(0).map(|s| s.status()),
        Some(SubStatus::Fathomed)
    );
}

#[test]
fn fathoming_by_bound_skips_branching() {
    // the primal bound is pre-seeded to 4.0 from the optimum file; the
    // root LP value 5.0 cannot beat it, so the node is fathomed without
    // ever branching
    let path = std::env::temp_dir().join("thicket-fathom-case.opt");
    fs::write(&path, "fathom-case 4.0\n").unwrap();
    let model = Ip::new(Sense::Min, "fathom-case").var(1.0, 5.0, 10.0, VarType::Continuous);
    let mut master = quiet_master(model, true, false);
    master
        .parameters_mut()
        .insert("PrimalBoundInitMode", "Optimum");
    master
        .parameters_mut()
        .insert("OptimumFileName", path.to_str().unwrap());
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 4.0);
    let root = master.sub(0).unwrap();
    assert_eq!(root.status(), SubStatus::Fathomed);
    assert_eq!(master.n_sub(), 1);
    let _ = fs::remove_file(&path);
}

#[test]
fn integer_objective_rounds_the_primal_bound() {
    // the LP reports 9.9999999 for an integer-valued solution; the
    // stored bound is the adjacent integer and bounding against 10
    // succeeds
    let model = Ip::new(Sense::Min, "rounding")
        .var(1.0, 0.0, 20.0, VarType::Integer)
        .con(&[0], &[1.0], ConSense::Greater, 9.9999999);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("ObjInteger", "true");
    assert_eq!(master.optimize(), Status::Optimal);
    assert_eq!(master.primal_bound(), 10.0);
    assert!(master.primal_violated(10.0));
}

#[test]
fn guarantee_gate_stops_the_search() {
    // primal pre-seeded to 100, root relaxation 96.2: the 5 percent
    // guarantee is reached before any child is processed
    let path = std::env::temp_dir().join("thicket-gap-case.opt");
    fs::write(&path, "gap-case 100.0\n").unwrap();
    let model = Ip::new(Sense::Min, "gap-case")
        .var(1.0, 0.0, 200.0, VarType::Integer)
        .con(&[0], &[1.0], ConSense::Greater, 96.2);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("Guarantee", "5.0");
    master
        .parameters_mut()
        .insert("PrimalBoundInitMode", "Optimum");
    master
        .parameters_mut()
        .insert("OptimumFileName", path.to_str().unwrap());
    assert_eq!(master.optimize(), Status::Guaranteed);
    assert!(master.guaranteed());
    let gap = master.guarantee().unwrap();
    assert!(gap > 3.0 && gap < 5.0);
    // the remaining children were fathomed by the gate
    for id in 1..master.n_sub() {
        assert_eq!(
            master.sub(id).map(|s| s.status()),
            Some(SubStatus::Fathomed)
        );
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn guarantee_formula() {
    let model = Ip::new(Sense::Min, "formula").var(1.0, 0.0, 1.0, VarType::Continuous);
    let mut master = quiet_master(model, true, false);
    master.update_dual_bound(96.0).unwrap();
    master.update_primal_bound(100.0).unwrap();
    let gap = master.guarantee().unwrap();
    assert!((gap - (100.0 - 96.0) / 96.0 * 100.0).abs() < 1.0e-9);
}

#[test]
fn worsening_bounds_are_rejected() {
    let model = Ip::new(Sense::Min, "monotone").var(1.0, 0.0, 1.0, VarType::Continuous);
    let mut master = quiet_master(model, true, false);
    master.update_primal_bound(10.0).unwrap();
    assert!(master.update_primal_bound(11.0).is_err());
    master.update_dual_bound(5.0).unwrap();
    assert!(master.update_dual_bound(4.0).is_err());
    // the history saw both successful updates
    assert_eq!(master.history().len(), 2);
}

#[test]
fn infeasible_problem_terminates_without_a_solution() {
    let model = Ip::new(Sense::Min, "infeasible")
        .var(1.0, 0.0, 1.0, VarType::Integer)
        .con(&[0], &[1.0], ConSense::Greater, 2.0);
    let mut master = quiet_master(model, true, false);
    assert_eq!(master.optimize(), Status::Optimal);
    assert!(!master.feasible_found());
}

#[test]
fn max_n_sub_gate() {
    let model = Ip::new(Sense::Max, "nsub-gate")
        .binary(3.0)
        .binary(2.0)
        .binary(1.0)
        .con(&[0, 1, 2], &[2.0, 1.0, 1.0], ConSense::Less, 2.0);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("MaxNSub", "1");
    assert_eq!(master.optimize(), Status::MaxNSub);
    // the root branched, its children were fathomed by the gate
    assert!(master.n_sub() > 1);
    assert_eq!(
        master.sub(1).map(|s| s.status()),
        Some(SubStatus::Fathomed)
    );
}

#[test]
fn max_level_caps_child_generation() {
    let model = Ip::new(Sense::Max, "level-gate")
        .binary(3.0)
        .binary(2.0)
        .binary(1.0)
        .con(&[0, 1, 2], &[2.0, 1.0, 1.0], ConSense::Less, 2.0);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("MaxLevel", "1");
    assert_eq!(master.optimize(), Status::MaxLevel);
    assert_eq!(master.n_sub(), 1);
}

#[test]
fn time_limit_is_respected() {
    let model = Ip::new(Sense::Max, "time-gate")
        .binary(3.0)
        .binary(2.0)
        .con(&[0, 1], &[2.0, 1.0], ConSense::Less, 2.0);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("MaxCpuTime", "0:0:0");
    assert_eq!(master.optimize(), Status::MaxCpuTime);
}

#[test]
fn bad_parameter_fails_the_optimization() {
    let model = Ip::new(Sense::Min, "badparam").var(1.0, 0.0, 1.0, VarType::Continuous);
    let mut master = quiet_master(model, true, false);
    master.parameters_mut().insert("EnumerationStrategy", "Sideways");
    assert_eq!(master.optimize(), Status::Error);
    assert!(master.last_error().is_some());
}
