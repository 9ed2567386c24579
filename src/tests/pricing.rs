//! Column generation: variables priced out and activated on demand.

use std::rc::Rc;

use crate::Sense;
use crate::convar::{ConRc, LinearConstraint, NumVariable, VarRc, Variable};
use crate::model::{LpSolution, Model};
use crate::sparse::ConSense;
use crate::tests::quiet_master;
use crate::Status;

/// Starts with a single column; the pricer offers a second, more
/// valuable one as soon as it is asked.
struct PriceModel;

impl Model for PriceModel {
    fn sense(&self) -> Sense {
        Sense::Max
    }

    fn problem_name(&self) -> String {
        "price-model".to_string()
    }

    fn initial_vars(&mut self) -> Vec<VarRc> {
        vec![Rc::new(NumVariable::binary(0, 1.0))]
    }

    fn initial_cons(&mut self) -> Vec<ConRc> {
        // only variable 0 appears in a constraint; the priced variable
        // is limited by its bounds alone
        vec![Rc::new(LinearConstraint::from_pairs(
            &[0],
            &[1.0],
            ConSense::Less,
            0.5,
        ))]
    }

    fn price(&mut self, solution: &LpSolution) -> Vec<VarRc> {
        if solution.vars.iter().any(|v| v.number() == 1) {
            return Vec::new();
        }
        vec![Rc::new(NumVariable::binary(1, 2.0))]
    }
}

#[test]
fn pricing_activates_an_improving_column() {
    let model = PriceModel;
    let mut master = quiet_master(model, false, true);
    assert_eq!(master.optimize(), Status::Optimal);
    // x0 is forced to 0 by its constraint, the priced column carries 2
    assert_eq!(master.primal_bound(), 2.0);
    assert_eq!(master.dual_bound(), 2.0);
    assert!(master.n_add_vars() >= 1);
    assert!(master.n_sub() >= 3);
}

#[test]
fn pool_pricing_reactivates_an_eliminated_variable() {
    // with aggressive reduced-cost elimination a variable at a zero
    // bound leaves the LP; the variable pool scan must bring it back
    // when it prices out again. Here we only verify the pool scan
    // half: a pooled inactive variable with an improving reduced cost
    // is picked up by separation.
    use crate::buffer::CutBuffer;
    use crate::pool::{Ranking, StandardPool};

    let mut pool: StandardPool<dyn Variable> = StandardPool::new(4, false);
    let _kept = pool
        .insert(Rc::new(NumVariable::binary(7, 5.0)) as Rc<dyn Variable>)
        .unwrap();
    let cons: Vec<ConRc> = vec![Rc::new(
        LinearConstraint::from_pairs(&[7], &[1.0], ConSense::Less, 1.0).with_number(0),
    )];
    let mut buffer: CutBuffer<dyn Variable> = CutBuffer::new(4);
    // dual value 1 on the constraint: reduced cost 5 - 1 = 4 improves a
    // maximization
    let n = pool.separate(&[1.0], &cons, Sense::Max, &mut buffer, 1.0e-4, Ranking::Violation);
    assert_eq!(n, 1);
    let out = buffer.extract(4);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].item().unwrap().number(), 7);
}
