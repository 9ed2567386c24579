//! End-to-end tests of the branch-and-cut search.

mod bounding;
mod knapsack;
mod pricing;
mod separation;

use std::rc::Rc;

use crate::Sense;
use crate::convar::{ConRc, LinearConstraint, NumVariable, VarRc};
use crate::master::Master;
use crate::model::Model;
use crate::sparse::ConSense;
use crate::varstat::VarType;
use crate::{E, I};

/// A plain integer program given by explicit data, used as the model of
/// most end-to-end tests.
pub(crate) struct Ip {
    sense: Sense,
    name: String,
    vars: Vec<(E, E, E, VarType)>,
    cons: Vec<(Vec<I>, Vec<E>, ConSense, E)>,
}

impl Ip {
    pub fn new(sense: Sense, name: &str) -> Self {
        Self {
            sense,
            name: name.to_string(),
            vars: Vec::new(),
            cons: Vec::new(),
        }
    }

    pub fn var(mut self, obj: E, lb: E, ub: E, var_type: VarType) -> Self {
        self.vars.push((obj, lb, ub, var_type));
        self
    }

    pub fn binary(mut self, obj: E) -> Self {
        self.vars.push((obj, 0.0, 1.0, VarType::Binary));
        self
    }

    pub fn con(mut self, support: &[I], coeff: &[E], sense: ConSense, rhs: E) -> Self {
        self.cons
            .push((support.to_vec(), coeff.to_vec(), sense, rhs));
        self
    }
}

impl Model for Ip {
    fn sense(&self) -> Sense {
        self.sense
    }

    fn problem_name(&self) -> String {
        self.name.clone()
    }

    fn initial_vars(&mut self) -> Vec<VarRc> {
        self.vars
            .iter()
            .enumerate()
            .map(|(j, &(obj, lb, ub, vt))| {
                Rc::new(NumVariable::new(j, obj, lb, ub, vt)) as VarRc
            })
            .collect()
    }

    fn initial_cons(&mut self) -> Vec<ConRc> {
        self.cons
            .iter()
            .map(|(support, coeff, sense, rhs)| {
                Rc::new(LinearConstraint::from_pairs(support, coeff, *sense, *rhs)) as ConRc
            })
            .collect()
    }
}

/// A master with silenced output, as every test wants one.
pub(crate) fn quiet_master<M: Model>(model: M, cutting: bool, pricing: bool) -> Master<M> {
    let mut master = Master::new(model, cutting, pricing);
    master.parameters_mut().insert("OutputLevel", "Silent");
    master.parameters_mut().insert("LogLevel", "Silent");
    master
}
