//! Constraints and variables.
//!
//! The framework never looks inside a constraint or variable beyond the
//! two capability traits defined here. A [`Constraint`] can produce its
//! coefficient for any [`Variable`] (which lets a row be materialized for
//! variables that did not exist when the constraint was generated), and a
//! `Variable` can produce its coefficient in any `Constraint` (which lets
//! a column be materialized during pricing). Both carry the pool
//! capability (`hash_key`/`equal`/`rank`) used by the non-duplicating
//! pool and by ranked separation.
//!
//! [`LinearConstraint`] and [`NumVariable`] are the concrete kinds used
//! by index-based applications; problem-specific kinds implement the
//! traits directly.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use crate::sparse::{Column, ConSense, Row};
use crate::varstat::VarType;
use crate::{E, I, Sense};

/// A shared constraint handle.
pub type ConRc = Rc<dyn Constraint>;
/// A shared variable handle.
pub type VarRc = Rc<dyn Variable>;

/// A linear inequality or equation over a problem-defined variable
/// space.
///
/// Sense and dimensionality are fixed for the life of the constraint and
/// the coefficient function must be deterministic.
pub trait Constraint {
    fn sense(&self) -> ConSense;

    fn rhs(&self) -> E;

    /// The coefficient of `var` in this constraint.
    fn coeff(&self, var: &dyn Variable) -> E;

    /// An identifier in the problem's constraint space, if the
    /// constraint has one (used by column-defined variables).
    fn number(&self) -> Option<I> {
        None
    }

    /// Dynamic constraints may be removed from the active set again.
    fn dynamic(&self) -> bool {
        true
    }

    /// Local constraints are valid only in the subtree of the node that
    /// generated them; they are never shared through pool separation.
    fn local(&self) -> bool {
        false
    }

    fn liftable(&self) -> bool {
        true
    }

    fn hash_key(&self) -> u64 {
        0
    }

    fn equal(&self, _other: &dyn Constraint) -> bool {
        false
    }

    /// Rank used when separated items are buffered with ranking mode
    /// `Rank`.
    fn rank(&self) -> E {
        0.0
    }

    /// The slack `rhs - a^T x` of the point `x` over the active
    /// variables `vars` (`x[j]` is the value of `vars[j]`).
    fn slack(&self, vars: &[Rc<dyn Variable>], x: &[E]) -> E {
        let mut ax = 0.0;
        for (j, v) in vars.iter().enumerate() {
            let c = self.coeff(v.as_ref());
            if c != 0.0 {
                ax += c * x[j];
            }
        }
        self.rhs() - ax
    }

    /// The violation magnitude of `x`, or `None` if `x` satisfies the
    /// constraint.
    fn violation(&self, vars: &[Rc<dyn Variable>], x: &[E]) -> Option<E> {
        let s = self.slack(vars, x);
        let v = match self.sense() {
            ConSense::Less => -s,
            ConSense::Greater => s,
            ConSense::Equal => s.abs(),
        };
        if v > 0.0 { Some(v) } else { None }
    }

    /// Materializes the row of this constraint over the active variables
    /// `vars`; support entries are positions in `vars`.
    fn gen_row(&self, vars: &[Rc<dyn Variable>]) -> Row {
        let mut row = Row::new(vars.len(), self.sense(), self.rhs());
        for (j, v) in vars.iter().enumerate() {
            let c = self.coeff(v.as_ref());
            if c != 0.0 {
                row.insert(j, c);
            }
        }
        row
    }

    /// The Euclidean distance of `x` from the hyperplane of the
    /// constraint.
    fn distance(&self, vars: &[Rc<dyn Variable>], x: &[E]) -> E {
        let mut norm = 0.0;
        for v in vars.iter() {
            let c = self.coeff(v.as_ref());
            norm += c * c;
        }
        if norm == 0.0 {
            return 0.0;
        }
        self.slack(vars, x).abs() / norm.sqrt()
    }
}

/// A problem variable.
///
/// Type and bounds are fixed at construction; they may be narrowed
/// further only through the per-node variable statuses.
pub trait Variable {
    /// The identifier of the variable in the problem's variable space.
    fn number(&self) -> I;

    fn obj(&self) -> E;

    fn lb(&self) -> E;

    fn ub(&self) -> E;

    fn var_type(&self) -> VarType;

    /// The coefficient of this variable in `con`.
    fn coeff(&self, con: &dyn Constraint) -> E;

    fn hash_key(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.number().hash(&mut h);
        h.finish()
    }

    fn equal(&self, other: &dyn Variable) -> bool {
        self.number() == other.number()
    }

    fn rank(&self) -> E {
        0.0
    }

    /// The reduced cost `obj - y^T a` against the active constraints
    /// `cons` with dual values `y`.
    fn red_cost(&self, cons: &[Rc<dyn Constraint>], y: &[E]) -> E {
        let mut rc = self.obj();
        for (i, c) in cons.iter().enumerate() {
            let a = self.coeff(c.as_ref());
            if a != 0.0 {
                rc -= y[i] * a;
            }
        }
        rc
    }

    /// True if activating the variable could improve the LP value.
    fn improving(&self, red_cost: E, sense: Sense, eps: E) -> bool {
        match sense {
            Sense::Min => red_cost < -eps,
            Sense::Max => red_cost > eps,
        }
    }

    /// Materializes the column of this variable over the active
    /// constraints `cons`; support entries are positions in `cons`.
    fn gen_column(&self, cons: &[Rc<dyn Constraint>]) -> Column {
        let mut col = Column::new(cons.len(), self.obj(), self.lb(), self.ub());
        for (i, c) in cons.iter().enumerate() {
            let a = self.coeff(c.as_ref());
            if a != 0.0 {
                col.insert(i, a);
            }
        }
        col
    }
}

/// A constraint given by an explicit sparse row over variable numbers.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    row: Row,
    number: Option<I>,
    dynamic: bool,
    local: bool,
    liftable: bool,
}

impl LinearConstraint {
    pub fn new(row: Row) -> Self {
        Self {
            row,
            number: None,
            dynamic: true,
            local: false,
            liftable: true,
        }
    }

    pub fn from_pairs(support: &[I], coeff: &[E], sense: ConSense, rhs: E) -> Self {
        Self::new(Row::from_pairs(support, coeff, sense, rhs))
    }

    pub fn with_number(mut self, number: I) -> Self {
        self.number = Some(number);
        self
    }

    /// Marks the constraint as non-removable (e.g. a model constraint).
    pub fn non_dynamic(mut self) -> Self {
        self.dynamic = false;
        self
    }

    pub fn local_to_subtree(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn row(&self) -> &Row {
        &self.row
    }
}

impl Constraint for LinearConstraint {
    fn sense(&self) -> ConSense {
        self.row.sense()
    }

    fn rhs(&self) -> E {
        self.row.rhs()
    }

    fn coeff(&self, var: &dyn Variable) -> E {
        self.row.vec().orig_coeff(var.number())
    }

    fn number(&self) -> Option<I> {
        self.number
    }

    fn dynamic(&self) -> bool {
        self.dynamic
    }

    fn local(&self) -> bool {
        self.local
    }

    fn liftable(&self) -> bool {
        self.liftable
    }

    fn hash_key(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.row.rhs().to_bits().hash(&mut h);
        for (s, c) in self.row.vec().iter() {
            s.hash(&mut h);
            c.to_bits().hash(&mut h);
        }
        h.finish()
    }

    fn equal(&self, other: &dyn Constraint) -> bool {
        if self.sense() != other.sense() || self.hash_key() != other.hash_key() {
            return false;
        }
        true
    }
}

/// A numbered variable with explicit objective coefficient and bounds.
#[derive(Debug, Clone)]
pub struct NumVariable {
    number: I,
    obj: E,
    lb: E,
    ub: E,
    var_type: VarType,
}

impl NumVariable {
    pub fn new(number: I, obj: E, lb: E, ub: E, var_type: VarType) -> Self {
        Self {
            number,
            obj,
            lb,
            ub,
            var_type,
        }
    }

    pub fn binary(number: I, obj: E) -> Self {
        Self::new(number, obj, 0.0, 1.0, VarType::Binary)
    }
}

impl Variable for NumVariable {
    fn number(&self) -> I {
        self.number
    }

    fn obj(&self) -> E {
        self.obj
    }

    fn lb(&self) -> E {
        self.lb
    }

    fn ub(&self) -> E {
        self.ub
    }

    fn var_type(&self) -> VarType {
        self.var_type
    }

    fn coeff(&self, con: &dyn Constraint) -> E {
        con.coeff(self)
    }
}

/// A variable defined by an explicit column over constraint numbers,
/// as generated by pricing routines.
#[derive(Debug, Clone)]
pub struct ColVariable {
    number: I,
    column: Column,
    var_type: VarType,
}

impl ColVariable {
    pub fn new(number: I, column: Column, var_type: VarType) -> Self {
        Self {
            number,
            column,
            var_type,
        }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }
}

impl Variable for ColVariable {
    fn number(&self) -> I {
        self.number
    }

    fn obj(&self) -> E {
        self.column.obj()
    }

    fn lb(&self) -> E {
        self.column.lb()
    }

    fn ub(&self) -> E {
        self.column.ub()
    }

    fn var_type(&self) -> VarType {
        self.var_type
    }

    fn coeff(&self, con: &dyn Constraint) -> E {
        match con.number() {
            Some(n) => self.column.vec().orig_coeff(n),
            None => con.coeff(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vec<Rc<dyn Variable>> {
        (0..3)
            .map(|j| Rc::new(NumVariable::binary(j, 1.0)) as Rc<dyn Variable>)
            .collect()
    }

    #[test]
    fn slack_and_violation() {
        // x0 + x1 + x2 <= 2
        let c = LinearConstraint::from_pairs(&[0, 1, 2], &[1.0, 1.0, 1.0], ConSense::Less, 2.0);
        let vars = vars();
        assert_eq!(c.slack(&vars, &[1.0, 0.5, 0.0]), 0.5);
        assert_eq!(c.violation(&vars, &[1.0, 0.5, 0.0]), None);
        assert_eq!(c.violation(&vars, &[1.0, 1.0, 0.5]), Some(0.5));
    }

    #[test]
    fn gen_row_uses_active_positions() {
        let c = LinearConstraint::from_pairs(&[0, 2], &[2.0, 3.0], ConSense::Greater, 1.0);
        let vars = vars();
        let row = c.gen_row(&vars);
        assert_eq!(row.nnz(), 2);
        assert_eq!(row.support(0), 0);
        assert_eq!(row.coeff(1), 3.0);
        assert_eq!(row.sense(), ConSense::Greater);
    }

    #[test]
    fn reduced_cost_subtracts_dual_activity() {
        let c: Rc<dyn Constraint> = Rc::new(
            LinearConstraint::from_pairs(&[0, 1], &[1.0, 2.0], ConSense::Less, 4.0).with_number(0),
        );
        let v = NumVariable::new(1, 5.0, 0.0, 1.0, VarType::Continuous);
        let rc = v.red_cost(&[c], &[1.5]);
        assert_eq!(rc, 5.0 - 1.5 * 2.0);
    }

    #[test]
    fn duplicate_constraints_compare_equal() {
        let a = LinearConstraint::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Less, 1.0);
        let b = LinearConstraint::from_pairs(&[0, 1], &[1.0, 1.0], ConSense::Less, 1.0);
        let c = LinearConstraint::from_pairs(&[0, 1], &[1.0, 2.0], ConSense::Less, 1.0);
        assert!(a.equal(&b));
        assert_eq!(a.hash_key(), b.hash_key());
        assert!(!a.equal(&c));
    }

    #[test]
    fn col_variable_reads_its_column() {
        let col = Column::from_pairs(&[0, 2], &[1.0, -1.0], 3.0, 0.0, 1.0);
        let v = ColVariable::new(7, col, VarType::Continuous);
        let c0: Rc<dyn Constraint> =
            Rc::new(LinearConstraint::from_pairs(&[7], &[9.0], ConSense::Less, 1.0).with_number(2));
        assert_eq!(v.coeff(c0.as_ref()), -1.0);
        assert_eq!(v.obj(), 3.0);
    }
}
