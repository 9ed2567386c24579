//! Status records for variables and slack variables.
//!
//! [`FsVarStat`] records fixing and setting decisions: *setting* a
//! variable to a bound is valid only within the subtree where the
//! decision was made and is undone on backtracking, while *fixing* is
//! globally valid for the rest of the optimization. [`LpVarStat`] and
//! [`SlackStat`] record the basis status reported by the LP solver.

use crate::E;

/// The fixing/setting state of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FsVarStat {
    #[default]
    Free,
    SetToLowerBound,
    SetToUpperBound,
    /// Set to an explicit value (locally valid).
    Set(E),
    FixedToLowerBound,
    FixedToUpperBound,
    /// Fixed to an explicit value (globally valid).
    Fixed(E),
}

impl FsVarStat {
    pub fn fixed(self) -> bool {
        matches!(
            self,
            FsVarStat::FixedToLowerBound | FsVarStat::FixedToUpperBound | FsVarStat::Fixed(_)
        )
    }

    pub fn set(self) -> bool {
        matches!(
            self,
            FsVarStat::SetToLowerBound | FsVarStat::SetToUpperBound | FsVarStat::Set(_)
        )
    }

    pub fn fixed_or_set(self) -> bool {
        self.fixed() || self.set()
    }

    /// The value the variable is held at, given its bounds; `None` when
    /// free.
    pub fn value(self, lb: E, ub: E) -> Option<E> {
        match self {
            FsVarStat::Free => None,
            FsVarStat::SetToLowerBound | FsVarStat::FixedToLowerBound => Some(lb),
            FsVarStat::SetToUpperBound | FsVarStat::FixedToUpperBound => Some(ub),
            FsVarStat::Set(v) | FsVarStat::Fixed(v) => Some(v),
        }
    }

    /// True if holding a variable at both statuses at once is impossible
    /// (e.g. fixed to the lower and set to the upper bound).
    pub fn contradicts(self, other: FsVarStat, lb: E, ub: E, machine_eps: E) -> bool {
        match (self.value(lb, ub), other.value(lb, ub)) {
            (Some(a), Some(b)) => (a - b).abs() >= machine_eps,
            _ => false,
        }
    }
}

/// The LP basis status of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LpVarStat {
    AtLowerBound,
    Basic,
    AtUpperBound,
    NonBasicFree,
    /// The variable is not part of the LP.
    Eliminated,
    #[default]
    Unknown,
}

impl LpVarStat {
    pub fn at_bound(self) -> bool {
        matches!(self, LpVarStat::AtLowerBound | LpVarStat::AtUpperBound)
    }

    pub fn basic(self) -> bool {
        self == LpVarStat::Basic
    }
}

/// The LP basis status of a slack variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlackStat {
    Basic,
    NonBasicZero,
    NonBasicNonZero,
    #[default]
    Unknown,
}

impl SlackStat {
    pub fn basic(self) -> bool {
        self == SlackStat::Basic
    }
}

/// The type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Continuous,
    Integer,
    Binary,
}

impl VarType {
    /// True for variables required to take integer values.
    pub fn discrete(self) -> bool {
        matches!(self, VarType::Integer | VarType::Binary)
    }

    pub fn binary(self) -> bool {
        self == VarType::Binary
    }
}
