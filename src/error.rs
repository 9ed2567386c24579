//! Crate-wide error type.
//!
//! Contract violations (range checks, invariant violations, worsening
//! bounds) surface as an [`Error`] carrying a kind and a descriptive
//! message; callers do not attempt local recovery. Recoverable conditions
//! such as an infeasible node LP or a saturated buffer are status values,
//! not errors, and are folded into the subproblem state machine.

use derive_more::{Display, Error as ErrorDerive};

/// The failure kinds of the framework.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("illegal parameter")]
    IllegalParameter,
    #[display("primal bound worsened")]
    PrimalBound,
    #[display("dual bound worsened")]
    DualBound,
    #[display("fractional value for an integer objective")]
    NotInteger,
    #[display("buffer overflow")]
    Buffer,
    #[display("variable addition failed")]
    AddVar,
    #[display("phase error")]
    Phase,
    #[display("active set invariant violated")]
    Active,
    #[display("no solution available")]
    NoSolution,
    #[display("restoring feasibility failed")]
    MakeFeasible,
    #[display("guarantee unavailable")]
    Guarantee,
    #[display("no branching variable found")]
    BranchingVariable,
    #[display("unknown strategy")]
    Strategy,
    #[display("close-half selection failed")]
    CloseHalf,
    #[display("standard pool error")]
    StandardPool,
    #[display("variable error")]
    Variable,
    #[display("LP interface error")]
    LpIf,
    #[display("LP error")]
    Lp,
    #[display("unknown LP optimization status")]
    LpStatus,
    #[display("branching rule error")]
    BranchingRule,
    #[display("conflict between fixing and setting")]
    FixSet,
    #[display("node LP error")]
    LpSub,
    #[display("constraint error")]
    Constraint,
    #[display("pool error")]
    Pool,
    #[display("global data error")]
    Global,
    #[display("variable status error")]
    FsVarStat,
    #[display("LP backend error")]
    SolverIf,
    #[display("constraint branching rule error")]
    ConBranchRule,
    #[display("timer error")]
    Timer,
    #[display("array range violated")]
    Array,
    #[display("constraint sense error")]
    Csense,
    #[display("priority queue error")]
    PrioQueue,
    #[display("fixing candidates error")]
    FixCand,
    #[display("heap error")]
    Heap,
    #[display("pool slot error")]
    PoolSlot,
    #[display("sparse vector error")]
    SparVec,
    #[display("constraint/variable error")]
    ConVar,
    #[display("output stream error")]
    Ostream,
    #[display("hash table error")]
    Hash,
    #[display("parameter table error")]
    ParamTable,
    #[display("infeasible constraint")]
    InfeasCon,
    #[display("unknown error")]
    Unknown,
}

/// A failure with its kind and a descriptive message.
#[derive(Debug, Display, ErrorDerive, Clone, PartialEq, Eq)]
#[display("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn illegal_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalParameter, message)
    }

    pub fn lp(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lp, message)
    }

    pub fn lp_sub(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LpSub, message)
    }

    pub fn buffer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Buffer, message)
    }

    pub fn pool(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Pool, message)
    }

    pub fn fix_set(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FixSet, message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_and_message() {
        let err = Error::illegal_parameter("Guarantee: choose a nonnegative value");
        assert_eq!(err.kind(), ErrorKind::IllegalParameter);
        assert_eq!(
            err.to_string(),
            "illegal parameter: Guarantee: choose a nonnegative value"
        );
    }
}
