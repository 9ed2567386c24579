//! The parameter table.
//!
//! Parameters live in a table of string literals, seeded from a typed
//! default registry and optionally overridden from a parameter file
//! (lines of whitespace-separated key and value; `#` starts a comment).
//! Typed getters validate ranges or enumerate the feasible settings and
//! fail loudly on violation.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use dyn_clone::DynClone;

use crate::error::{Error, Result};
use crate::I;

/// A typed parameter value that can be stored in the default registry
/// and rendered into the literal table.
pub trait ParamValue: Any + Sync + Send + DynClone {
    fn as_literal(&self) -> String;
}

impl ParamValue for &'static str {
    fn as_literal(&self) -> String {
        self.to_string()
    }
}

impl ParamValue for String {
    fn as_literal(&self) -> String {
        self.clone()
    }
}

impl ParamValue for bool {
    fn as_literal(&self) -> String {
        self.to_string()
    }
}

impl ParamValue for usize {
    fn as_literal(&self) -> String {
        self.to_string()
    }
}

impl ParamValue for i64 {
    fn as_literal(&self) -> String {
        self.to_string()
    }
}

impl ParamValue for f64 {
    fn as_literal(&self) -> String {
        self.to_string()
    }
}

impl Clone for Box<dyn ParamValue> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

/// The default settings of the framework.
static DEFAULT_PARAMETERS: LazyLock<HashMap<&'static str, Box<dyn ParamValue>>> =
    LazyLock::new(|| {
        let mut map: HashMap<&'static str, Box<dyn ParamValue>> = HashMap::new();
        map.insert("EnumerationStrategy", Box::new("BestFirst"));
        map.insert("BranchingStrategy", Box::new("CloseHalfExpensive"));
        map.insert("NBranchingVariableCandidates", Box::new(1usize));
        map.insert("NStrongBranchingIterations", Box::new(50usize));
        map.insert("Guarantee", Box::new(0.0));
        map.insert("MaxLevel", Box::new(999999usize));
        map.insert("MaxNSub", Box::new(9999999usize));
        map.insert("MaxCpuTime", Box::new("99999:59:59"));
        map.insert("MaxCowTime", Box::new("99999:59:59"));
        map.insert("ObjInteger", Box::new(false));
        map.insert("TailOffNLps", Box::new(0usize));
        map.insert("TailOffPercent", Box::new(0.0001));
        map.insert("DelayedBranchingThreshold", Box::new(0usize));
        map.insert("MinDormantRounds", Box::new(1usize));
        map.insert("OutputLevel", Box::new("Full"));
        map.insert("LogLevel", Box::new("Silent"));
        map.insert("PrimalBoundInitMode", Box::new("None"));
        map.insert("PricingFrequency", Box::new(0usize));
        map.insert("SkipFactor", Box::new(1usize));
        map.insert("SkippingMode", Box::new("SkipByNode"));
        map.insert("FixSetByRedCost", Box::new(true));
        map.insert("PrintLP", Box::new(false));
        map.insert("MaxConAdd", Box::new(100usize));
        map.insert("MaxConBuffered", Box::new(100usize));
        map.insert("MaxVarAdd", Box::new(500usize));
        map.insert("MaxVarBuffered", Box::new(500usize));
        map.insert("MaxIterations", Box::new(-1i64));
        map.insert("EliminateFixedSet", Box::new(false));
        map.insert("NewRootReOptimize", Box::new(false));
        map.insert("ShowAverageCutDistance", Box::new(false));
        map.insert("ConstraintEliminationMode", Box::new("Basic"));
        map.insert("ConElimEps", Box::new(0.001));
        map.insert("ConElimAge", Box::new(1usize));
        map.insert("VariableEliminationMode", Box::new("ReducedCost"));
        map.insert("VarElimEps", Box::new(0.001));
        map.insert("VarElimAge", Box::new(1usize));
        map.insert("VbcLog", Box::new("None"));
        map.insert("DefaultLpSolver", Box::new("DenseSimplex"));
        map.insert("SolveApprox", Box::new(false));
        map
    });

/// The table of parameter literals with typed lookups.
#[derive(Debug, Clone)]
pub struct Parameters {
    table: HashMap<String, String>,
}

impl Parameters {
    /// A table seeded with the default settings.
    pub fn new() -> Self {
        let table = DEFAULT_PARAMETERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_literal()))
            .collect();
        Self { table }
    }

    /// Inserts or overwrites a parameter literal.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.table.insert(key.into(), value.into());
    }

    /// Inserts a typed value, stored as its literal.
    pub fn insert_typed(&mut self, key: impl Into<String>, value: impl ParamValue) {
        self.table.insert(key.into(), value.as_literal());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.table.get(key).map(String::as_str)
    }

    /// Reads a parameter file: `#` starts a comment, empty lines are
    /// skipped, every other line holds a whitespace-separated key and
    /// value.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::illegal_parameter(format!(
                "cannot read parameter file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        self.read_str(&text)
    }

    pub fn read_str(&mut self, text: &str) -> Result<()> {
        for (line_no, line) in text.lines().enumerate() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            };
            let mut it = line.split_whitespace();
            let Some(key) = it.next() else {
                continue;
            };
            let Some(value) = it.next() else {
                return Err(Error::illegal_parameter(format!(
                    "parameter line {} has a key but no value",
                    line_no + 1
                )));
            };
            self.insert(key, value);
        }
        Ok(())
    }

    fn raw_or_fail(&self, key: &str) -> Result<&str> {
        self.get_raw(key)
            .ok_or_else(|| Error::illegal_parameter(format!("unknown parameter {key}")))
    }

    /// A typed lookup.
    pub fn get<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.raw_or_fail(key)?;
        raw.parse().map_err(|_| {
            Error::illegal_parameter(format!("parameter {key}: cannot parse value '{raw}'"))
        })
    }

    /// A typed lookup validated against an inclusive range.
    pub fn get_ranged<T>(&self, key: &str, min: T, max: T) -> Result<T>
    where
        T: FromStr + PartialOrd + Display,
    {
        let v: T = self.get(key)?;
        if v < min || v > max {
            return Err(Error::illegal_parameter(format!(
                "parameter {key}: value {v} outside feasible range [{min}, {max}]"
            )));
        }
        Ok(v)
    }

    /// Matches the literal against a table of feasible settings and
    /// returns the index of the match.
    pub fn find(&self, key: &str, feasible: &[&str]) -> Result<I> {
        let raw = self.raw_or_fail(key)?;
        feasible.iter().position(|&f| f == raw).ok_or_else(|| {
            Error::illegal_parameter(format!(
                "parameter {key}: value '{raw}' not in {{{}}}",
                feasible.join(", ")
            ))
        })
    }

    /// Parses a `[[H:]M:]S` time literal into seconds.
    pub fn get_time(&self, key: &str) -> Result<u64> {
        let raw = self.raw_or_fail(key)?;
        parse_time(raw)
            .ok_or_else(|| Error::illegal_parameter(format!("parameter {key}: bad time '{raw}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses `[[H:]M:]S`; minutes and seconds must stay below 60 when a
/// larger unit is present.
pub fn parse_time(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut values = Vec::with_capacity(parts.len());
    for p in &parts {
        values.push(p.parse::<u64>().ok()?);
    }
    match values.as_slice() {
        [s] => Some(*s),
        [m, s] => {
            if *s > 59 {
                return None;
            }
            Some(m * 60 + s)
        }
        [h, m, s] => {
            if *s > 59 || *m > 59 {
                return None;
            }
            Some(h * 3600 + m * 60 + s)
        }
        _ => None,
    }
}
