//! The solution history: time-stamped samples of the global primal and
//! dual bound, appended whenever either bound improves.

use std::fmt;

use serde::Serialize;

use crate::E;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistorySample {
    /// Elapsed seconds since the optimization started.
    pub time: E,
    pub primal_bound: E,
    pub dual_bound: E,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    samples: Vec<HistorySample>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample. Called from the bound setters; an explicit call
    /// from an application is normally not required.
    pub fn update(&mut self, time: E, primal_bound: E, dual_bound: E) {
        self.samples.push(HistorySample {
            time,
            primal_bound,
            dual_bound,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[HistorySample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&HistorySample> {
        self.samples.last()
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution History")?;
        writeln!(f, "{:>12} {:>16} {:>16}", "Time (s)", "Primal Bound", "Dual Bound")?;
        for s in &self.samples {
            writeln!(
                f,
                "{:>12.2} {:>16.6} {:>16.6}",
                s.time, s.primal_bound, s.dual_bound
            )?;
        }
        Ok(())
    }
}
