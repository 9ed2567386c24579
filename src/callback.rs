//! Hooks invoked during the search for logging, monitoring, or custom
//! progress output.

use crate::{E, I, Status};

/// The verbosity of the built-in progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputLevel {
    /// No output at all.
    Silent,
    /// Parameter table, history, and final statistics.
    Statistics,
    /// Statistics plus one line per selected subproblem.
    Subproblem,
    /// Subproblem lines plus one line per solved LP.
    LinearProgram,
    /// Everything.
    Full,
}

impl OutputLevel {
    pub const NAMES: [&'static str; 5] =
        ["Silent", "Statistics", "Subproblem", "LinearProgram", "Full"];
}

/// An event of the branch-and-cut search.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Started,
    SubproblemSelected {
        n_sub: I,
        n_open: I,
        id: I,
        dual_bound: E,
        primal_bound: E,
    },
    LpSolved {
        id: I,
        n_iter: I,
        value: E,
        dual_bound: E,
        primal_bound: E,
    },
    Finished {
        status: Status,
        primal_bound: E,
        dual_bound: E,
    },
    Message(String),
}

/// Hook invoked on every search event.
pub trait Callback {
    fn on_event(&mut self, event: &SearchEvent);
}

/// A callback that does nothing. Use when no progress output is needed.
pub struct NoOpCallback {}

impl Callback for NoOpCallback {
    fn on_event(&mut self, _event: &SearchEvent) {
        // Do nothing
    }
}

/// Prints the progress table to stdout, gated by the output level.
pub struct TableOutput {
    level: OutputLevel,
    header_printed: bool,
}

impl TableOutput {
    pub fn new(level: OutputLevel) -> Self {
        Self {
            level,
            header_printed: false,
        }
    }

    fn header(&mut self) {
        if !self.header_printed {
            println!(
                "{:>7} {:>7} {:>9} {:>7} {:>12} {:>12} {:>12}",
                "#sub", "#open", "current", "#iter", "LP", "dual", "primal"
            );
            self.header_printed = true;
        }
    }
}

impl Callback for TableOutput {
    fn on_event(&mut self, event: &SearchEvent) {
        if self.level == OutputLevel::Silent {
            return;
        }
        match event {
            SearchEvent::Started => {}
            SearchEvent::SubproblemSelected {
                n_sub,
                n_open,
                id,
                dual_bound,
                primal_bound,
            } => {
                if self.level >= OutputLevel::Subproblem {
                    self.header();
                    println!(
                        "{:>7} {:>7} {:>9} {:>7} {:>12} {:>12.4} {:>12.4}",
                        n_sub, n_open, id, "-", "-", dual_bound, primal_bound
                    );
                }
            }
            SearchEvent::LpSolved {
                id,
                n_iter,
                value,
                dual_bound,
                primal_bound,
            } => {
                if self.level >= OutputLevel::LinearProgram {
                    self.header();
                    println!(
                        "{:>7} {:>7} {:>9} {:>7} {:>12.4} {:>12.4} {:>12.4}",
                        "-", "-", id, n_iter, value, dual_bound, primal_bound
                    );
                }
            }
            SearchEvent::Finished {
                status,
                primal_bound,
                ..
            } => {
                if self.level >= OutputLevel::Statistics {
                    println!("optimization terminated with status {status:?}");
                    println!("best solution: {primal_bound}");
                }
            }
            SearchEvent::Message(text) => {
                if self.level >= OutputLevel::Statistics {
                    println!("{text}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(OutputLevel::Silent < OutputLevel::Statistics);
        assert!(OutputLevel::Subproblem < OutputLevel::LinearProgram);
        assert!(OutputLevel::LinearProgram < OutputLevel::Full);
    }

    #[test]
    fn noop_accepts_every_event() {
        let mut cb = NoOpCallback {};
        cb.on_event(&SearchEvent::Started);
        cb.on_event(&SearchEvent::Message("hello".into()));
    }
}
