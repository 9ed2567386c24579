//! Terminators for stopping a long-running search.
//!
//! This module provides several implementations of the [`Terminator`] trait:
//! - [`InterruptTerminator`]: responds to Ctrl-C (SIGINT) or programmatic interrupts.
//! - [`TimeOutTerminator`]: trips after a time limit, reporting a configurable status.
//! - [`MultipleTerminators`]: combines several terminators.
//!
//! The master polls its terminators between two subproblems only; an
//! in-flight LP solve is never preempted.
//!
//! # Note
//! [`InterruptTerminator`] installs a global signal handler and **can only be
//! constructed once** per process. Attempting to create multiple instances will
//! result in a panic.

use std::sync::{Arc, atomic::AtomicBool};

use crate::Status;

pub trait Terminator {
    fn initialize(&mut self) {}

    /// The status to stop with, or `None` to keep going.
    fn terminate(&mut self) -> Option<Status>;
}

/// Terminator that responds to Ctrl-C (SIGINT) or programmatic interrupts.
///
/// # Note
/// Only one instance can be constructed per process, as it installs a global
/// signal handler. Creating more than one will panic.
pub struct InterruptTerminator {
    interrupted: Arc<AtomicBool>,
}

impl InterruptTerminator {
    pub fn new() -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        ctrlc::set_handler({
            let interrupted_clone = interrupted.clone();
            move || {
                interrupted_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        })
        .expect("Error setting Ctrl-C handler");
        Self { interrupted }
    }

    pub fn interrupt(&mut self) {
        self.interrupted.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Terminator for InterruptTerminator {
    fn terminate(&mut self) -> Option<Status> {
        if self.interrupted.load(std::sync::atomic::Ordering::SeqCst) {
            Some(Status::ExceptionFathom)
        } else {
            None
        }
    }
}

/// Terminator that trips after a specified number of seconds and reports
/// the given status (the CPU and wall-clock gates differ only in the
/// status they report).
pub struct TimeOutTerminator {
    max_time_secs: u64,
    status: Status,
    start_time: std::time::Instant,
}

impl TimeOutTerminator {
    pub fn new(max_time_secs: u64, status: Status) -> Self {
        Self {
            max_time_secs,
            status,
            start_time: std::time::Instant::now(),
        }
    }
}

impl Terminator for TimeOutTerminator {
    fn initialize(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    fn terminate(&mut self) -> Option<Status> {
        if self.start_time.elapsed().as_secs() >= self.max_time_secs {
            Some(self.status)
        } else {
            None
        }
    }
}

/// Terminator that combines multiple terminators and trips if any of them do.
pub struct MultipleTerminators {
    terminators: Vec<Box<dyn Terminator>>,
}

impl MultipleTerminators {
    pub fn new(terminators: Vec<Box<dyn Terminator>>) -> Self {
        Self { terminators }
    }

    pub fn push(&mut self, terminator: Box<dyn Terminator>) {
        self.terminators.push(terminator);
    }
}

impl Terminator for MultipleTerminators {
    fn initialize(&mut self) {
        for terminator in &mut self.terminators {
            terminator.initialize();
        }
    }

    fn terminate(&mut self) -> Option<Status> {
        for terminator in &mut self.terminators {
            if let Some(status) = terminator.as_mut().terminate() {
                return Some(status);
            }
        }
        None
    }
}
