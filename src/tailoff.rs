//! Tailing-off detection.
//!
//! Successive cutting planes tend to improve the LP value by diminishing
//! amounts. The detector keeps a ring of the most recent LP values and
//! reports a stall when the ring is full and the relative change between
//! its oldest and newest value falls below a threshold; the subproblem
//! then branches early instead of generating further cuts.

use crate::E;
use crate::I;
use crate::ring::Ring;

#[derive(Debug, Clone)]
pub struct TailOff {
    /// LP values considered in the analysis; `None` disables detection.
    lp_history: Option<Ring<E>>,
    /// Minimal improvement in percent below which a stall is reported.
    percent: E,
}

impl TailOff {
    /// A detector over the last `n_lps` LP values. With `n_lps == 0`
    /// detection is disabled and [`tail_off`](Self::tail_off) never
    /// reports a stall.
    pub fn new(n_lps: I, percent: E) -> Self {
        Self {
            lp_history: if n_lps > 0 { Some(Ring::new(n_lps)) } else { None },
            percent,
        }
    }

    /// Records a new LP value. Call after every solved LP of the cutting
    /// plane phase.
    pub fn update(&mut self, value: E) {
        if let Some(ring) = &mut self.lp_history {
            ring.insert(value);
        }
    }

    /// Clears the history. Must be called when variables are added: the
    /// LP value may then worsen, which would spuriously look like a
    /// stall.
    pub fn reset(&mut self) {
        if let Some(ring) = &mut self.lp_history {
            ring.clear();
        }
    }

    /// True if the recorded values changed less than the threshold.
    pub fn tail_off(&self) -> bool {
        let Some(ring) = &self.lp_history else {
            return false;
        };
        if !ring.filled() {
            return false;
        }
        let oldest = ring.oldest();
        let newest = ring.newest();
        ((oldest - newest) * 100.0 / oldest).abs() < self.percent
    }

    /// The relative difference in percent between the newest value and
    /// the value recorded `n_lps` insertions earlier, if still stored.
    pub fn diff(&self, n_lps: I) -> Option<E> {
        let ring = self.lp_history.as_ref()?;
        let old = ring.previous(n_lps)?;
        let last = ring.newest();
        Some(((last - old) * 100.0 / old).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_diminishing_improvements() {
        let mut t = TailOff::new(3, 1.0);
        t.update(100.0);
        t.update(99.9);
        assert!(!t.tail_off());
        t.update(99.85);
        t.update(99.8);
        assert!(t.tail_off());
    }

    #[test]
    fn large_improvement_is_no_stall() {
        let mut t = TailOff::new(2, 1.0);
        t.update(100.0);
        t.update(50.0);
        assert!(!t.tail_off());
    }

    #[test]
    fn disabled_detector_never_trips() {
        let mut t = TailOff::new(0, 1.0);
        t.update(1.0);
        t.update(1.0);
        t.update(1.0);
        assert!(!t.tail_off());
        assert_eq!(t.diff(1), None);
    }

    #[test]
    fn reset_clears_history() {
        let mut t = TailOff::new(2, 1.0);
        t.update(10.0);
        t.update(10.0);
        assert!(t.tail_off());
        t.reset();
        assert!(!t.tail_off());
    }

    #[test]
    fn diff_compares_against_older_values() {
        let mut t = TailOff::new(4, 1.0);
        t.update(100.0);
        t.update(99.0);
        t.update(98.0);
        let d = t.diff(2).unwrap();
        assert!((d - 2.0).abs() < 1.0e-9);
    }
}
