//! Physics-based track quality filter
//!
//! Structurally valid tracks can still be kinematically inconsistent
//! (mis-association, detector-resolution artifacts). The filter re-estimates
//! pT from the hit curvature and accepts a track only when the estimate
//! agrees with the stated truth within tolerance, so bad reconstructions
//! never reach training.

use crate::event::Track;
use crate::fit::estimate_pt;

/// Default absolute agreement tolerance between fit and truth pT
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Accepts tracks whose curvature fit agrees with the truth pT
#[derive(Debug, Clone, Copy)]
pub struct QualityFilter {
    tolerance: f64,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl QualityFilter {
    /// Create a filter with the given absolute tolerance
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Agreement tolerance of this filter
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// True iff the track's fitted pT agrees with its truth pT
    ///
    /// Acceptance is strict: an error exactly equal to the tolerance is
    /// rejected. A degenerate fit counts as rejection, never as a fatal
    /// error.
    #[must_use]
    pub fn accept(&self, track: &Track) -> bool {
        match estimate_pt(&track.positions) {
            Ok(estimate) => (estimate - track.pt).abs() < self.tolerance,
            Err(_) => false,
        }
    }
}
