//! Error types for trackforge
//!
//! Structural errors (missing archive, bad configuration) surface immediately
//! and terminate setup. Per-track numerical issues (`DegenerateFit`) are
//! absorbed by the quality filter and only reduce yield. Per-event load
//! failures terminate the owning shard's stream, never the whole pipeline.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trackforge error types
#[derive(Error, Debug)]
pub enum Error {
    /// No event entries found under an archive directory
    #[error("no event entries found in archive directory: {path}")]
    EmptyArchive {
        /// Directory that was scanned for event entries
        path: String,
    },

    /// Archive loader failed for one event (fatal to the owning shard)
    #[error("failed to load event {event_id}: {reason}")]
    EventLoad {
        /// Event id whose record sets could not be loaded
        event_id: u64,
        /// Underlying loader failure
        reason: String,
    },

    /// Conformal fit is numerically unfit for this track
    ///
    /// Treated as a rejected track by the quality filter, not as a fatal
    /// pipeline error.
    #[error("degenerate conformal fit: {0}")]
    DegenerateFit(String),

    /// Staging the archive to fast storage failed
    ///
    /// An already-populated staging target is idempotent and does not
    /// produce this error.
    #[error("archive staging failed: {0}")]
    StagingFailure(String),

    /// A batch cannot be collated (empty, or mixed coordinate dimensions)
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error (CSV record-set parsing)
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
