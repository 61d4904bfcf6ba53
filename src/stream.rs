//! Per-shard streaming track source
//!
//! One source owns one event sub-range and walks it in ascending id order:
//! load the event's record sets, assemble tracks, quality-filter them, and
//! yield each accepted track lazily as a [`TrackSample`]. The sequence is
//! finite and non-restartable; reconstructing a source with the same
//! sub-range is idempotent since the archive is immutable.
//!
//! A loader failure for one event id is not retried: it is yielded once as
//! an error and exhausts the shard, since silently skipping an event would
//! change the epoch's effective dataset size unpredictably.

use crate::assemble::TrackAssembler;
use crate::event::{event_dir_name, TrackSample};
use crate::filter::QualityFilter;
use crate::loader::EventLoader;
use crate::partition::EventRange;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::path::PathBuf;

/// Lazy per-shard stream of quality-filtered track samples
pub struct StreamingTrackSource<L> {
    loader: L,
    archive_dir: PathBuf,
    range: EventRange,
    assembler: TrackAssembler,
    filter: QualityFilter,
    next_event: u64,
    pending: VecDeque<TrackSample>,
    exhausted: bool,
}

impl<L: EventLoader> StreamingTrackSource<L> {
    /// Create a source over one shard of an archive split directory
    pub fn new(loader: L, archive_dir: impl Into<PathBuf>, range: EventRange) -> Self {
        Self::with_filter(loader, archive_dir, range, QualityFilter::default())
    }

    /// Create a source with a custom quality filter
    pub fn with_filter(
        loader: L,
        archive_dir: impl Into<PathBuf>,
        range: EventRange,
        filter: QualityFilter,
    ) -> Self {
        Self {
            loader,
            archive_dir: archive_dir.into(),
            range,
            assembler: TrackAssembler::new(),
            filter,
            next_event: range.start,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Sub-range assigned to this source
    #[must_use]
    pub const fn range(&self) -> EventRange {
        self.range
    }

    /// Load the next event and refill the pending-sample buffer
    ///
    /// Returns false once the sub-range is exhausted.
    fn advance_event(&mut self) -> Result<bool> {
        if self.next_event >= self.range.end {
            return Ok(false);
        }
        let event_id = self.next_event;
        self.next_event += 1;

        let event_dir = self.archive_dir.join(event_dir_name(event_id));
        let records = self
            .loader
            .load_event(&event_dir)
            .map_err(|e| Error::EventLoad {
                event_id,
                reason: e.to_string(),
            })?;

        let tracks = self.assembler.assemble(&records);
        let total = tracks.len();
        self.pending.extend(
            tracks
                .into_iter()
                .filter(|t| self.filter.accept(t))
                .map(crate::event::Track::into_sample),
        );
        tracing::debug!(
            event_id,
            assembled = total,
            accepted = self.pending.len(),
            "event processed"
        );
        Ok(true)
    }
}

impl<L: EventLoader> Iterator for StreamingTrackSource<L> {
    type Item = Result<TrackSample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.exhausted {
                return None;
            }
            if let Some(sample) = self.pending.pop_front() {
                return Some(Ok(sample));
            }
            match self.advance_event() {
                Ok(true) => {}
                Ok(false) => {
                    self.exhausted = true;
                    return None;
                }
                Err(e) => {
                    // Fatal to this shard: surface once, then stop.
                    self.exhausted = true;
                    tracing::warn!(error = %e, "shard stream terminated");
                    return Some(Err(e));
                }
            }
        }
    }
}
