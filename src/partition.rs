//! Event-range discovery and worker partitioning
//!
//! The archive encodes event ids as zero-padded decimal prefixes of its
//! directory entries. Discovery sorts the entries lexically and derives the
//! half-open id range [start, end) from the first and last. Partitioning is
//! computed once up front (no work stealing), so shard ordering stays
//! deterministic and reproducible for a fixed worker count.

use crate::event::EVENT_PREFIX;
use crate::{Error, Result};
use std::path::Path;

/// Half-open interval [start, end) of event ids assigned to one consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRange {
    /// First event id in the range
    pub start: u64,
    /// One past the last event id in the range
    pub end: u64,
}

impl EventRange {
    /// Number of event ids in this range
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// True if the range contains no ids
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Iterate the event ids of this range in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u64> {
        self.start..self.end
    }

    /// Discover the full event-id range of an archive directory
    ///
    /// Entries are sorted lexically; the leading id of the first entry gives
    /// `start` and the leading id of the last entry plus one gives `end`.
    /// Entries without the event prefix are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyArchive`] if no entry carries a parseable event
    /// id, and [`Error::Io`] if the directory cannot be read.
    pub fn discover(archive_dir: &Path) -> Result<Self> {
        let mut names: Vec<String> = std::fs::read_dir(archive_dir)?
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| parse_event_id(name).is_some())
            .collect();
        names.sort_unstable();

        match (names.first(), names.last()) {
            (Some(first), Some(last)) => {
                // The filter above guarantees both parse.
                let start = parse_event_id(first).unwrap_or(0);
                let end = parse_event_id(last).unwrap_or(0) + 1;
                Ok(Self { start, end })
            }
            _ => Err(Error::EmptyArchive {
                path: archive_dir.display().to_string(),
            }),
        }
    }

    /// Sub-range assigned to worker `worker_id` out of `num_workers`
    ///
    /// Spans are ⌈len/N⌉ wide, contiguous and non-overlapping, and their
    /// union over all workers reconstructs the full range; only the last
    /// worker's span may be shorter. With a single worker the sole consumer
    /// gets the full range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `num_workers` is zero or
    /// `worker_id` is out of bounds.
    pub fn subrange(&self, num_workers: u64, worker_id: u64) -> Result<Self> {
        if num_workers == 0 {
            return Err(Error::InvalidInput(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if worker_id >= num_workers {
            return Err(Error::InvalidInput(format!(
                "worker_id {worker_id} out of range for {num_workers} workers"
            )));
        }
        let span = self.len().div_ceil(num_workers);
        let start = self.start.saturating_add(worker_id.saturating_mul(span));
        Ok(Self {
            start: start.min(self.end),
            end: start.saturating_add(span).min(self.end),
        })
    }
}

/// Parse the leading zero-padded event id of a directory-entry name
///
/// Accepts `event<id>` and `event<id>-<suffix>` forms.
fn parse_event_id(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(EVENT_PREFIX)?;
    let digits = digits
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .filter(|s| !s.is_empty())?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_dir_name;

    fn archive_with_events(ids: &[u64]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for &id in ids {
            std::fs::create_dir(dir.path().join(event_dir_name(id))).unwrap();
        }
        dir
    }

    #[test]
    fn test_discover_min_max_plus_one() {
        let dir = archive_with_events(&[3, 4, 5, 9]);
        let range = EventRange::discover(dir.path()).unwrap();
        assert_eq!(range, EventRange { start: 3, end: 10 });
    }

    #[test]
    fn test_discover_ignores_foreign_entries() {
        let dir = archive_with_events(&[0, 1]);
        std::fs::create_dir(dir.path().join("README")).unwrap();
        let range = EventRange::discover(dir.path()).unwrap();
        assert_eq!(range, EventRange { start: 0, end: 2 });
    }

    #[test]
    fn test_discover_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = EventRange::discover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::EmptyArchive { .. }));
    }

    #[test]
    fn test_single_worker_gets_full_range() {
        let range = EventRange { start: 5, end: 17 };
        assert_eq!(range.subrange(1, 0).unwrap(), range);
    }

    #[test]
    fn test_subranges_partition_the_range() {
        let range = EventRange { start: 0, end: 10 };
        for n in 1..=12 {
            let mut covered = Vec::new();
            let mut prev_end = range.start;
            for w in 0..n {
                let sub = range.subrange(n, w).unwrap();
                assert!(sub.start >= prev_end, "overlap at worker {w}");
                assert_eq!(sub.start, prev_end.max(sub.start));
                covered.extend(sub.iter());
                prev_end = sub.end.max(prev_end);
            }
            assert_eq!(covered, (0..10).collect::<Vec<_>>(), "n = {n}");
        }
    }

    #[test]
    fn test_last_worker_may_be_short() {
        let range = EventRange { start: 0, end: 10 };
        // span = ceil(10/4) = 3: 3 + 3 + 3 + 1
        assert_eq!(range.subrange(4, 0).unwrap().len(), 3);
        assert_eq!(range.subrange(4, 3).unwrap().len(), 1);
    }

    #[test]
    fn test_more_workers_than_events() {
        let range = EventRange { start: 0, end: 3 };
        let lens: Vec<u64> = (0..5)
            .map(|w| range.subrange(5, w).unwrap().len())
            .collect();
        assert_eq!(lens.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let range = EventRange { start: 0, end: 3 };
        assert!(range.subrange(0, 0).is_err());
        assert!(range.subrange(2, 2).is_err());
    }

    #[test]
    fn test_parse_event_id_forms() {
        assert_eq!(parse_event_id("event000000021"), Some(21));
        assert_eq!(parse_event_id("event000000021-hits.csv"), Some(21));
        assert_eq!(parse_event_id("event"), None);
        assert_eq!(parse_event_id("run000000021"), None);
    }
}
