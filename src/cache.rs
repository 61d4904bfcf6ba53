//! Finite materialization of a synthetic stream
//!
//! Eagerly pulls a fixed number of samples at construction and exposes
//! index-addressable, splittable storage for non-streaming consumption.
//! Construction is the only point of interaction with the generator; all
//! later access is pure lookup.

use crate::event::TrackSample;
use crate::{Error, Result};
use std::ops::Range;

/// Default train/validation/test proportions
pub const DEFAULT_SPLIT: (f64, f64) = (0.6, 0.2);

/// Eagerly materialized, index-addressable sample store
#[derive(Debug, Clone)]
pub struct FiniteDatasetCache {
    samples: Vec<TrackSample>,
}

/// Disjoint train/validation/test index ranges over a cache
///
/// The three ranges are contiguous, non-overlapping, and always sum exactly
/// to the cache size: train and validation lengths are floor divisions of
/// the proportions and the remainder goes entirely to test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSplit {
    /// Training index range
    pub train: Range<usize>,
    /// Validation index range
    pub val: Range<usize>,
    /// Test index range
    pub test: Range<usize>,
}

impl FiniteDatasetCache {
    /// Materialize `count` samples from a source
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the source runs out before `count`
    /// samples are produced.
    pub fn materialize(
        source: impl Iterator<Item = TrackSample>,
        count: usize,
    ) -> Result<Self> {
        let samples: Vec<TrackSample> = source.take(count).collect();
        if samples.len() < count {
            return Err(Error::InvalidInput(format!(
                "source exhausted after {} of {count} samples",
                samples.len()
            )));
        }
        tracing::debug!(count, "dataset cache materialized");
        Ok(Self { samples })
    }

    /// Number of cached samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the cache holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at index `idx`
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&TrackSample> {
        self.samples.get(idx)
    }

    /// All cached samples
    #[must_use]
    pub fn samples(&self) -> &[TrackSample] {
        &self.samples
    }

    /// Deterministic split with the default 60/20/20 proportions
    #[must_use]
    pub fn split(&self) -> DatasetSplit {
        self.split_with(DEFAULT_SPLIT.0, DEFAULT_SPLIT.1)
    }

    /// Deterministic split with the given train/validation proportions
    ///
    /// The test partition takes everything past the two floor-divided
    /// prefixes, so the partitions always sum exactly to the cache size.
    #[must_use]
    pub fn split_with(&self, train_frac: f64, val_frac: f64) -> DatasetSplit {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let train_len = (self.len() as f64 * train_frac).floor() as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let val_len = (self.len() as f64 * val_frac).floor() as usize;
        let train_end = train_len.min(self.len());
        let val_end = (train_end + val_len).min(self.len());
        DatasetSplit {
            train: 0..train_end,
            val: train_end..val_end,
            test: val_end..self.len(),
        }
    }

    /// Samples of one split partition
    #[must_use]
    pub fn partition(&self, range: &Range<usize>) -> &[TrackSample] {
        &self.samples[range.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{GeneratorConfig, SyntheticTrackSource, ToyEventGenerator};

    fn cache_of(count: usize) -> FiniteDatasetCache {
        let source =
            SyntheticTrackSource::new(ToyEventGenerator::seeded(GeneratorConfig::default(), 2));
        FiniteDatasetCache::materialize(source, count).unwrap()
    }

    #[test]
    fn test_materialize_exact_count() {
        let cache = cache_of(50);
        assert_eq!(cache.len(), 50);
        assert!(cache.get(49).is_some());
        assert!(cache.get(50).is_none());
    }

    #[test]
    fn test_default_split_200() {
        let cache = cache_of(200);
        let split = cache.split();
        assert_eq!(split.train.len(), 120);
        assert_eq!(split.val.len(), 40);
        assert_eq!(split.test.len(), 40);
        assert_eq!(split.train.len() + split.val.len() + split.test.len(), 200);
    }

    #[test]
    fn test_split_remainder_goes_to_test() {
        let cache = cache_of(7);
        let split = cache.split();
        // floor(7 * 0.6) = 4, floor(7 * 0.2) = 1, remainder 2 to test.
        assert_eq!(split.train.len(), 4);
        assert_eq!(split.val.len(), 1);
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_split_partitions_disjoint_and_complete() {
        let cache = cache_of(33);
        let split = cache.split_with(0.5, 0.3);
        assert_eq!(split.train.end, split.val.start);
        assert_eq!(split.val.end, split.test.start);
        assert_eq!(split.test.end, cache.len());
        assert_eq!(
            cache.partition(&split.train).len()
                + cache.partition(&split.val).len()
                + cache.partition(&split.test).len(),
            33
        );
    }

    #[test]
    fn test_exhausted_source_rejected() {
        let source =
            SyntheticTrackSource::new(ToyEventGenerator::seeded(GeneratorConfig::default(), 2));
        let finite = source.take(10);
        let result = FiniteDatasetCache::materialize(finite, 20);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
