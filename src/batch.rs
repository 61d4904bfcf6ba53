//! Variable-length sequence batching
//!
//! Collates a list of (positions, mask, target) samples of differing
//! sequence length into one padded positions tensor, a matching validity
//! mask, and a stacked target tensor. Pure and stateless; applied
//! identically to archive and synthetic samples, modulo target shape.
//! Padded position values are zero by construction but unconstrained by
//! contract: consumers must ignore them via the mask.

use crate::event::TrackSample;
use crate::{Error, Result};
use ndarray::{Array1, Array2, Array3};

/// Stacked regression targets of one batch
#[derive(Debug, Clone, PartialEq)]
pub enum TargetTensor {
    /// One scalar target per sample, shape `[batch]` (synthetic pT)
    Vector(Array1<f64>),
    /// One target row per sample, shape `[batch, target_dim]` (archive pT/pz)
    Matrix(Array2<f64>),
}

/// One collated batch
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Padded positions, shape `[batch, max_len, coord_dim]`
    pub positions: Array3<f64>,
    /// Validity mask, shape `[batch, max_len]`; false marks padding
    pub mask: Array2<bool>,
    /// Stacked targets
    pub targets: TargetTensor,
}

impl Batch {
    /// Number of samples in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.shape()[0]
    }

    /// True if the batch holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collates samples into padded batches
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceBatcher;

impl SequenceBatcher {
    /// Create a batcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Collate a non-empty list of samples
    ///
    /// Positions are padded with zeros to the batch maximum length and the
    /// mask is padded with false. Single-component targets stack to a
    /// `[batch]` vector (the singleton dimension is dropped);
    /// multi-component targets stack row-wise to `[batch, target_dim]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatch`] for an empty list, mismatched
    /// coordinate dimensions, or mismatched target dimensions.
    pub fn collate(&self, samples: &[TrackSample]) -> Result<Batch> {
        let Some(first) = samples.first() else {
            return Err(Error::InvalidBatch("empty sample list".to_string()));
        };
        let coord_dim = first.coord_dim();
        let target_dim = first.target.len();
        let max_len = samples.iter().map(TrackSample::len).max().unwrap_or(0);

        for (i, sample) in samples.iter().enumerate() {
            if sample.coord_dim() != coord_dim {
                return Err(Error::InvalidBatch(format!(
                    "sample {i} has coordinate dimension {} (expected {coord_dim})",
                    sample.coord_dim()
                )));
            }
            if sample.target.len() != target_dim {
                return Err(Error::InvalidBatch(format!(
                    "sample {i} has target dimension {} (expected {target_dim})",
                    sample.target.len()
                )));
            }
            if sample.mask.len() != sample.len() {
                return Err(Error::InvalidBatch(format!(
                    "sample {i} mask length {} does not match sequence length {}",
                    sample.mask.len(),
                    sample.len()
                )));
            }
        }

        let mut positions = Array3::<f64>::zeros((samples.len(), max_len, coord_dim));
        let mut mask = Array2::<bool>::default((samples.len(), max_len));
        for (i, sample) in samples.iter().enumerate() {
            for (j, (pos, &valid)) in sample.positions.iter().zip(&sample.mask).enumerate() {
                for (k, &coord) in pos.iter().enumerate() {
                    positions[[i, j, k]] = coord;
                }
                mask[[i, j]] = valid;
            }
        }

        let targets = if target_dim == 1 {
            TargetTensor::Vector(Array1::from_iter(
                samples.iter().map(|s| s.target[0]),
            ))
        } else {
            let mut stacked = Array2::<f64>::zeros((samples.len(), target_dim));
            for (i, sample) in samples.iter().enumerate() {
                for (k, &t) in sample.target.iter().enumerate() {
                    stacked[[i, k]] = t;
                }
            }
            TargetTensor::Matrix(stacked)
        };

        Ok(Batch {
            positions,
            mask,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize, coord_dim: usize, target: Vec<f64>) -> TrackSample {
        TrackSample {
            positions: (0..len)
                .map(|i| (0..coord_dim).map(|k| (i * 10 + k) as f64).collect())
                .collect(),
            mask: vec![true; len],
            target,
        }
    }

    #[test]
    fn test_mask_counts_per_row() {
        let samples = vec![
            sample(3, 3, vec![1.0, 0.1]),
            sample(7, 3, vec![2.0, 0.2]),
            sample(5, 3, vec![3.0, 0.3]),
        ];
        let batch = SequenceBatcher::new().collate(&samples).unwrap();

        assert_eq!(batch.positions.shape(), &[3, 7, 3]);
        assert_eq!(batch.mask.shape(), &[3, 7]);
        for (i, expected_len) in [3usize, 7, 5].into_iter().enumerate() {
            let true_count = batch.mask.row(i).iter().filter(|&&m| m).count();
            assert_eq!(true_count, expected_len, "row {i}");
            let false_count = batch.mask.row(i).iter().filter(|&&m| !m).count();
            assert_eq!(false_count, 7 - expected_len, "row {i}");
        }
    }

    #[test]
    fn test_real_positions_survive_padding() {
        let samples = vec![sample(2, 2, vec![1.5]), sample(4, 2, vec![2.5])];
        let batch = SequenceBatcher::new().collate(&samples).unwrap();
        assert!((batch.positions[[0, 1, 1]] - 11.0).abs() < 1e-12);
        // Padded slots are zero and masked out.
        assert!((batch.positions[[0, 3, 0]]).abs() < 1e-12);
        assert!(!batch.mask[[0, 3]]);
    }

    #[test]
    fn test_scalar_targets_squeeze_to_vector() {
        let samples = vec![sample(2, 2, vec![1.5]), sample(3, 2, vec![2.5])];
        let batch = SequenceBatcher::new().collate(&samples).unwrap();
        match batch.targets {
            TargetTensor::Vector(v) => assert_eq!(v.to_vec(), vec![1.5, 2.5]),
            TargetTensor::Matrix(_) => panic!("expected squeezed vector targets"),
        }
    }

    #[test]
    fn test_pair_targets_stack_rowwise() {
        let samples = vec![sample(2, 3, vec![1.0, -1.0]), sample(2, 3, vec![2.0, -2.0])];
        let batch = SequenceBatcher::new().collate(&samples).unwrap();
        match batch.targets {
            TargetTensor::Matrix(m) => {
                assert_eq!(m.shape(), &[2, 2]);
                assert!((m[[1, 0]] - 2.0).abs() < 1e-12);
                assert!((m[[1, 1]] + 2.0).abs() < 1e-12);
            }
            TargetTensor::Vector(_) => panic!("expected row-stacked targets"),
        }
    }

    #[test]
    fn test_equal_lengths_give_all_true_mask() {
        let samples = vec![sample(4, 3, vec![1.0, 0.0]); 6];
        let batch = SequenceBatcher::new().collate(&samples).unwrap();
        assert!(batch.mask.iter().all(|&m| m));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let result = SequenceBatcher::new().collate(&[]);
        assert!(matches!(result, Err(Error::InvalidBatch(_))));
    }

    #[test]
    fn test_mixed_coord_dims_rejected() {
        let samples = vec![sample(2, 2, vec![1.0]), sample(2, 3, vec![2.0])];
        let result = SequenceBatcher::new().collate(&samples);
        assert!(matches!(result, Err(Error::InvalidBatch(_))));
    }
}
