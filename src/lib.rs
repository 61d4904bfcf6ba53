//! # Trackforge: Particle-Track Data Preparation Pipeline
//!
//! Trackforge turns raw detector events into validated, padded training
//! batches for transverse-momentum regression. Two branches feed the same
//! batch contract:
//!
//! - **Archive**: per-event tabular record sets are loaded from disk,
//!   reconstructed into per-particle hit sequences, checked against a
//!   conformal-mapping curvature fit, and streamed across
//!   worker-partitioned event sub-ranges.
//! - **Synthetic**: a toy barrel detector generates unbounded single-track
//!   events on the fly, optionally materialized into an index-addressable
//!   train/val/test cache.
//!
//! The crate produces tensors and masks only; it never trains or evaluates
//! a model.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trackforge::pipeline::PipelineBuilder;
//!
//! # async fn run() -> trackforge::Result<()> {
//! let pipeline = PipelineBuilder::new("data/archive/train")
//!     .batch_size(20)
//!     .num_workers(4)
//!     .build()?;
//!
//! let mut stream = pipeline.batches()?;
//! while let Some(batch) = stream.next_batch().await {
//!     let batch = batch?;
//!     println!("batch of {} padded tracks", batch.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Synthetic branch
//!
//! ```rust
//! use trackforge::cache::FiniteDatasetCache;
//! use trackforge::synth::{GeneratorConfig, SyntheticTrackSource, ToyEventGenerator};
//!
//! # fn main() -> trackforge::Result<()> {
//! let source = SyntheticTrackSource::new(
//!     ToyEventGenerator::seeded(GeneratorConfig::default(), 42),
//! );
//! let cache = FiniteDatasetCache::materialize(source, 200)?;
//! let split = cache.split(); // 120 / 40 / 40
//! assert_eq!(cache.partition(&split.train).len(), 120);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod assemble;
pub mod batch;
pub mod cache;
pub mod error;
pub mod event;
pub mod filter;
pub mod fit;
pub mod loader;
pub mod partition;
pub mod pipeline;
pub mod stage;
pub mod stream;
pub mod synth;

pub use error::{Error, Result};
