//! Worker-partitioned prefetch and batching stage
//!
//! One blocking task per worker owns one [`StreamingTrackSource`] over a
//! disjoint event sub-range and feeds a bounded queue; a single consumer
//! drains the queue and collates fixed-size batches. The bounded channel is
//! the backpressure boundary between per-worker production and consumption:
//! production cannot run unboundedly ahead.
//!
//! Within one shard, events are processed in ascending id order and tracks
//! in archive row-group order. There is no cross-worker ordering guarantee;
//! consumers that need global determinism run with one worker.

use crate::batch::{Batch, SequenceBatcher};
use crate::event::TrackSample;
use crate::filter::{QualityFilter, DEFAULT_TOLERANCE};
use crate::loader::{CsvEventLoader, EventLoader};
use crate::partition::EventRange;
use crate::stage::stage_archive;
use crate::stream::StreamingTrackSource;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Maximum number of in-flight samples between workers and the batcher
///
/// Bounded to keep shard workers from racing ahead of consumption.
const PREFETCH_CAPACITY: usize = 256;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Archive split directory (e.g. `<archive>/train`)
    pub data_path: PathBuf,
    /// Optional fast-storage staging target; staged before partitioning
    pub staging_path: Option<PathBuf>,
    /// Samples per collated batch
    pub batch_size: usize,
    /// Number of shard workers
    pub num_workers: u64,
    /// Quality-filter tolerance
    pub tolerance: f64,
}

/// Builder for [`TrackPipeline`]
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Start a builder over an archive split directory
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            config: PipelineConfig {
                data_path: data_path.into(),
                staging_path: None,
                batch_size: 20,
                num_workers: 1,
                tolerance: DEFAULT_TOLERANCE,
            },
        }
    }

    /// Stage the archive to this fast-storage path before streaming
    #[must_use]
    pub fn staging_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.staging_path = Some(path.into());
        self
    }

    /// Samples per batch
    #[must_use]
    pub const fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Number of shard workers
    #[must_use]
    pub const fn num_workers(mut self, num_workers: u64) -> Self {
        self.config.num_workers = num_workers;
        self
    }

    /// Quality-filter tolerance
    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Stage (if configured), discover the event range, and build
    ///
    /// Staging is a blocking prerequisite: it completes before the
    /// partitioner ever sees the relocated archive.
    ///
    /// # Errors
    ///
    /// Returns an error if staging fails, the archive directory cannot be
    /// read, it contains no event entries, or the configuration is invalid.
    pub fn build(self) -> Result<TrackPipeline> {
        let mut config = self.config;
        if config.batch_size == 0 {
            return Err(crate::Error::InvalidInput(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if let Some(staged) = config.staging_path.take() {
            stage_archive(&config.data_path, &staged)?;
            config.data_path = staged;
        }
        let range = EventRange::discover(&config.data_path)?;
        // Fail fast on a bad worker count before any task spawns.
        range.subrange(config.num_workers, 0)?;
        tracing::info!(
            start = range.start,
            end = range.end,
            workers = config.num_workers,
            "pipeline built"
        );
        Ok(TrackPipeline { config, range })
    }
}

/// A built pipeline over one archive split
pub struct TrackPipeline {
    config: PipelineConfig,
    range: EventRange,
}

impl TrackPipeline {
    /// Full discovered event range of the split
    #[must_use]
    pub const fn range(&self) -> EventRange {
        self.range
    }

    /// Spawn the shard workers and return the batch stream
    ///
    /// Each worker owns one [`StreamingTrackSource`] over its sub-range and
    /// pushes samples into the bounded prefetch queue until its shard is
    /// exhausted or the stream is dropped. Uses the default CSV loader.
    ///
    /// # Errors
    ///
    /// Returns an error if sub-range computation fails.
    pub fn batches(&self) -> Result<BatchStream> {
        self.batches_with(CsvEventLoader::new)
    }

    /// Spawn shard workers with a custom loader factory
    ///
    /// The factory is called once per worker; each worker owns its loader.
    ///
    /// # Errors
    ///
    /// Returns an error if sub-range computation fails.
    pub fn batches_with<L, F>(&self, make_loader: F) -> Result<BatchStream>
    where
        L: EventLoader + 'static,
        F: Fn() -> L,
    {
        let (sender, receiver) = mpsc::channel::<Result<TrackSample>>(PREFETCH_CAPACITY);
        for worker_id in 0..self.config.num_workers {
            let shard = self.range.subrange(self.config.num_workers, worker_id)?;
            let source = StreamingTrackSource::with_filter(
                make_loader(),
                self.config.data_path.clone(),
                shard,
                QualityFilter::new(self.config.tolerance),
            );
            let sender = sender.clone();
            tokio::task::spawn_blocking(move || {
                tracing::debug!(worker_id, start = shard.start, end = shard.end, "shard worker started");
                for item in source {
                    // A closed channel means the consumer dropped the
                    // stream; abandon in-flight work.
                    if sender.blocking_send(item).is_err() {
                        return;
                    }
                }
                tracing::debug!(worker_id, "shard worker finished");
            });
        }
        drop(sender);
        Ok(BatchStream {
            receiver,
            batch_size: self.config.batch_size,
            batcher: SequenceBatcher::new(),
            pending: Vec::new(),
        })
    }
}

/// Asynchronous stream of collated batches
pub struct BatchStream {
    receiver: mpsc::Receiver<Result<TrackSample>>,
    batch_size: usize,
    batcher: SequenceBatcher,
    pending: Vec<TrackSample>,
}

impl BatchStream {
    /// Receive the next batch
    ///
    /// Collects up to `batch_size` samples from the prefetch queue; the
    /// final batch of an epoch may be shorter. Returns `None` once every
    /// shard is exhausted. A shard error terminates only the owning shard:
    /// it is surfaced once, samples already collected are held back for the
    /// following call, and healthy shards keep delivering afterwards.
    ///
    /// # Errors
    ///
    /// Propagates a shard's load error, or a collation error.
    pub async fn next_batch(&mut self) -> Option<Result<Batch>> {
        let mut samples = std::mem::take(&mut self.pending);
        samples.reserve(self.batch_size.saturating_sub(samples.len()));
        while samples.len() < self.batch_size {
            match self.receiver.recv().await {
                Some(Ok(sample)) => samples.push(sample),
                Some(Err(e)) => {
                    // Valid samples from before the error (including peer
                    // shards') must not vanish with it.
                    self.pending = samples;
                    return Some(Err(e));
                }
                None => break,
            }
        }
        if samples.is_empty() {
            return None;
        }
        Some(self.batcher.collate(&samples))
    }
}
