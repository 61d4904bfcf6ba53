//! Archive event loader
//!
//! One archive event is a directory holding four CSV record sets
//! (`hits.csv`, `cells.csv`, `particles.csv`, `truth.csv`). The loader reads
//! them with Arrow's CSV reader (schema inference, then column-by-name
//! downcasting) into the typed record sets of [`crate::event`]. Loading is
//! deterministic for a given path; any failure is surfaced as
//! [`Error::EventLoad`] and treated as fatal for that event's shard.

use crate::event::{CellRecord, EventRecords, HitRecord, ParticleRecord, TruthRecord};
use crate::{Error, Result};
use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, UInt64Array};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

/// Loader returning the four record sets of one event
///
/// External archive formats plug in behind this trait; the pipeline itself
/// never touches files directly.
pub trait EventLoader: Send + Sync {
    /// Load the record sets stored under `event_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if any record-set file is missing or unparseable.
    fn load_event(&self, event_dir: &Path) -> Result<EventRecords>;
}

/// CSV-backed archive loader
///
/// Reads the four per-event CSV files with header rows and id-joinable key
/// columns named as in [`crate::event`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvEventLoader;

impl CsvEventLoader {
    /// Create a new CSV loader
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Read one CSV file into a single combined record batch
    fn read_table(path: &Path) -> Result<RecordBatch> {
        let mut file = File::open(path)?;
        let format = Format::default().with_header(true);
        let (schema, _) = format.infer_schema(&mut file, None)?;
        file.rewind()?;

        let reader = ReaderBuilder::new(Arc::new(schema))
            .with_format(format)
            .build(file)?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        if batches.is_empty() {
            return Err(Error::InvalidInput(format!(
                "empty record set: {}",
                path.display()
            )));
        }
        Ok(arrow::compute::concat_batches(
            &batches[0].schema(),
            &batches,
        )?)
    }
}

impl EventLoader for CsvEventLoader {
    fn load_event(&self, event_dir: &Path) -> Result<EventRecords> {
        let hits = Self::read_table(&event_dir.join("hits.csv"))?;
        let cells = Self::read_table(&event_dir.join("cells.csv"))?;
        let particles = Self::read_table(&event_dir.join("particles.csv"))?;
        let truth = Self::read_table(&event_dir.join("truth.csv"))?;

        let hit_ids = column_u64(&hits, "hit_id")?;
        let xs = column_f64(&hits, "x")?;
        let ys = column_f64(&hits, "y")?;
        let zs = column_f64(&hits, "z")?;
        let hits = (0..hits.num_rows())
            .map(|i| HitRecord {
                hit_id: hit_ids[i],
                x: xs[i],
                y: ys[i],
                z: zs[i],
            })
            .collect();

        let cell_hit_ids = column_u64(&cells, "hit_id")?;
        let cell_values = column_f64(&cells, "value")?;
        let cells = cell_hit_ids
            .into_iter()
            .zip(cell_values)
            .map(|(hit_id, value)| CellRecord { hit_id, value })
            .collect();

        let particle_ids = column_u64(&particles, "particle_id")?;
        let pxs = column_f64(&particles, "px")?;
        let pys = column_f64(&particles, "py")?;
        let pzs = column_f64(&particles, "pz")?;
        let nhits = column_u64(&particles, "nhits")?;
        let particles = (0..particles.num_rows())
            .map(|i| ParticleRecord {
                particle_id: particle_ids[i],
                px: pxs[i],
                py: pys[i],
                pz: pzs[i],
                nhits: u32::try_from(nhits[i]).unwrap_or(u32::MAX),
            })
            .collect();

        let truth_hit_ids = column_u64(&truth, "hit_id")?;
        let truth_particle_ids = column_u64(&truth, "particle_id")?;
        let weights = column_f64(&truth, "weight")?;
        let truth = (0..truth_hit_ids.len())
            .map(|i| TruthRecord {
                hit_id: truth_hit_ids[i],
                particle_id: truth_particle_ids[i],
                weight: weights[i],
            })
            .collect();

        Ok(EventRecords {
            hits,
            cells,
            particles,
            truth,
        })
    }
}

/// Extract an integer key column as u64, accepting Int64 or UInt64 storage
fn column_u64(batch: &RecordBatch, name: &str) -> Result<Vec<u64>> {
    let column = find_column(batch, name)?;
    if let Some(array) = column.as_any().downcast_ref::<UInt64Array>() {
        return Ok(array.values().to_vec());
    }
    if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
        return array
            .values()
            .iter()
            .map(|&v| {
                u64::try_from(v).map_err(|_| {
                    Error::InvalidInput(format!("negative id in column {name}: {v}"))
                })
            })
            .collect();
    }
    Err(Error::InvalidInput(format!(
        "column {name} is not an integer column (got {:?})",
        column.data_type()
    )))
}

/// Extract a numeric column as f64, accepting Float64 or Int64 storage
fn column_f64(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let column = find_column(batch, name)?;
    if let Some(array) = column.as_any().downcast_ref::<Float64Array>() {
        return Ok(array.values().to_vec());
    }
    if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
        #[allow(clippy::cast_precision_loss)]
        return Ok(array.values().iter().map(|&v| v as f64).collect());
    }
    Err(Error::InvalidInput(format!(
        "column {name} is not a numeric column (got {:?})",
        column.data_type()
    )))
}

fn find_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::InvalidInput(format!("column not found: {name}")))
}
