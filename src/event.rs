//! Event data model
//!
//! One archive event maps to four flat record sets (hits, cells, particles,
//! truth), keyed by archive-scoped unique `hit_id` / `particle_id`. A
//! [`Track`] is the derived entity: the ordered hit positions attributable to
//! one particle within one event, plus its ground-truth kinematics. A
//! [`TrackSample`] is the uniform (positions, mask, target) triple that both
//! the archive and synthetic branches hand to the batcher.

/// Textual prefix of event directory names in the archive
pub const EVENT_PREFIX: &str = "event";

/// Zero-pad width of the decimal event id in directory names
pub const EVENT_ID_WIDTH: usize = 9;

/// Minimum associated-hit count for a particle to qualify as a track
pub const MIN_HITS: u32 = 5;

/// Directory name for an event id (`event` + zero-padded decimal id)
#[must_use]
pub fn event_dir_name(event_id: u64) -> String {
    format!("{EVENT_PREFIX}{event_id:0width$}", width = EVENT_ID_WIDTH)
}

/// One detector measurement: a 3D position keyed by `hit_id`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Archive-scoped unique hit key
    pub hit_id: u64,
    /// Position x
    pub x: f64,
    /// Position y
    pub y: f64,
    /// Position z
    pub z: f64,
}

/// Per-hit readout cell record
///
/// Carried through the loader contract but unused by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRecord {
    /// Hit this cell belongs to
    pub hit_id: u64,
    /// Deposited charge value
    pub value: f64,
}

/// Ground-truth particle kinematics and hit multiplicity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    /// Archive-scoped unique particle key
    pub particle_id: u64,
    /// Momentum x component
    pub px: f64,
    /// Momentum y component
    pub py: f64,
    /// Momentum z component
    pub pz: f64,
    /// Number of hits associated with this particle
    pub nhits: u32,
}

impl ParticleRecord {
    /// Transverse momentum of this particle
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }
}

/// Truth association linking one hit to the particle that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthRecord {
    /// Hit key
    pub hit_id: u64,
    /// Particle key (0 for noise hits with no associated particle)
    pub particle_id: u64,
    /// Association weight
    pub weight: f64,
}

/// The four record sets of one archive event
///
/// Owned by the pipeline for the duration of one iteration step and not
/// retained afterwards.
#[derive(Debug, Clone, Default)]
pub struct EventRecords {
    /// Hit positions
    pub hits: Vec<HitRecord>,
    /// Readout cells (unused downstream)
    pub cells: Vec<CellRecord>,
    /// Particle kinematics
    pub particles: Vec<ParticleRecord>,
    /// Hit-to-particle truth associations
    pub truth: Vec<TruthRecord>,
}

/// One reconstructed track: ordered hit positions plus kinematic target
///
/// Position order is archive row order, not path order; the conformal fit is
/// order-insensitive but consumers must not assume monotonic arrangement.
/// Immutable after assembly, discarded once consumed into a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Particle this track belongs to
    pub particle_id: u64,
    /// Ordered 3D hit positions
    pub positions: Vec<[f64; 3]>,
    /// Ground-truth transverse momentum
    pub pt: f64,
    /// Ground-truth longitudinal momentum
    pub pz: f64,
}

impl Track {
    /// Number of hits in this track
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the track has no hits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Convert into the uniform sample triple
    ///
    /// The mask is all-true: a freshly assembled track has no padding, only
    /// the batcher introduces padded slots.
    #[must_use]
    pub fn into_sample(self) -> TrackSample {
        let mask = vec![true; self.positions.len()];
        let positions = self.positions.into_iter().map(|p| p.to_vec()).collect();
        TrackSample {
            positions,
            mask,
            target: vec![self.pt, self.pz],
        }
    }
}

/// Uniform (positions, validity mask, target) triple
///
/// Produced by both the archive branch (3D positions, 2-component target)
/// and the synthetic branch (2D positions, 1-component target). All rows of
/// `positions` share one coordinate dimension; `mask.len()` equals
/// `positions.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSample {
    /// Hit positions, one coordinate vector per hit
    pub positions: Vec<Vec<f64>>,
    /// Validity mask, true for every real (non-padded) hit
    pub mask: Vec<bool>,
    /// Regression target: `[pT, pz]` (archive) or `[pT]` (synthetic)
    pub target: Vec<f64>,
}

impl TrackSample {
    /// Sequence length of this sample
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the sample has no hits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Coordinate dimensionality, or 0 for an empty sample
    #[must_use]
    pub fn coord_dim(&self) -> usize {
        self.positions.first().map_or(0, Vec::len)
    }
}
