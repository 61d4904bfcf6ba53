//! Track assembly from raw event record sets
//!
//! Joins Truth↔Particles on `particle_id` and the result↔Hits on `hit_id`,
//! then groups the joined rows by particle. Particles under the minimum hit
//! count are dropped up front. Within a group, hit positions keep archive
//! row order; groups are emitted in ascending `particle_id` order.

use crate::event::{EventRecords, Track, MIN_HITS};
use std::collections::{BTreeMap, HashMap};

/// Assembles one [`Track`] per qualifying particle of an event
///
/// Deterministic and side-effect free; order-independent across particles.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackAssembler {
    min_hits: u32,
}

impl TrackAssembler {
    /// Create an assembler with the default minimum-hit threshold
    #[must_use]
    pub const fn new() -> Self {
        Self { min_hits: MIN_HITS }
    }

    /// Create an assembler with a custom minimum-hit threshold
    #[must_use]
    pub const fn with_min_hits(min_hits: u32) -> Self {
        Self { min_hits }
    }

    /// Reconstruct the tracks of one event
    ///
    /// Returns one track per particle whose stated hit count meets the
    /// threshold, with position-sequence length equal to that particle's
    /// joined-row count. Truth rows referencing unknown particles or hits
    /// are skipped.
    #[must_use]
    pub fn assemble(&self, records: &EventRecords) -> Vec<Track> {
        let particles: HashMap<u64, _> = records
            .particles
            .iter()
            .filter(|p| p.nhits >= self.min_hits)
            .map(|p| (p.particle_id, p))
            .collect();
        let hits: HashMap<u64, _> = records.hits.iter().map(|h| (h.hit_id, h)).collect();

        // BTreeMap keys the groups in ascending particle_id order; pushing
        // truth rows in file order keeps archive row order within a group.
        let mut groups: BTreeMap<u64, Vec<[f64; 3]>> = BTreeMap::new();
        for row in &records.truth {
            if !particles.contains_key(&row.particle_id) {
                continue;
            }
            if let Some(hit) = hits.get(&row.hit_id) {
                groups
                    .entry(row.particle_id)
                    .or_default()
                    .push([hit.x, hit.y, hit.z]);
            }
        }

        groups
            .into_iter()
            .map(|(particle_id, positions)| {
                let particle = particles[&particle_id];
                Track {
                    particle_id,
                    positions,
                    pt: particle.pt(),
                    pz: particle.pz,
                }
            })
            .collect()
    }
}
