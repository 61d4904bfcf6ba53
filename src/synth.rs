//! Synthetic track generation
//!
//! A toy barrel detector and particle gun produce single-track events on the
//! fly: one particle per event, a circular transverse trajectory through a
//! smeared vertex, hits at the layer intersections, optional hole
//! inefficiency and noise hits. The generator owns its random state
//! explicitly (seedable, injectable) so independent sources can run with
//! independent or shared-and-synchronized randomness.
//!
//! [`SyntheticTrackSource`] wraps any generator in the same
//! (positions, mask, target) sample contract as the archive branch. The
//! sequence is unbounded and safe to pull indefinitely; it is not
//! restartable from a given point.

use crate::event::TrackSample;
use crate::fit::{MAGNETIC_FIELD, PT_FACTOR};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One generated event: a single particle's kinematics and its 2D hits
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    /// True transverse momentum of the generated particle
    pub pt: f64,
    /// 2D hit positions (transverse plane), layer order then noise hits
    pub hits: Vec<[f64; 2]>,
}

/// Event generator contract
///
/// Stateful internally (randomized); all configuration is supplied at
/// construction and never varies mid-stream.
pub trait EventGenerator {
    /// Generate one event
    fn generate_event(&mut self) -> SimEvent;
}

/// Toy generator configuration
///
/// Defaults follow the reference barrel geometry: 10 layers between radii
/// 0.5 and 3.0, pT uniform in [1, 5], phi uniform in [-pi, pi], Gaussian
/// vertex smearing of scale d0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Uniform pT range [min, max]
    pub pt_range: [f64; 2],
    /// Uniform azimuthal-angle range [min, max]
    pub phi_range: [f64; 2],
    /// Transverse vertex smearing scale
    pub d0: f64,
    /// Innermost layer radius
    pub min_radius: f64,
    /// Outermost layer radius
    pub max_radius: f64,
    /// Number of barrel layers
    pub num_layers: usize,
    /// Probability that a layer crossing leaves no hit
    pub hole_inefficiency: f64,
    /// Expected number of noise hits per event (Poisson)
    pub noise_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            pt_range: [1.0, 5.0],
            phi_range: [-PI, PI],
            d0: 0.1,
            min_radius: 0.5,
            max_radius: 3.0,
            num_layers: 10,
            hole_inefficiency: 0.0,
            noise_rate: 0.0,
        }
    }
}

/// Toy single-particle event generator
pub struct ToyEventGenerator {
    config: GeneratorConfig,
    layers: Vec<f64>,
    vertex_smear: Option<Normal<f64>>,
    rng: StdRng,
}

impl ToyEventGenerator {
    /// Create a generator seeded from OS entropy
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a generator with a fixed seed (reproducible streams)
    #[must_use]
    pub fn seeded(config: GeneratorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Create a generator with injected random state
    #[must_use]
    pub fn with_rng(config: GeneratorConfig, rng: StdRng) -> Self {
        let layers = if config.num_layers < 2 {
            vec![config.min_radius]
        } else {
            let step = (config.max_radius - config.min_radius)
                / (config.num_layers as f64 - 1.0);
            (0..config.num_layers)
                .map(|i| config.min_radius + step * i as f64)
                .collect()
        };
        // d0 * sqrt(1/2) per transverse axis, as in the reference gun.
        let vertex_smear = if config.d0 > 0.0 {
            Normal::new(0.0, config.d0 * 0.5f64.sqrt()).ok()
        } else {
            None
        };
        Self {
            config,
            layers,
            vertex_smear,
            rng,
        }
    }

    /// Intersection of the trajectory circle with a detector layer
    ///
    /// The trajectory is a circle of radius `r_track` centred at `centre`;
    /// the layer is a circle of radius `layer_r` about the origin. Of the
    /// two intersection points the one ahead of the particle's initial
    /// flight direction is kept. Returns None when the layer is not
    /// crossed.
    fn layer_hit(
        centre: [f64; 2],
        r_track: f64,
        layer_r: f64,
        vertex: [f64; 2],
        dir: [f64; 2],
    ) -> Option<[f64; 2]> {
        let d = centre[0].hypot(centre[1]);
        if d == 0.0 {
            return None;
        }
        let a = (layer_r * layer_r - r_track * r_track + d * d) / (2.0 * d);
        let h2 = layer_r * layer_r - a * a;
        if h2 < 0.0 {
            return None;
        }
        let h = h2.sqrt();
        let (ex, ey) = (centre[0] / d, centre[1] / d);
        let base = [a * ex, a * ey];
        let candidates = [
            [base[0] - h * ey, base[1] + h * ex],
            [base[0] + h * ey, base[1] - h * ex],
        ];
        candidates
            .into_iter()
            .max_by(|p, q| {
                let fp = (p[0] - vertex[0]) * dir[0] + (p[1] - vertex[1]) * dir[1];
                let fq = (q[0] - vertex[0]) * dir[0] + (q[1] - vertex[1]) * dir[1];
                fp.total_cmp(&fq)
            })
            .filter(|p| (p[0] - vertex[0]) * dir[0] + (p[1] - vertex[1]) * dir[1] > 0.0)
    }
}

impl EventGenerator for ToyEventGenerator {
    fn generate_event(&mut self) -> SimEvent {
        let cfg = &self.config;
        let pt = self.rng.gen_range(cfg.pt_range[0]..cfg.pt_range[1]);
        let phi = self.rng.gen_range(cfg.phi_range[0]..cfg.phi_range[1]);
        let charge = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };

        let vertex = self.vertex_smear.map_or([0.0, 0.0], |smear| {
            [smear.sample(&mut self.rng), smear.sample(&mut self.rng)]
        });

        // Trajectory circle: radius set by the curvature relation, centre
        // perpendicular to the flight direction at the vertex.
        let r_track = pt / (PT_FACTOR * MAGNETIC_FIELD);
        let dir = [phi.cos(), phi.sin()];
        let centre = [
            vertex[0] - charge * r_track * dir[1],
            vertex[1] + charge * r_track * dir[0],
        ];

        let mut hits = Vec::with_capacity(self.layers.len());
        for &layer_r in &self.layers {
            let Some(hit) = Self::layer_hit(centre, r_track, layer_r, vertex, dir) else {
                continue;
            };
            if cfg.hole_inefficiency > 0.0 && self.rng.gen_bool(cfg.hole_inefficiency) {
                continue;
            }
            hits.push(hit);
        }

        if cfg.noise_rate > 0.0 {
            if let Ok(poisson) = Poisson::new(cfg.noise_rate) {
                let n_noise = poisson.sample(&mut self.rng) as usize;
                for _ in 0..n_noise {
                    let r = self.rng.gen_range(cfg.min_radius..=cfg.max_radius);
                    let theta = self.rng.gen_range(-PI..PI);
                    hits.push([r * theta.cos(), r * theta.sin()]);
                }
            }
        }

        SimEvent { pt, hits }
    }
}

/// Unbounded lazy sequence of synthetic track samples
///
/// Each pull generates one event and emits its hits with an all-true mask
/// and the single-component `[pT]` target. Events that leave no hits at all
/// (every layer crossing lost to inefficiency, no noise) are regenerated
/// rather than emitted: a zero-length sample has no coordinate dimension and
/// would poison any mixed batch. A configuration that can never produce a
/// hit therefore never yields.
pub struct SyntheticTrackSource<G> {
    generator: G,
}

impl<G: EventGenerator> SyntheticTrackSource<G> {
    /// Wrap an event generator
    pub const fn new(generator: G) -> Self {
        Self { generator }
    }
}

impl Default for SyntheticTrackSource<ToyEventGenerator> {
    fn default() -> Self {
        Self::new(ToyEventGenerator::new(GeneratorConfig::default()))
    }
}

impl<G: EventGenerator> Iterator for SyntheticTrackSource<G> {
    type Item = TrackSample;

    fn next(&mut self) -> Option<Self::Item> {
        let event = loop {
            let event = self.generator.generate_event();
            if !event.hits.is_empty() {
                break event;
            }
        };
        let positions: Vec<Vec<f64>> = event.hits.iter().map(|h| h.to_vec()).collect();
        let mask = vec![true; positions.len()];
        Some(TrackSample {
            positions,
            mask,
            target: vec![event.pt],
        })
    }
}
