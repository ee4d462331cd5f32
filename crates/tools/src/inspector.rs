use cubefield_common::Rgb;
use cubefield_kernel::{FieldState, Simulation};
use glam::Vec3;
use rand::Rng;
use std::fmt;

/// Read-only queries against a running simulation, for the panel and logs.
pub struct FieldInspector;

impl FieldInspector {
    pub fn summary<R: Rng>(sim: &Simulation<R>) -> FieldSummary {
        let field = sim.field();
        let (min, max) = field.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(p.position()), hi.max(p.position())),
        );
        FieldSummary {
            tick: sim.tick_count(),
            seed: sim.seed(),
            particle_count: field.len(),
            cap: sim.config().cap,
            state: sim.state(),
            pending_events: field.events().len(),
            extent: (!field.is_empty()).then_some((min, max)),
        }
    }

    /// Details of the particle at `index`, in field order.
    pub fn inspect_particle<R: Rng>(sim: &Simulation<R>, index: usize) -> Option<ParticleInfo> {
        sim.field().particles().get(index).map(|p| ParticleInfo {
            index,
            size: p.size().to_array(),
            color: p.color(),
            position: p.position().to_array(),
            rotation: p.transform().rotation.to_array(),
        })
    }
}

/// Summary of the simulation state for the inspector.
#[derive(Debug, Clone)]
pub struct FieldSummary {
    pub tick: u64,
    pub seed: Option<u64>,
    pub particle_count: usize,
    pub cap: usize,
    pub state: FieldState,
    pub pending_events: usize,
    /// Axis-aligned bounds of live particle positions.
    pub extent: Option<(Vec3, Vec3)>,
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seed = self
            .seed
            .map_or_else(|| "entropy".to_string(), |s| s.to_string());
        write!(
            f,
            "Field: tick={} seed={} particles={}/{} state={:?} pending_events={}",
            self.tick, seed, self.particle_count, self.cap, self.state, self.pending_events
        )
    }
}

/// Detailed info about a single particle.
#[derive(Debug, Clone)]
pub struct ParticleInfo {
    pub index: usize,
    pub size: [f32; 3],
    pub color: Rgb,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl fmt::Display for ParticleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cube-{} size=({:.2}, {:.2}, {:.2}) color={} pos=({:.2}, {:.2}, {:.2})",
            self.index,
            self.size[0],
            self.size[1],
            self.size[2],
            self.color,
            self.position[0],
            self.position[1],
            self.position[2],
        )
    }
}
