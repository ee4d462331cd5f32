use crate::config::{ConfigError, FieldConfig};
use crate::field::{FieldState, ParticleField};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Vertical amplitude of the sine-wave jitter.
pub const WAVE_AMPLITUDE: f32 = 10.0;

/// Live-editable parameters read by every tick.
///
/// The control panel writes these fields; the simulation only reads them,
/// except for `reset_all` which restores the reset values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Added to every particle's x and y rotation per tick.
    pub rotation_speed: f32,
    /// Phase advance of the vertical sine-wave jitter per tick.
    pub wave_frequency: f32,
    /// Run an explode step every tick.
    pub exploding: bool,
    /// Grow one batch per tick until the cap is reached.
    pub auto_grow: bool,
    /// Expand factor, applied through `Simulation::apply_scale`.
    pub expand: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            rotation_speed: 0.0,
            wave_frequency: 0.0,
            exploding: false,
            auto_grow: true,
            expand: 1.0,
        }
    }
}

impl SimParams {
    pub const ROTATION_SPEED_MAX: f32 = 0.5;
    pub const WAVE_FREQUENCY_MAX: f32 = 0.05;
    pub const RESET_ROTATION_SPEED: f32 = 0.01;
}

/// The particle field plus everything needed to advance it one frame.
///
/// Generic over the random source so tests and replays can inject a seeded
/// generator; `Simulation::new` uses `StdRng`.
#[derive(Debug)]
pub struct Simulation<R: Rng = StdRng> {
    field: ParticleField,
    config: FieldConfig,
    rng: R,
    seed: Option<u64>,
    wave_phase: f32,
    tick: u64,
}

impl Simulation<StdRng> {
    /// Validate `config` and build a simulation. `None` seeds from entropy,
    /// which is not reproducible.
    pub fn new(config: FieldConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut sim = Self::with_rng(config, rng)?;
        sim.seed = seed;
        Ok(sim)
    }
}

impl<R: Rng> Simulation<R> {
    pub fn with_rng(config: FieldConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            field: ParticleField::new(),
            config,
            rng,
            seed: None,
            wave_phase: 0.0,
            tick: 0,
        })
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Swap in a new configuration. The field is left as is.
    pub fn set_config(&mut self, config: FieldConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn wave_phase(&self) -> f32 {
        self.wave_phase
    }

    pub fn state(&self) -> FieldState {
        self.field.state(self.config.cap)
    }

    /// Append one batch regardless of the cap.
    pub fn add_batch(&mut self) -> Result<usize, ConfigError> {
        self.field.add_batch(&mut self.rng, &self.config)
    }

    pub fn grow_to_cap(&mut self) -> Result<usize, ConfigError> {
        self.field.grow_to_cap(&mut self.rng, &self.config)
    }

    pub fn reset(&mut self) -> usize {
        self.field.reset()
    }

    pub fn apply_scale(&mut self, factor: f32) {
        self.field.apply_uniform_scale(factor, &self.config);
    }

    pub fn explode_step(&mut self) {
        self.field.explode_step();
    }

    /// Advance one frame: grow, explode, spin, then wave.
    pub fn tick(&mut self, params: &SimParams) -> Result<(), ConfigError> {
        let _span = tracing::trace_span!("field_tick", tick = self.tick).entered();

        if params.auto_grow {
            self.field.grow_to_cap(&mut self.rng, &self.config)?;
        }
        if params.exploding {
            self.field.explode_step();
        }
        self.field.spin(params.rotation_speed);

        self.wave_phase += params.wave_frequency;
        if params.wave_frequency > 0.0 {
            self.field
                .wave(&mut self.rng, self.wave_phase, WAVE_AMPLITUDE);
        }

        self.tick += 1;
        tracing::trace!(len = self.field.len(), "tick complete");
        Ok(())
    }

    /// Clear the field and restore the reset values of the live parameters.
    pub fn reset_all(&mut self, params: &mut SimParams) {
        params.rotation_speed = SimParams::RESET_ROTATION_SPEED;
        params.wave_frequency = 0.0;
        params.exploding = false;
        params.expand = SimParams::default().expand;
        self.wave_phase = 0.0;
        self.field.reset();
        self.field.reset_scale();
        tracing::info!("field and parameters reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldProfile, ScaleMode};
    use glam::Vec3;

    fn sim(seed: u64) -> Simulation {
        Simulation::new(FieldConfig::default(), Some(seed)).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = FieldConfig {
            batch_size: 0,
            ..FieldConfig::default()
        };
        assert!(Simulation::new(config, Some(1)).is_err());
    }

    #[test]
    fn ticks_grow_one_batch_each_until_cap() {
        let mut s = sim(1);
        let params = SimParams::default();
        assert_eq!(s.state(), FieldState::Empty);
        s.tick(&params).unwrap();
        assert_eq!(s.field().len(), 100);
        assert_eq!(s.state(), FieldState::Growing);
        for _ in 0..20 {
            s.tick(&params).unwrap();
        }
        assert_eq!(s.field().len(), 1000);
        assert_eq!(s.state(), FieldState::AtOrAboveCap);
        assert_eq!(s.tick_count(), 21);
    }

    #[test]
    fn auto_grow_off_leaves_field_alone() {
        let mut s = sim(2);
        let params = SimParams {
            auto_grow: false,
            ..SimParams::default()
        };
        s.tick(&params).unwrap();
        assert!(s.field().is_empty());
    }

    #[test]
    fn tick_spins_by_rotation_speed() {
        let mut s = sim(3);
        let params = SimParams {
            rotation_speed: 0.1,
            auto_grow: false,
            ..SimParams::default()
        };
        s.add_batch().unwrap();
        s.tick(&params).unwrap();
        s.tick(&params).unwrap();
        for p in s.field().iter() {
            assert!(p.transform().rotation.abs_diff_eq(Vec3::new(0.2, 0.2, 0.0), 1e-6));
        }
    }

    #[test]
    fn zero_wave_frequency_keeps_heights() {
        let mut s = sim(4);
        s.add_batch().unwrap();
        let params = SimParams {
            auto_grow: false,
            ..SimParams::default()
        };
        s.tick(&params).unwrap();
        for p in s.field().iter() {
            assert_eq!(p.position(), p.base_position());
        }
        assert_eq!(s.wave_phase(), 0.0);
    }

    #[test]
    fn wave_advances_phase_and_moves_heights() {
        let mut s = sim(5);
        s.add_batch().unwrap();
        let params = SimParams {
            wave_frequency: 0.05,
            auto_grow: false,
            ..SimParams::default()
        };
        s.tick(&params).unwrap();
        assert!((s.wave_phase() - 0.05).abs() < 1e-6);
        assert!(s.field().iter().any(|p| p.position().y != p.base_position().y));
    }

    #[test]
    fn exploding_flag_runs_explode_step() {
        let mut s = sim(6);
        s.add_batch().unwrap();
        let params = SimParams {
            exploding: true,
            auto_grow: false,
            ..SimParams::default()
        };
        s.tick(&params).unwrap();
        for p in s.field().iter() {
            assert_eq!(p.transform().rotation, Vec3::splat(1.0));
        }
    }

    #[test]
    fn reset_all_clears_field_and_params() {
        let mut s = sim(7);
        let mut params = SimParams {
            rotation_speed: 0.4,
            wave_frequency: 0.03,
            exploding: true,
            expand: 3.0,
            ..SimParams::default()
        };
        s.tick(&params).unwrap();
        s.apply_scale(params.expand);
        s.reset_all(&mut params);

        assert_eq!(s.field().len(), 0);
        assert_eq!(s.state(), FieldState::Empty);
        assert_eq!(params.rotation_speed, 0.01);
        assert_eq!(params.wave_frequency, 0.0);
        assert!(!params.exploding);
        assert_eq!(params.expand, 1.0);

        // scale state is forgotten: a fresh batch sits at its base position
        s.add_batch().unwrap();
        for p in s.field().iter() {
            assert_eq!(p.position(), p.base_position());
        }
    }

    #[test]
    fn same_seed_runs_are_bit_identical() {
        let params = SimParams {
            rotation_speed: 0.02,
            wave_frequency: 0.01,
            ..SimParams::default()
        };
        let mut a = sim(42);
        let mut b = sim(42);
        for _ in 0..12 {
            a.tick(&params).unwrap();
            b.tick(&params).unwrap();
        }
        assert_eq!(a.field().state_hash(), b.field().state_hash());
        for (pa, pb) in a.field().iter().zip(b.field().iter()) {
            assert_eq!(pa.color(), pb.color());
            assert_eq!(
                pa.position().to_array().map(f32::to_bits),
                pb.position().to_array().map(f32::to_bits)
            );
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = sim(1);
        let mut b = sim(2);
        a.add_batch().unwrap();
        b.add_batch().unwrap();
        assert_ne!(a.field().state_hash(), b.field().state_hash());
    }

    #[test]
    fn injected_rng_is_used() {
        let rng = StdRng::seed_from_u64(9);
        let mut s = Simulation::with_rng(FieldConfig::profile(FieldProfile::Floating), rng).unwrap();
        s.add_batch().unwrap();
        assert_eq!(s.seed(), None);
        assert_eq!(s.field().len(), 100);
    }

    #[test]
    fn set_config_validates() {
        let mut s = sim(8);
        let bad = FieldConfig {
            batch_size: 0,
            ..FieldConfig::default()
        };
        assert!(s.set_config(bad).is_err());
        let toggle = FieldConfig {
            scale_mode: ScaleMode::Toggle,
            ..FieldConfig::default()
        };
        s.set_config(toggle).unwrap();
        assert_eq!(s.config().scale_mode, ScaleMode::Toggle);
    }
}
