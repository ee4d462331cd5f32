use crate::config::{ConfigError, FieldConfig, ScaleMode};
use crate::particle::Particle;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-invocation rotation increment (radians, every axis) while exploding.
pub const EXPLODE_SPIN: f32 = 1.0;
/// Per-invocation position growth while exploding.
pub const EXPLODE_GROWTH: f32 = 1.01;

/// Record of every mutation to the field. Hosts drain this for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldEvent {
    /// A batch was appended; `len` is the field length afterwards.
    BatchAdded { added: usize, len: usize },
    /// The field was cleared.
    Reset { removed: usize },
    /// The expand factor was applied.
    Scaled { factor: f32, mode: ScaleMode },
    /// One explode step ran over `len` particles.
    Exploded { len: usize },
}

/// Lifecycle of the field relative to its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Empty,
    Growing,
    AtOrAboveCap,
}

/// Ordered, append-only collection of particles.
///
/// Holds only particles; the ground plane, lights and helpers live with the
/// host, so no per-frame type filtering is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleField {
    particles: Vec<Particle>,
    /// Factor last passed to the toggle-mode scale.
    last_toggle_factor: f32,
    /// Factor currently applied in canonical mode; `None` until the first
    /// scale after creation or a reset.
    canonical_factor: Option<f32>,
    #[serde(skip)]
    events: Vec<FieldEvent>,
}

impl Default for ParticleField {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            last_toggle_factor: 0.0,
            canonical_factor: None,
            events: Vec::new(),
        }
    }
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reported particle count.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Lifecycle state for the given cap.
    pub fn state(&self, cap: usize) -> FieldState {
        if self.particles.is_empty() {
            FieldState::Empty
        } else if self.particles.len() < cap {
            FieldState::Growing
        } else {
            FieldState::AtOrAboveCap
        }
    }

    pub fn events(&self) -> &[FieldEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<FieldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Append exactly `config.batch_size` freshly sampled particles.
    ///
    /// In canonical scale mode new particles pick up the current expand factor
    /// so every live position stays `base * factor`.
    pub fn add_batch<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &FieldConfig,
    ) -> Result<usize, ConfigError> {
        config.validate()?;
        self.particles.reserve(config.batch_size);
        for _ in 0..config.batch_size {
            let mut particle = Particle::sample(rng, config.plane, config.y_policy);
            if let (ScaleMode::Canonical, Some(factor)) =
                (config.scale_mode, self.canonical_factor)
            {
                particle.transform_mut().position =
                    canonical_position(particle.base_position(), factor, config);
            }
            self.particles.push(particle);
        }
        let len = self.particles.len();
        tracing::debug!(added = config.batch_size, len, "batch added");
        self.events.push(FieldEvent::BatchAdded {
            added: config.batch_size,
            len,
        });
        Ok(config.batch_size)
    }

    /// Add one batch if the field is still under `config.cap`.
    /// Returns the number of particles added (0 once the cap is reached).
    pub fn grow_to_cap<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &FieldConfig,
    ) -> Result<usize, ConfigError> {
        if self.particles.len() >= config.cap {
            return Ok(0);
        }
        self.add_batch(rng, config)
    }

    /// Remove every particle. Returns how many were removed.
    pub fn reset(&mut self) -> usize {
        let removed = self.particles.len();
        self.particles.clear();
        tracing::debug!(removed, "field reset");
        self.events.push(FieldEvent::Reset { removed });
        removed
    }

    /// Forget any applied expand factor.
    pub(crate) fn reset_scale(&mut self) {
        self.last_toggle_factor = 0.0;
        self.canonical_factor = None;
    }

    /// Apply the expand factor to every live position according to
    /// `config.scale_mode`.
    pub fn apply_uniform_scale(&mut self, factor: f32, config: &FieldConfig) {
        match config.scale_mode {
            ScaleMode::Canonical => self.scale_canonical(factor, config),
            ScaleMode::Toggle => self.scale_toggle(factor, config),
        }
        tracing::debug!(factor, mode = ?config.scale_mode, "scale applied");
        self.events.push(FieldEvent::Scaled {
            factor,
            mode: config.scale_mode,
        });
    }

    fn scale_canonical(&mut self, factor: f32, config: &FieldConfig) {
        for p in &mut self.particles {
            let base = p.base_position();
            p.transform_mut().position = canonical_position(base, factor, config);
        }
        self.canonical_factor = Some(factor);
    }

    // Multiplies when the factor rose since the previous call and divides
    // otherwise, so the result depends on the whole factor history.
    fn scale_toggle(&mut self, factor: f32, config: &FieldConfig) {
        let growing = self.last_toggle_factor < factor;
        let k = Vec3::new(factor, factor * config.vertical_scale, factor);
        self.last_toggle_factor = factor;

        if !growing && k.cmpeq(Vec3::ZERO).any() {
            tracing::warn!(factor, "skipping scale that would divide by zero");
            return;
        }
        for p in &mut self.particles {
            let t = p.transform_mut();
            if growing {
                t.position *= k;
            } else {
                t.position /= k;
            }
        }
    }

    /// Spin every particle by one unit on each axis and push it outward by
    /// `EXPLODE_GROWTH`. Repeated calls grow positions exponentially.
    pub fn explode_step(&mut self) {
        for p in &mut self.particles {
            let t = p.transform_mut();
            t.rotation += Vec3::splat(EXPLODE_SPIN);
            t.position *= EXPLODE_GROWTH;
        }
        self.events.push(FieldEvent::Exploded {
            len: self.particles.len(),
        });
    }

    /// Add `speed` to the x and y rotation of every particle.
    pub fn spin(&mut self, speed: f32) {
        if speed == 0.0 {
            return;
        }
        for p in &mut self.particles {
            let t = p.transform_mut();
            t.rotation.x += speed;
            t.rotation.y += speed;
        }
    }

    /// Jitter every live y by `uniform[0,1) * amplitude * sin(phase)`.
    pub fn wave<R: Rng + ?Sized>(&mut self, rng: &mut R, phase: f32, amplitude: f32) {
        let s = phase.sin();
        for p in &mut self.particles {
            p.transform_mut().position.y += rng.gen_range(0.0..1.0f32) * amplitude * s;
        }
    }

    /// FNV-1a hash over every particle's bits, in field order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for p in &self.particles {
            let t = p.transform();
            for v in [p.size(), p.base_position(), t.position, t.rotation] {
                for c in v.to_array() {
                    mix(&c.to_le_bytes());
                }
            }
            mix(&p.color().0.to_le_bytes());
        }
        h
    }
}

/// `base * factor`, with y scaled by `factor^vertical_scale` so that the
/// vertical exaggeration vanishes at factor 1.
fn canonical_position(base: Vec3, factor: f32, config: &FieldConfig) -> Vec3 {
    let vertical = factor.signum() * factor.abs().powf(config.vertical_scale);
    base * Vec3::new(factor, vertical, factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldProfile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn toggle_config() -> FieldConfig {
        FieldConfig {
            scale_mode: ScaleMode::Toggle,
            ..FieldConfig::default()
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() <= 1e-4 * b.abs().max_element() + 1e-9
    }

    #[test]
    fn field_starts_empty() {
        let f = ParticleField::new();
        assert!(f.is_empty());
        assert_eq!(f.state(1000), FieldState::Empty);
    }

    #[test]
    fn add_batch_appends_exactly_batch_size() {
        let mut f = ParticleField::new();
        let added = f.add_batch(&mut rng(), &FieldConfig::default()).unwrap();
        assert_eq!(added, 100);
        assert_eq!(f.len(), 100);
        assert_eq!(
            f.events(),
            &[FieldEvent::BatchAdded {
                added: 100,
                len: 100
            }]
        );
    }

    #[test]
    fn add_batch_preserves_existing_order() {
        let mut f = ParticleField::new();
        let mut r = rng();
        let config = FieldConfig::default();
        f.add_batch(&mut r, &config).unwrap();
        let first: Vec<Particle> = f.particles().to_vec();
        f.add_batch(&mut r, &config).unwrap();
        assert_eq!(&f.particles()[..100], first.as_slice());
    }

    #[test]
    fn add_batch_rejects_invalid_config() {
        let mut f = ParticleField::new();
        let config = FieldConfig {
            batch_size: 0,
            ..FieldConfig::default()
        };
        assert!(matches!(
            f.add_batch(&mut rng(), &config),
            Err(ConfigError::InvalidBatchSize)
        ));
        assert!(f.is_empty());
    }

    #[test]
    fn grow_to_cap_reaches_cap_in_ten_calls_then_stops() {
        let mut f = ParticleField::new();
        let mut r = rng();
        let config = FieldConfig::default();
        for i in 1..=10 {
            assert_ne!(f.state(config.cap), FieldState::AtOrAboveCap);
            f.grow_to_cap(&mut r, &config).unwrap();
            assert_eq!(f.len(), i * 100);
        }
        assert_eq!(f.state(config.cap), FieldState::AtOrAboveCap);
        for _ in 0..5 {
            assert_eq!(f.grow_to_cap(&mut r, &config).unwrap(), 0);
        }
        assert_eq!(f.len(), 1000);
    }

    #[test]
    fn grow_to_cap_may_overshoot_by_less_than_a_batch() {
        let mut f = ParticleField::new();
        let mut r = rng();
        let config = FieldConfig {
            cap: 250,
            ..FieldConfig::default()
        };
        while f.grow_to_cap(&mut r, &config).unwrap() > 0 {}
        assert_eq!(f.len(), 300);
        assert!(f.len() - config.cap < config.batch_size);
    }

    #[test]
    fn reset_always_empties() {
        let mut f = ParticleField::new();
        assert_eq!(f.reset(), 0);
        f.add_batch(&mut rng(), &FieldConfig::default()).unwrap();
        assert_eq!(f.reset(), 100);
        assert_eq!(f.len(), 0);
        assert_eq!(f.state(1000), FieldState::Empty);
    }

    #[test]
    fn canonical_scale_is_order_independent() {
        let config = FieldConfig::default();
        let mut a = ParticleField::new();
        a.add_batch(&mut rng(), &config).unwrap();
        let mut b = a.clone();

        for factor in [0.01, 0.02, 0.03, 0.04, 0.05] {
            a.apply_uniform_scale(factor, &config);
        }
        for factor in [0.05, 0.01, 0.04, 0.05] {
            b.apply_uniform_scale(factor, &config);
        }
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert_eq!(pa.position(), pb.position());
            assert!(approx(pa.position(), pa.base_position() * 0.05));
        }
    }

    #[test]
    fn canonical_scale_applies_vertical_multiplier() {
        let config = FieldConfig::profile(FieldProfile::Floating);
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &config).unwrap();
        f.apply_uniform_scale(2.0, &config);
        for p in f.iter() {
            let b = p.base_position();
            let y = b.y * 2.0f32.powf(1.01);
            assert!(approx(p.position(), Vec3::new(b.x * 2.0, y, b.z * 2.0)));
            assert!(p.position().y > b.y * 2.0);
        }
    }

    #[test]
    fn canonical_unit_factor_is_identity_with_vertical_scale() {
        let config = FieldConfig::profile(FieldProfile::Floating);
        let mut f = ParticleField::new();
        let mut r = StdRng::seed_from_u64(1);
        f.add_batch(&mut r, &config).unwrap();
        let before: Vec<Vec3> = f.iter().map(Particle::position).collect();

        f.apply_uniform_scale(1.0, &config);
        let after: Vec<Vec3> = f.iter().map(Particle::position).collect();
        assert_eq!(before, after);

        f.add_batch(&mut r, &config).unwrap();
        for p in f.iter() {
            assert_eq!(p.position(), p.base_position());
        }
    }

    #[test]
    fn canonical_scale_is_uniform_across_batches_with_vertical_scale() {
        let config = FieldConfig::profile(FieldProfile::Floating);
        let mut f = ParticleField::new();
        let mut r = StdRng::seed_from_u64(1);
        f.add_batch(&mut r, &config).unwrap();
        f.apply_uniform_scale(0.5, &config);
        f.add_batch(&mut r, &config).unwrap();

        for p in f.iter() {
            assert_eq!(p.position(), canonical_position(p.base_position(), 0.5, &config));
        }

        f.reset();
        f.reset_scale();
        f.add_batch(&mut r, &config).unwrap();
        for p in f.iter() {
            assert_eq!(p.position(), p.base_position());
        }
    }

    #[test]
    fn canonical_scale_carries_to_later_batches() {
        let config = FieldConfig::default();
        let mut f = ParticleField::new();
        let mut r = rng();
        f.apply_uniform_scale(3.0, &config);
        f.add_batch(&mut r, &config).unwrap();
        for p in f.iter() {
            assert!(approx(p.position(), p.base_position() * 3.0));
        }
    }

    #[test]
    fn toggle_scale_increasing_sequence_multiplies_cumulatively() {
        let config = toggle_config();
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &config).unwrap();
        let factors = [0.01f32, 0.02, 0.03, 0.04, 0.05];
        for factor in factors {
            f.apply_uniform_scale(factor, &config);
        }
        let product: f32 = factors.iter().product();
        for p in f.iter() {
            assert!(approx(p.position(), p.base_position() * product));
        }
    }

    #[test]
    fn toggle_scale_is_path_dependent() {
        let config = toggle_config();
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &config).unwrap();

        f.apply_uniform_scale(0.5, &config); // rose from 0: multiply
        f.apply_uniform_scale(0.25, &config); // fell: divide
        for p in f.iter() {
            assert!(approx(p.position(), p.base_position() * 0.5 / 0.25));
        }
    }

    #[test]
    fn toggle_scale_skips_division_by_zero() {
        let config = toggle_config();
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &config).unwrap();
        f.apply_uniform_scale(0.5, &config);
        let before: Vec<Vec3> = f.iter().map(Particle::position).collect();
        f.apply_uniform_scale(0.0, &config);
        let after: Vec<Vec3> = f.iter().map(Particle::position).collect();
        assert_eq!(before, after);
        assert!(after.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn explode_step_spins_and_pushes_outward() {
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &FieldConfig::default()).unwrap();
        f.explode_step();
        f.explode_step();
        for p in f.iter() {
            assert_eq!(p.transform().rotation, Vec3::splat(2.0));
            assert!(approx(p.position(), p.base_position() * 1.01 * 1.01));
        }
        assert!(matches!(f.events().last(), Some(FieldEvent::Exploded { len: 100 })));
    }

    #[test]
    fn explode_grows_without_bound() {
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &FieldConfig::default()).unwrap();
        let start = f.particles()[0].position().length();
        for _ in 0..500 {
            f.explode_step();
        }
        assert!(f.particles()[0].position().length() > start * 100.0);
    }

    #[test]
    fn spin_rotates_x_and_y_only() {
        let mut f = ParticleField::new();
        f.add_batch(&mut rng(), &FieldConfig::default()).unwrap();
        f.spin(0.25);
        for p in f.iter() {
            assert_eq!(p.transform().rotation, Vec3::new(0.25, 0.25, 0.0));
        }
    }

    #[test]
    fn wave_moves_only_y_within_amplitude() {
        let mut f = ParticleField::new();
        let mut r = rng();
        f.add_batch(&mut r, &FieldConfig::default()).unwrap();
        f.wave(&mut r, std::f32::consts::FRAC_PI_2, 10.0);
        for p in f.iter() {
            let d = p.position() - p.base_position();
            assert_eq!(d.x, 0.0);
            assert_eq!(d.z, 0.0);
            assert!((0.0..=10.0).contains(&d.y));
        }
    }

    #[test]
    fn state_hash_matches_for_same_seed() {
        let config = FieldConfig::default();
        let mut a = ParticleField::new();
        let mut b = ParticleField::new();
        a.add_batch(&mut StdRng::seed_from_u64(7), &config).unwrap();
        b.add_batch(&mut StdRng::seed_from_u64(7), &config).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());

        let mut c = ParticleField::new();
        c.add_batch(&mut StdRng::seed_from_u64(8), &config).unwrap();
        assert_ne!(a.state_hash(), c.state_hash());
    }
}
