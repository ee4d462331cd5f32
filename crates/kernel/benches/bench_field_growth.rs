use std::hint::black_box;
use std::time::Instant;

use cubefield_kernel::{FieldConfig, ParticleField, SimParams, Simulation};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn bench_grow_to_cap(cap: usize, iterations: usize) {
    let config = FieldConfig {
        cap,
        ..FieldConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(1);

    let start = Instant::now();
    for _ in 0..iterations {
        let mut field = ParticleField::new();
        while field.grow_to_cap(&mut rng, black_box(&config)).unwrap_or(0) > 0 {}
        black_box(field.len());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  grow to cap ({cap} particles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_tick(len: usize, iterations: usize) {
    let config = FieldConfig {
        cap: len,
        ..FieldConfig::default()
    };
    let mut sim = match Simulation::new(config, Some(7)) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("bad bench config: {e}");
            return;
        }
    };
    while sim.grow_to_cap().unwrap_or(0) > 0 {}

    let params = SimParams {
        rotation_speed: 0.01,
        wave_frequency: 0.02,
        exploding: true,
        ..SimParams::default()
    };
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = sim.tick(black_box(&params));
        sim.field_mut().drain_events();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  tick ({len} particles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Field Growth Benchmarks ===");
    for cap in [1_000, 10_000, 100_000] {
        bench_grow_to_cap(cap, 20);
    }
    println!("=== Tick Benchmarks ===");
    for len in [1_000, 10_000, 100_000] {
        bench_tick(len, 200);
    }
}
