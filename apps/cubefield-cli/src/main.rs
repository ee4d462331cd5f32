use anyhow::Context;
use clap::{Parser, Subcommand};
use cubefield_kernel::{FieldConfig, FieldProfile, ScaleMode, SimParams, Simulation};
use cubefield_render::{DebugTextRenderer, Renderer, SceneView, describe_field};
use cubefield_tools::FieldInspector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubefield-cli", about = "Headless tool for generating cube fields")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Named field preset
    #[arg(long, global = true, default_value = "resting")]
    profile: FieldProfile,

    /// YAML field config; overrides --profile
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed; omit for a non-reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective field config
    Info,
    /// Generate batches and print the field
    Generate {
        /// Number of batches to add
        #[arg(short, long, default_value = "1")]
        count: usize,
        /// Print box descriptors as JSON
        #[arg(long)]
        json: bool,
        /// Particle rows to print in text mode
        #[arg(long, default_value = "20")]
        rows: usize,
    },
    /// Run update ticks with auto-growth until the cap or the tick limit
    Grow {
        /// Number of ticks to run
        #[arg(short, long, default_value = "12")]
        ticks: u64,
    },
    /// Apply a sequence of expand factors to a generated batch
    Scale {
        /// Comma-separated factors, applied in order
        #[arg(long, value_delimiter = ',', default_value = "0.01,0.02,0.03,0.04,0.05")]
        factors: Vec<f32>,
        /// Use the legacy direction-dependent scale
        #[arg(long)]
        toggle: bool,
    },
    /// Run explode steps over a full field
    Explode {
        /// Number of explode steps
        #[arg(short, long, default_value = "60")]
        steps: usize,
    },
    /// Print one particle of a generated field
    Inspect {
        /// Particle index, in field order
        #[arg(short, long, default_value = "0")]
        index: usize,
        /// Number of batches to add first
        #[arg(short, long, default_value = "1")]
        count: usize,
    },
    /// Check that two runs from the same seed produce identical fields
    Replay {
        /// Number of ticks per run
        #[arg(short, long, default_value = "10")]
        ticks: u64,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<FieldConfig> {
    match &cli.config {
        Some(path) => FieldConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            tracing::debug!(profile = %cli.profile, "using built-in profile");
            Ok(FieldConfig::profile(cli.profile))
        }
    }
}

fn describe_particle(sim: &Simulation, index: usize) -> anyhow::Result<String> {
    let Some(info) = FieldInspector::inspect_particle(sim, index) else {
        anyhow::bail!(
            "no particle at index {index} (field has {})",
            sim.field().len()
        );
    };
    let plane = sim.config().plane;
    Ok(format!(
        "{info}\nrotation=({:.3}, {:.3}, {:.3}) over plane={}\n",
        info.rotation[0],
        info.rotation[1],
        info.rotation[2],
        plane.contains_xz(info.position[0], info.position[2])
    ))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = load_config(&cli)?;
    let view = SceneView::default();

    match cli.command {
        Commands::Info => {
            println!("cubefield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("profiles: {}", FieldProfile::ALL.map(|p| p.name()).join(", "));
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Generate { count, json, rows } => {
            let mut sim = Simulation::new(config, cli.seed)?;
            for _ in 0..count {
                sim.add_batch()?;
            }
            if json {
                let boxes = describe_field(sim.field());
                println!("{}", serde_json::to_string_pretty(&boxes)?);
            } else {
                print!(
                    "{}",
                    DebugTextRenderer::with_max_rows(rows).render(sim.field(), &view)
                );
                println!("{}", FieldInspector::summary(&sim));
            }
        }
        Commands::Grow { ticks } => {
            let mut sim = Simulation::new(config, cli.seed)?;
            let params = SimParams::default();
            for _ in 0..ticks {
                sim.tick(&params)?;
                let summary = FieldInspector::summary(&sim);
                println!(
                    "tick {:>3}: particles={} state={:?}",
                    summary.tick, summary.particle_count, summary.state
                );
            }
        }
        Commands::Scale { factors, toggle } => {
            if toggle {
                config.scale_mode = ScaleMode::Toggle;
            }
            let mut sim = Simulation::new(config, cli.seed)?;
            sim.add_batch()?;
            let Some(first) = sim.field().particles().first().cloned() else {
                anyhow::bail!("field is empty after adding a batch");
            };
            println!(
                "mode={:?} base=({:.3}, {:.3}, {:.3})",
                sim.config().scale_mode,
                first.base_position().x,
                first.base_position().y,
                first.base_position().z
            );
            for factor in factors {
                sim.apply_scale(factor);
                let p = sim.field().particles()[0].position();
                println!(
                    "factor {factor:<8} -> cube-0 pos=({:.6}, {:.6}, {:.6})",
                    p.x, p.y, p.z
                );
            }
        }
        Commands::Explode { steps } => {
            let mut sim = Simulation::new(config, cli.seed)?;
            while sim.grow_to_cap()? > 0 {}
            let params = SimParams {
                exploding: true,
                auto_grow: false,
                ..SimParams::default()
            };
            let plane = sim.config().plane;
            for step in 1..=steps {
                sim.tick(&params)?;
                if step % 10 == 0 || step == steps {
                    let over_plane = sim
                        .field()
                        .iter()
                        .filter(|p| plane.contains_xz(p.position().x, p.position().z))
                        .count();
                    if let Some((lo, hi)) = FieldInspector::summary(&sim).extent {
                        println!(
                            "step {step:>4}: extent x=[{:.1}, {:.1}] z=[{:.1}, {:.1}] over plane={over_plane}",
                            lo.x, hi.x, lo.z, hi.z
                        );
                    }
                }
            }
        }
        Commands::Inspect { index, count } => {
            let mut sim = Simulation::new(config, cli.seed)?;
            for _ in 0..count {
                sim.add_batch()?;
            }
            print!("{}", describe_particle(&sim, index)?);
        }
        Commands::Replay { ticks } => {
            let seed = cli.seed.unwrap_or(42);
            println!("Deterministic replay: seed={seed}, ticks={ticks}");
            let params = SimParams {
                rotation_speed: 0.01,
                wave_frequency: 0.02,
                ..SimParams::default()
            };

            let mut runs = Vec::with_capacity(2);
            for _ in 0..2 {
                let mut sim = Simulation::new(config.clone(), Some(seed))?;
                for _ in 0..ticks {
                    sim.tick(&params)?;
                }
                runs.push((sim.field().len(), sim.field().state_hash()));
            }

            println!("Run 1: particles={}, hash={:#x}", runs[0].0, runs[0].1);
            println!("Run 2: particles={}, hash={:#x}", runs[1].0, runs[1].1);
            if runs[0] != runs[1] {
                anyhow::bail!("replay mismatch for seed {seed}");
            }
            tracing::info!(seed, ticks, hash = runs[0].1, "replay matched");
            println!("Match: OK");
        }
    }

    Ok(())
}
