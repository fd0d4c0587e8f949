use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

use soa_nbody::diagnostics::{calc_center_of_mass_soa, calc_momentum_soa, calc_total_energy_soa};
use soa_nbody::{ExecutionPolicy, ExternalForces, ParticleSystem, SimulationConfig, Vec3};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration; flags below override its fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles to generate.
    #[arg(short, long)]
    number: Option<usize>,

    /// Number of steps to run the simulation.
    #[arg(short, long)]
    steps: Option<usize>,

    /// Timestep.
    #[arg(long)]
    dt: Option<f64>,

    /// Seed for the initial conditions.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, value_enum)]
    execution: Option<ExecutionPolicy>,

    /// Worker threads for the parallel policy.
    #[arg(short, long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Uniform force applied to every particle.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    global_force: Option<Vec<f64>>,

    /// Half-width of a random per-particle external force, fixed for the run.
    #[arg(long)]
    external: Option<f64>,

    /// Log energy and momentum every this many steps (0 disables).
    #[arg(long, default_value_t = 0)]
    report_every: usize,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SimulationConfig::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(n) = args.number {
        cfg.particles = n;
    }
    if let Some(s) = args.steps {
        cfg.steps = s;
    }
    if let Some(dt) = args.dt {
        cfg.timestep = dt;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(e) = args.execution {
        cfg.physics.execution = e;
    }
    if let Some(f) = &args.global_force {
        cfg.global_force = Vec3::new(f[0], f[1], f[2]);
    }
    if let Some(w) = args.external {
        cfg.external_force_magnitude = w;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    ensure!(
        cfg.external_force_magnitude >= 0.0,
        "external force half-width must be non-negative"
    );

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .context("building thread pool")?;

    info!(
        particles = cfg.particles,
        steps = cfg.steps,
        dt = cfg.timestep,
        execution = ?cfg.physics.execution,
        threads = rayon::current_num_threads(),
        "initializing system"
    );

    let mut rng = fastrand::Rng::with_seed(cfg.seed);
    let mut system =
        ParticleSystem::random(cfg.particles, cfg.timestep, cfg.physics, &cfg.ranges, &mut rng)?;
    trace!("initial state:\n{system}");

    let width = cfg.external_force_magnitude;
    let (ext_x, ext_y, ext_z) = if width > 0.0 {
        let n = cfg.particles;
        let mut axes = [vec![0.0; n], vec![0.0; n], vec![0.0; n]];
        for axis in axes.iter_mut() {
            for f in axis.iter_mut() {
                *f = width * (2.0 * rng.f64() - 1.0);
            }
        }
        let [x, y, z] = axes;
        (x, y, z)
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };
    let external = ExternalForces::new(&ext_x, &ext_y, &ext_z);

    let initial_energy = calc_total_energy_soa(&system);
    info!(energy = initial_energy, "initial total energy");

    let start = Instant::now();
    for step in 0..cfg.steps {
        system.update(external, cfg.global_force)?;

        if args.report_every > 0 && (step + 1) % args.report_every == 0 {
            let p = calc_momentum_soa(&system);
            let energy = calc_total_energy_soa(&system);
            info!(step = step + 1, energy, momentum = %p, "progress");
        }
        debug!(step, elapsed = ?start.elapsed(), "step done");
    }
    let elapsed = start.elapsed();

    if !system.is_finite() {
        warn!("state contains non-finite values; timestep is likely too large");
    }

    let final_energy = calc_total_energy_soa(&system);
    info!(
        seconds = elapsed.as_secs_f64(),
        per_step = elapsed.as_secs_f64() / cfg.steps.max(1) as f64,
        "simulation finished"
    );
    info!(
        energy = final_energy,
        drift = (final_energy - initial_energy) / initial_energy.abs(),
        center_of_mass = %calc_center_of_mass_soa(&system),
        "final state"
    );
    Ok(())
}
