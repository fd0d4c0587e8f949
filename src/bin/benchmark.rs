use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use soa_nbody::diagnostics::calc_total_energy_soa;
use soa_nbody::{ExecutionPolicy, ExternalForces, InitRanges, ParticleSystem, PhysicsConfig, Vec3};

#[derive(Parser, Debug)]
#[command(about = "Time the sequential and parallel execution policies")]
struct Args {
    #[arg(short, long, num_args = 1.., default_values_t = [100, 1000, 4000])]
    counts: Vec<usize>,

    #[arg(short, long, default_value_t = 10)]
    steps: usize,

    #[arg(long, default_value_t = 1e-3)]
    dt: f64,

    #[arg(short, long, default_value_t = num_cpus::get())]
    threads: usize,
}

const SEPARATOR: &str =
    "---------------|------------|-------------|-------------------|-------------------|--------";

struct Timing {
    runtime: f64,
    energy_change: f64,
}

fn time_policy(n: usize, steps: usize, dt: f64, execution: ExecutionPolicy) -> Result<Timing> {
    let config = PhysicsConfig::default().with_execution(execution);
    let mut rng = fastrand::Rng::with_seed(12345);
    let mut system = ParticleSystem::random(n, dt, config, &InitRanges::default(), &mut rng)?;

    let e0 = calc_total_energy_soa(&system);
    let start = Instant::now();
    system.step_n(steps, ExternalForces::none(), Vec3::zero())?;
    let runtime = start.elapsed().as_secs_f64();
    let e1 = calc_total_energy_soa(&system);

    Ok(Timing { runtime, energy_change: 100.0 * (e1 - e0) / e0.abs() })
}

fn main() -> Result<()> {
    let args = Args::parse();
    rayon::ThreadPoolBuilder::new().num_threads(args.threads).build_global()?;

    println!("N-Body Simulation Benchmark");
    println!("---------------------------");
    println!(
        "Running {} steps with dt={} on {} threads",
        args.steps,
        args.dt,
        rayon::current_num_threads()
    );
    println!(
        "\nParticle Count | Policy     | Runtime (s) | Avg Step Time (s) | Energy Change (%) | Speedup"
    );
    println!("{SEPARATOR}");

    for &n in &args.counts {
        let seq = time_policy(n, args.steps, args.dt, ExecutionPolicy::Sequential)?;
        let par = time_policy(n, args.steps, args.dt, ExecutionPolicy::Parallel)?;
        let steps = args.steps.max(1) as f64;

        println!(
            "{:14} | {:10} | {:11.4} | {:17.6} | {:17.3e} | {:6.2}",
            n, "sequential", seq.runtime, seq.runtime / steps, seq.energy_change, 1.0
        );
        println!(
            "{:14} | {:10} | {:11.4} | {:17.6} | {:17.3e} | {:6.2}",
            n,
            "parallel",
            par.runtime,
            par.runtime / steps,
            par.energy_change,
            seq.runtime / par.runtime
        );
        println!("{SEPARATOR}");
    }
    Ok(())
}
