use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use soa_nbody::diagnostics::{calc_momentum, calc_total_energy, calc_total_energy_soa};
use soa_nbody::scenarios::circular_orbits;
use soa_nbody::{
    ExecutionPolicy, ExternalForces, ParticleSystem, PhysicsConfig, ReferenceParticle,
    ReferenceSystem, Vec3,
};

#[derive(Parser, Debug)]
#[command(about = "Cross-check the SoA engine against the reference engine")]
struct Args {
    #[arg(short, long, default_value_t = 1000)]
    number: usize,

    #[arg(short, long, default_value_t = 10)]
    steps: usize,

    #[arg(long, default_value_t = 1e-3)]
    dt: f64,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    #[arg(short, long, value_enum, default_value_t = ExecutionPolicy::Parallel)]
    execution: ExecutionPolicy,

    #[arg(long, default_value_t = 1e-10)]
    position_tolerance: f64,

    #[arg(long, default_value_t = 1e-6)]
    energy_tolerance: f64,
}

// Compares by id; `soa` comes from `to_particles` so slot i holds id i.
fn verify_states(reference: &ReferenceSystem, soa: &[ReferenceParticle], tolerance: f64) -> bool {
    if reference.len() != soa.len() {
        error!(reference = reference.len(), soa = soa.len(), "particle count mismatch");
        return false;
    }

    let mut max_pos = 0.0f64;
    let mut max_vel = 0.0f64;
    let mut sum_pos = 0.0;
    let mut bad = 0;

    for o in soa {
        let Some(r) = reference.by_id(o.id) else {
            error!(id = o.id, "id missing from reference system");
            return false;
        };
        let dp = (r.p - o.p).norm();
        let dv = (r.v - o.v).norm();
        max_pos = max_pos.max(dp);
        max_vel = max_vel.max(dv);
        sum_pos += dp;

        if dp > tolerance || !dp.is_finite() {
            bad += 1;
            warn!(id = o.id, reference = %r.p, soa = %o.p, diff = dp, "large position difference");
            if bad >= 10 {
                warn!("too many differences, stopping comparison");
                return false;
            }
        }
    }

    info!(
        max_position_diff = max_pos,
        avg_position_diff = sum_pos / soa.len() as f64,
        max_velocity_diff = max_vel,
        above_tolerance = bad,
        "position verification"
    );
    bad == 0
}

fn verify_energy(reference: f64, soa: f64, tolerance: f64) -> bool {
    let diff = (reference - soa).abs();
    let rel = diff / reference.abs().max(soa.abs());
    info!(reference, soa, absolute = diff, relative = rel, "energy verification");
    rel <= tolerance
}

fn run(args: &Args) -> Result<bool> {
    let config = PhysicsConfig {
        gravitational_constant: 1.0,
        execution: args.execution,
        ..PhysicsConfig::default()
    };

    let mut rng = fastrand::Rng::with_seed(args.seed);
    let initial = circular_orbits(args.number, config.gravitational_constant, &mut rng);
    let n = initial.len();

    // A small, fixed external push so the by-id lookup is exercised too.
    let mut ext = [vec![0.0; n], vec![0.0; n], vec![0.0; n]];
    for axis in ext.iter_mut() {
        for f in axis.iter_mut() {
            *f = 1e-16 * (2.0 * rng.f64() - 1.0);
        }
    }
    let external = ExternalForces::new(&ext[0], &ext[1], &ext[2]);
    let global = Vec3::new(0.0, 0.0, 1e-15);

    let mut soa = ParticleSystem::from_particles(&initial, args.dt, config)?;
    let mut reference = ReferenceSystem::new(initial, args.dt, config)?;

    let e0 = calc_total_energy(reference.particles(), &config);
    info!(
        particles = n,
        steps = args.steps,
        execution = ?args.execution,
        initial_energy = e0,
        "running both engines"
    );

    for _ in 0..args.steps {
        reference.update(external, global)?;
    }
    soa.step_n(args.steps, external, global)?;

    let positions_ok = verify_states(&reference, &soa.to_particles(), args.position_tolerance);
    let energy_ok = verify_energy(
        calc_total_energy(reference.particles(), &config),
        calc_total_energy_soa(&soa),
        args.energy_tolerance,
    );
    info!(momentum = %calc_momentum(reference.particles()), "reference momentum");

    Ok(positions_ok && energy_ok)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if run(&args)? {
        info!("verification passed");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("verification failed");
        Ok(ExitCode::FAILURE)
    }
}
