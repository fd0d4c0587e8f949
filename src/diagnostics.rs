//! Conserved-quantity diagnostics for drivers and tests.
//!
//! The potential uses the same softening as the force kernel, so it is the
//! energy the integrator actually (approximately) conserves.

use crate::config::PhysicsConfig;
use crate::particles::ParticleSystem;
use crate::reference::ReferenceParticle;
use crate::vector::{Point3, Vec3};

pub fn calc_kinetic_energy(particles: &[ReferenceParticle]) -> f64 {
    particles.iter().fold(0.0, |ke, p| ke + 0.5 * p.m * p.v.norm2())
}

pub fn calc_potential_energy(particles: &[ReferenceParticle], config: &PhysicsConfig) -> f64 {
    let eps2 = config.eps2();
    let mut pe = 0.0;
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let r2 = (particles[j].p - particles[i].p).norm2();
            let mm = particles[i].m * particles[j].m;
            pe -= config.gravitational_constant * mm / (r2 + eps2).sqrt();
        }
    }
    pe
}

pub fn calc_total_energy(particles: &[ReferenceParticle], config: &PhysicsConfig) -> f64 {
    calc_kinetic_energy(particles) + calc_potential_energy(particles, config)
}

pub fn calc_momentum(particles: &[ReferenceParticle]) -> Vec3 {
    particles.iter().fold(Vec3::zero(), |acc, p| acc + p.v * p.m)
}

pub fn calc_kinetic_energy_soa(system: &ParticleSystem) -> f64 {
    let mut ke = 0.0;
    for i in 0..system.len() {
        let v2 = system.vx[i] * system.vx[i]
            + system.vy[i] * system.vy[i]
            + system.vz[i] * system.vz[i];
        ke += 0.5 * system.m[i] * v2;
    }
    ke
}

pub fn calc_potential_energy_soa(system: &ParticleSystem) -> f64 {
    let eps2 = system.config.eps2();
    let n = system.len();
    let mut pe = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = system.x[j] - system.x[i];
            let dy = system.y[j] - system.y[i];
            let dz = system.z[j] - system.z[i];
            pe -= system.gm[i] * system.m[j] / (dx * dx + dy * dy + dz * dz + eps2).sqrt();
        }
    }
    pe
}

pub fn calc_total_energy_soa(system: &ParticleSystem) -> f64 {
    calc_kinetic_energy_soa(system) + calc_potential_energy_soa(system)
}

/// Σ m·v.
pub fn calc_momentum_soa(system: &ParticleSystem) -> Vec3 {
    let mut p = Vec3::zero();
    for i in 0..system.len() {
        p += Vec3::new(system.vx[i], system.vy[i], system.vz[i]) * system.m[i];
    }
    p
}

pub fn calc_center_of_mass_soa(system: &ParticleSystem) -> Point3 {
    let mut total = 0.0;
    let mut cm = Vec3::zero();
    for i in 0..system.len() {
        total += system.m[i];
        cm += Vec3::new(system.x[i], system.y[i], system.z[i]) * system.m[i];
    }
    Point3::origin() + cm / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair() -> Vec<ReferenceParticle> {
        vec![
            ReferenceParticle::new(Point3::new(0.0, 0.0, 0.0), 1.0, Vec3::new(0.0, 2.0, 0.0), 0),
            ReferenceParticle::new(Point3::new(3.0, 0.0, 4.0), 3.0, Vec3::new(1.0, 0.0, 0.0), 1),
        ]
    }

    #[test]
    fn soa_and_aos_diagnostics_agree() {
        let cfg = PhysicsConfig {
            gravitational_constant: 1.0,
            softening: 1e-9,
            ..PhysicsConfig::default()
        };
        let parts = pair();
        let sys = ParticleSystem::from_particles(&parts, 0.1, cfg).unwrap();

        assert_relative_eq!(calc_kinetic_energy(&parts), 2.0 + 1.5);
        assert_relative_eq!(calc_kinetic_energy_soa(&sys), 3.5);
        assert_relative_eq!(calc_potential_energy(&parts, &cfg), -3.0 / 5.0);
        assert_relative_eq!(calc_potential_energy_soa(&sys), -0.6);
        assert_relative_eq!(calc_total_energy(&parts, &cfg), calc_total_energy_soa(&sys));

        let p = calc_momentum_soa(&sys);
        assert!(p.approx_eq(&calc_momentum(&parts), 1e-15));
        assert!(p.approx_eq(&Vec3::new(3.0, 2.0, 0.0), 1e-15));

        let cm = calc_center_of_mass_soa(&sys);
        assert!(cm.approx_eq(&Point3::new(2.25, 0.0, 3.0), 1e-15));
    }
}
