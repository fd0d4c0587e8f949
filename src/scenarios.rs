//! Canned initial conditions as reference records.
//!
//! Feed them to [`ParticleSystem::from_particles`](crate::ParticleSystem::from_particles)
//! or [`ReferenceSystem::new`](crate::ReferenceSystem::new).

use std::f64::consts::TAU;

use crate::vector::{Point3, Vec3};
use crate::ReferenceParticle;

pub fn two_bodies() -> Vec<ReferenceParticle> {
    vec![
        ReferenceParticle::new(Point3::new(0.0, 0.0, 0.0), 1.0, Vec3::zero(), 0),
        ReferenceParticle::new(Point3::new(1.0, 0.0, 0.0), 1e-20, Vec3::new(0.0, 1.0, 0.0), 1),
    ]
}

/// Five heavy bodies at rest in the xy-plane.
pub fn five_body_cluster() -> Vec<ReferenceParticle> {
    let m = 1_000_000.0;
    vec![
        ReferenceParticle::new(Point3::new(0.0, 0.0, 0.0), 100_000.0, Vec3::zero(), 0),
        ReferenceParticle::new(Point3::new(0.3, 0.0, 0.0), 2.0 * m, Vec3::zero(), 1),
        ReferenceParticle::new(Point3::new(-1.2, 0.0, 0.0), m, Vec3::zero(), 2),
        ReferenceParticle::new(Point3::new(0.5, 0.4, 0.0), m, Vec3::zero(), 3),
        ReferenceParticle::new(Point3::new(0.1, -0.2, 0.0), m, Vec3::zero(), 4),
    ]
}

/// Sun at the origin and Earth at perihelion-ish distance, SI units.
pub fn sun_earth() -> Vec<ReferenceParticle> {
    vec![
        ReferenceParticle::new(Point3::origin(), 1.989e30, Vec3::zero(), 0),
        ReferenceParticle::new(
            Point3::new(1.4904e11, 0.0, 0.0),
            5.972e24,
            Vec3::new(0.0, 29.78e3, 0.0),
            1,
        ),
    ]
}

/// A unit-mass central body with `n` light bodies on circular orbits in the
/// xy-plane, radii spread over [0.1, 5.1). Speeds assume gravitational constant `g`.
pub fn circular_orbits(n: usize, g: f64, rng: &mut fastrand::Rng) -> Vec<ReferenceParticle> {
    let mut particle_buf = Vec::with_capacity(n + 1);
    particle_buf.push(ReferenceParticle::new(Point3::origin(), 1.0, Vec3::zero(), 0));

    for i in 0..n {
        let d = 0.1 + ((i as f64) * 5.0 / (n as f64));
        let v = f64::sqrt(g / d);
        let theta = rng.f64() * TAU;
        let (sin, cos) = theta.sin_cos();
        particle_buf.push(ReferenceParticle::new(
            Point3::new(d * cos, d * sin, 0.0),
            1e-14,
            Vec3::new(-v * sin, v * cos, 0.0),
            i + 1,
        ));
    }
    particle_buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::{ExternalForces, ParticleSystem};

    #[test]
    fn scenarios_build_valid_systems() {
        let cfg = PhysicsConfig::default();
        let mut rng = fastrand::Rng::with_seed(5);
        let orbits = circular_orbits(50, 1.0, &mut rng);
        for parts in [two_bodies(), five_body_cluster(), sun_earth(), orbits] {
            let sys = ParticleSystem::from_particles(&parts, 1.0, cfg).unwrap();
            assert_eq!(sys.len(), parts.len());
        }
    }

    #[test]
    fn earth_stays_near_one_au_for_a_day_of_steps() {
        let mut sys =
            ParticleSystem::from_particles(&sun_earth(), 60.0, PhysicsConfig::default()).unwrap();
        sys.step_n(24 * 60, ExternalForces::none(), Vec3::zero()).unwrap();
        let earth = sys.position(1).unwrap();
        let sun = sys.position(0).unwrap();
        let r = (earth - sun).norm();
        assert!((r - 1.4904e11).abs() / 1.4904e11 < 1e-3);
    }

    #[test]
    fn orbits_have_circular_speed() {
        let mut rng = fastrand::Rng::with_seed(9);
        let parts = circular_orbits(10, 1.0, &mut rng);
        for p in &parts[1..] {
            let d = (p.p - Point3::origin()).norm();
            assert!((p.v.norm() - (1.0 / d).sqrt()).abs() < 1e-12);
            // velocity perpendicular to radius
            assert!((p.p - Point3::origin()).dot(&p.v).abs() < 1e-12);
        }
    }
}
