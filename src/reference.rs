//! Array-of-structures reference engine.
//!
//! The same physics as the SoA engine written one particle at a time, used
//! only to cross-check the optimized path. Each particle carries a stable
//! `id`; self-exclusion and external-force lookup go through the id, never
//! through the particle's position in the collection, so the collection may
//! be in any order.

use std::fmt;

use crate::config::PhysicsConfig;
use crate::error::SimError;
use crate::forces::{softened_inv_r3, ExternalForces};
use crate::particles::{check_mass, check_timestep};
use crate::vector::{Point3, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct ReferenceParticle {
    pub p: Point3,
    pub m: f64,
    pub v: Vec3,
    pub id: usize,
}

impl ReferenceParticle {
    pub fn new(p: Point3, m: f64, v: Vec3, id: usize) -> Self {
        ReferenceParticle { p, m, v, id }
    }

    pub fn approx_eq(&self, other: &ReferenceParticle, epsilon: f64) -> bool {
        self.p.approx_eq(&other.p, epsilon)
            && (self.m - other.m).abs() < epsilon
            && self.v.approx_eq(&other.v, epsilon)
    }

    /// Net force on this particle from every other record, plus its external
    /// force (looked up by id) and the global force. O(n).
    pub fn force_from(
        &self,
        particles: &[ReferenceParticle],
        external: ExternalForces<'_>,
        global: Vec3,
        config: &PhysicsConfig,
    ) -> Vec3 {
        let gm = config.gravitational_constant * self.m;
        let eps2 = config.eps2();
        let mut f = external.at(self.id) + global;
        for other in particles {
            if other.id == self.id {
                continue;
            }
            let r = other.p - self.p;
            f += r * (gm * other.m * softened_inv_r3(r.norm2(), eps2));
        }
        f
    }

    /// Semi-implicit Euler with a precomputed net force.
    pub fn advance(&mut self, force: Vec3, dt: f64) {
        let a = force / self.m;
        self.v += a * dt;
        self.p += self.v * dt;
    }
}

impl fmt::Display for ReferenceParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "particle {}: p({}) m: {} v({})", self.id, self.p, self.m, self.v)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceSystem {
    particles: Vec<ReferenceParticle>,
    dt: f64,
    config: PhysicsConfig,
}

impl ReferenceSystem {
    /// Ids must be unique and lie in `0..particles.len()`; masses must be positive.
    pub fn new(
        particles: Vec<ReferenceParticle>,
        dt: f64,
        config: PhysicsConfig,
    ) -> Result<Self, SimError> {
        if particles.is_empty() {
            return Err(SimError::InvalidParticleCount(0));
        }
        check_timestep(dt)?;
        config.validate()?;
        let mut seen = vec![false; particles.len()];
        for p in &particles {
            match seen.get_mut(p.id) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(SimError::DuplicateId(p.id)),
            }
            check_mass(p.id, p.m)?;
            if !p.p.is_finite() || !p.v.is_finite() {
                return Err(SimError::NonFinite { field: "state", index: p.id });
            }
        }
        Ok(ReferenceSystem { particles, dt, config })
    }

    pub fn particles(&self) -> &[ReferenceParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Record with the given id, wherever it sits in the collection.
    pub fn by_id(&self, id: usize) -> Option<&ReferenceParticle> {
        self.particles.iter().find(|p| p.id == id)
    }

    /// One step. Every force is computed against the pre-step snapshot
    /// before any particle moves.
    pub fn update(&mut self, external: ExternalForces<'_>, global: Vec3) -> Result<(), SimError> {
        external.validate(self.particles.len())?;
        if !global.is_finite() {
            return Err(SimError::NonFinite { field: "global force", index: 0 });
        }

        let forces: Vec<Vec3> = self
            .particles
            .iter()
            .map(|p| p.force_from(&self.particles, external, global, &self.config))
            .collect();
        for (p, f) in self.particles.iter_mut().zip(forces) {
            p.advance(f, self.dt);
        }
        Ok(())
    }
}

impl fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.particles {
            writeln!(f, "{p}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig {
            gravitational_constant: 1.0,
            softening: 1e-9,
            ..PhysicsConfig::default()
        }
    }

    #[test]
    fn force_skips_self_by_id() {
        let a = ReferenceParticle::new(Point3::origin(), 2.0, Vec3::zero(), 0);
        let b = ReferenceParticle::new(Point3::new(0.0, 3.0, 0.0), 3.0, Vec3::zero(), 1);
        // `a` appears twice; the copy with the same id must be ignored.
        let f = a.force_from(&[b, a, a], ExternalForces::none(), Vec3::zero(), &cfg());
        assert_relative_eq!(f.y, 2.0 * 3.0 / 9.0, max_relative = 1e-14);
        assert_eq!(f.x, 0.0);
    }

    #[test]
    fn external_force_follows_id_not_position() {
        let a = ReferenceParticle::new(Point3::origin(), 1.0, Vec3::zero(), 1);
        let b = ReferenceParticle::new(Point3::new(1e9, 0.0, 0.0), 1e-30, Vec3::zero(), 0);
        let ext = [10.0, 20.0];
        let f = a.force_from(&[a, b], ExternalForces::new(&ext, &[], &[]), Vec3::zero(), &cfg());
        assert_relative_eq!(f.x, 20.0, max_relative = 1e-12);
    }

    #[test]
    fn order_of_collection_does_not_matter() {
        let ps = vec![
            ReferenceParticle::new(Point3::new(0.0, 0.0, 0.0), 5.0, Vec3::new(0.0, 1.0, 0.0), 0),
            ReferenceParticle::new(Point3::new(1.0, 0.0, 0.0), 2.0, Vec3::zero(), 1),
            ReferenceParticle::new(Point3::new(0.0, 2.0, 1.0), 1.0, Vec3::zero(), 2),
        ];
        let mut reversed = ps.clone();
        reversed.reverse();

        let mut a = ReferenceSystem::new(ps, 0.01, cfg()).unwrap();
        let mut b = ReferenceSystem::new(reversed, 0.01, cfg()).unwrap();
        let ext = [0.0, 1.0, 2.0];
        for _ in 0..3 {
            a.update(ExternalForces::new(&ext, &[], &[]), Vec3::zero()).unwrap();
            b.update(ExternalForces::new(&ext, &[], &[]), Vec3::zero()).unwrap();
        }
        for id in 0..3 {
            assert!(a.by_id(id).unwrap().approx_eq(b.by_id(id).unwrap(), 1e-12));
        }
    }

    #[test]
    fn rejects_bad_construction() {
        let p = ReferenceParticle::new(Point3::origin(), 1.0, Vec3::zero(), 0);
        assert!(ReferenceSystem::new(vec![], 0.1, cfg()).is_err());
        assert_eq!(
            ReferenceSystem::new(vec![p, p], 0.1, cfg()).unwrap_err(),
            SimError::DuplicateId(0)
        );
        let massless = ReferenceParticle { m: 0.0, ..p };
        assert!(matches!(
            ReferenceSystem::new(vec![massless], 0.1, cfg()),
            Err(SimError::NonPositiveMass { .. })
        ));
        assert_eq!(
            ReferenceSystem::new(vec![p], -1.0, cfg()).unwrap_err(),
            SimError::InvalidTimestep(-1.0)
        );
    }

    #[test]
    fn display_keeps_collection_order() {
        let sys = ReferenceSystem::new(
            vec![
                ReferenceParticle::new(Point3::new(0.0, 1.0, 0.0), 2.0, Vec3::zero(), 1),
                ReferenceParticle::new(Point3::origin(), 3.0, Vec3::new(1.0, 0.0, 0.0), 0),
            ],
            0.1,
            cfg(),
        )
        .unwrap();
        assert_eq!(
            sys.to_string(),
            "particle 1: p(0, 1, 0) m: 2 v(0, 0, 0)\nparticle 0: p(0, 0, 0) m: 3 v(1, 0, 0)\n"
        );
    }

    #[test]
    fn mismatched_external_is_rejected() {
        let p = ReferenceParticle::new(Point3::origin(), 1.0, Vec3::zero(), 0);
        let mut sys = ReferenceSystem::new(vec![p], 0.1, cfg()).unwrap();
        let ext = [1.0, 2.0];
        assert!(sys.update(ExternalForces::new(&[], &[], &ext), Vec3::zero()).is_err());
        assert!(sys.particles()[0].p.approx_eq(&Point3::origin(), 1e-300));
    }
}
