//! One simulation step: force evaluation, then integration.

use crate::error::SimError;
use crate::forces::{evaluate_forces, ExternalForces, ForceAccumulators, Positions};
use crate::integrator::{semi_implicit_euler, Axis};
use crate::particles::ParticleSystem;
use crate::vector::Vec3;

impl ParticleSystem {
    /// Advance the system by one timestep.
    ///
    /// `external` holds optional per-particle forces (empty axes count as
    /// zero); `global` is added to every particle. A malformed input is
    /// rejected before anything is written, leaving the previous state intact.
    pub fn update(&mut self, external: ExternalForces<'_>, global: Vec3) -> Result<(), SimError> {
        let ParticleSystem { x, y, z, vx, vy, vz, m, gm, fx, fy, fz, dt, config } = self;
        let policy = config.execution;

        evaluate_forces(
            Positions { x: &x[..], y: &y[..], z: &z[..] },
            &m[..],
            &gm[..],
            config.eps2(),
            external,
            global,
            ForceAccumulators { x: &mut fx[..], y: &mut fy[..], z: &mut fz[..] },
            policy,
        )?;

        semi_implicit_euler(
            [
                Axis { p: &mut x[..], v: &mut vx[..], f: &fx[..] },
                Axis { p: &mut y[..], v: &mut vy[..], f: &fy[..] },
                Axis { p: &mut z[..], v: &mut vz[..], f: &fz[..] },
            ],
            &m[..],
            *dt,
            policy,
        );
        Ok(())
    }

    /// Run `steps` updates with the same forcing; stops at the first error.
    pub fn step_n(
        &mut self,
        steps: usize,
        external: ExternalForces<'_>,
        global: Vec3,
    ) -> Result<(), SimError> {
        for _ in 0..steps {
            self.update(external, global)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecutionPolicy, PhysicsConfig};
    use crate::random::InitRanges;
    use crate::vector::Point3;

    #[test]
    fn free_particle_drifts() {
        let mut sys = ParticleSystem::from_state(
            &[Point3::new(1.0, 2.0, 3.0)],
            &[Vec3::new(1.0, -1.0, 0.5)],
            &[2.0],
            0.25,
            PhysicsConfig::default(),
        )
        .unwrap();
        sys.step_n(4, ExternalForces::none(), Vec3::zero()).unwrap();
        assert!(sys.position(0).unwrap().approx_eq(&Point3::new(2.0, 1.0, 3.5), 1e-12));
        assert!(sys.velocity(0).unwrap().approx_eq(&Vec3::new(1.0, -1.0, 0.5), 1e-15));
    }

    #[test]
    fn rejected_step_leaves_state_untouched() {
        let mut rng = fastrand::Rng::with_seed(3);
        let ranges = InitRanges::default();
        let mut sys =
            ParticleSystem::random(8, 0.01, PhysicsConfig::default(), &ranges, &mut rng).unwrap();
        sys.update(ExternalForces::none(), Vec3::new(0.0, -9.8, 0.0)).unwrap();
        let before = sys.clone();

        let wrong = vec![1.0; 7];
        let err = sys.update(ExternalForces::new(&wrong, &[], &[]), Vec3::zero()).unwrap_err();
        assert_eq!(err, SimError::ExternalForceLength { axis: 'x', expected: 8, actual: 7 });
        assert!(sys.update(ExternalForces::none(), Vec3::new(f64::NAN, 0.0, 0.0)).is_err());

        assert_eq!(sys.x(), before.x());
        assert_eq!(sys.vy(), before.vy());
        assert_eq!(sys.fx(), before.fx());
    }

    #[test]
    fn execution_policies_agree_over_steps() {
        let mut rng = fastrand::Rng::with_seed(11);
        let cfg = PhysicsConfig { gravitational_constant: 1.0, ..PhysicsConfig::default() };
        let ranges = InitRanges::default();
        let mut seq = ParticleSystem::random(100, 1e-4, cfg, &ranges, &mut rng).unwrap();
        let mut par = seq.clone();
        par.set_execution(ExecutionPolicy::Parallel);

        let ext: Vec<f64> = (0..100).map(|i| (i % 7) as f64 - 3.0).collect();
        for _ in 0..5 {
            seq.update(ExternalForces::new(&[], &ext, &[]), Vec3::new(0.0, 0.0, -1.0)).unwrap();
            par.update(ExternalForces::new(&[], &ext, &[]), Vec3::new(0.0, 0.0, -1.0)).unwrap();
        }
        for i in 0..100 {
            assert!(seq.position(i).unwrap().approx_eq(&par.position(i).unwrap(), 1e-9));
            assert!(seq.velocity(i).unwrap().approx_eq(&par.velocity(i).unwrap(), 1e-7));
        }
    }
}
