//! Structure-of-arrays particle store.
//!
//! Every array is index-aligned: slot `i` of `x`, `vx`, `m`, `gm` and `fx`
//! all describe the same particle. The arrays are private and only resized at
//! construction, so the alignment cannot be broken from outside.

use std::fmt;

use crate::config::{ExecutionPolicy, PhysicsConfig};
use crate::error::SimError;
use crate::random::{InitRanges, UniformSource};
use crate::reference::ReferenceParticle;
use crate::vector::{Point3, Vec3};

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) z: Vec<f64>,
    pub(crate) vx: Vec<f64>,
    pub(crate) vy: Vec<f64>,
    pub(crate) vz: Vec<f64>,
    pub(crate) m: Vec<f64>,
    /// G·m, kept in sync with `m`.
    pub(crate) gm: Vec<f64>,
    // Scratch: overwritten at the start of every step.
    pub(crate) fx: Vec<f64>,
    pub(crate) fy: Vec<f64>,
    pub(crate) fz: Vec<f64>,
    pub(crate) dt: f64,
    pub(crate) config: PhysicsConfig,
}

fn zeroed(count: usize) -> Result<Vec<f64>, SimError> {
    let mut v = Vec::new();
    v.try_reserve_exact(count).map_err(|_| SimError::Allocation(count))?;
    v.resize(count, 0.0);
    Ok(v)
}

pub(crate) fn check_timestep(dt: f64) -> Result<(), SimError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTimestep(dt))
    }
}

pub(crate) fn check_mass(index: usize, mass: f64) -> Result<(), SimError> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(SimError::NonPositiveMass { index, mass })
    }
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), SimError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SimError::NonFinite { field, index }),
        None => Ok(()),
    }
}

impl ParticleSystem {
    // Zero-filled arrays. Masses are zero here, so every public constructor
    // must seed and validate them before handing the system out.
    fn allocate(count: usize, dt: f64, config: PhysicsConfig) -> Result<Self, SimError> {
        if count == 0 {
            return Err(SimError::InvalidParticleCount(count));
        }
        check_timestep(dt)?;
        config.validate()?;
        Ok(ParticleSystem {
            x: zeroed(count)?,
            y: zeroed(count)?,
            z: zeroed(count)?,
            vx: zeroed(count)?,
            vy: zeroed(count)?,
            vz: zeroed(count)?,
            m: zeroed(count)?,
            gm: zeroed(count)?,
            fx: zeroed(count)?,
            fy: zeroed(count)?,
            fz: zeroed(count)?,
            dt,
            config,
        })
    }

    fn finish_masses(&mut self) -> Result<(), SimError> {
        for (i, &mass) in self.m.iter().enumerate() {
            check_mass(i, mass)?;
        }
        let g = self.config.gravitational_constant;
        for (gm, &m) in self.gm.iter_mut().zip(&self.m) {
            *gm = g * m;
        }
        Ok(())
    }

    /// `count` particles with positions, velocities and masses drawn uniformly from `ranges`.
    pub fn random<R: UniformSource + ?Sized>(
        count: usize,
        dt: f64,
        config: PhysicsConfig,
        ranges: &InitRanges,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        ranges.validate()?;
        let mut system = Self::allocate(count, dt, config)?;

        ranges.position.fill(rng, &mut system.x);
        ranges.position.fill(rng, &mut system.y);
        ranges.position.fill(rng, &mut system.z);

        ranges.mass.fill(rng, &mut system.m);

        ranges.velocity.fill(rng, &mut system.vx);
        ranges.velocity.fill(rng, &mut system.vy);
        ranges.velocity.fill(rng, &mut system.vz);

        system.finish_masses()?;
        Ok(system)
    }

    /// Build from explicit per-particle state; all three slices must be the same length.
    pub fn from_state(
        positions: &[Point3],
        velocities: &[Vec3],
        masses: &[f64],
        dt: f64,
        config: PhysicsConfig,
    ) -> Result<Self, SimError> {
        let count = positions.len();
        for (field, len) in [("velocities", velocities.len()), ("masses", masses.len())] {
            if len != count {
                return Err(SimError::LengthMismatch { field, expected: count, actual: len });
            }
        }
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(SimError::NonFinite { field: "position", index });
        }
        if let Some(index) = velocities.iter().position(|v| !v.is_finite()) {
            return Err(SimError::NonFinite { field: "velocity", index });
        }

        let mut system = Self::allocate(count, dt, config)?;
        for (i, (p, v)) in positions.iter().zip(velocities).enumerate() {
            system.x[i] = p.x;
            system.y[i] = p.y;
            system.z[i] = p.z;
            system.vx[i] = v.x;
            system.vy[i] = v.y;
            system.vz[i] = v.z;
        }
        system.m.copy_from_slice(masses);
        system.finish_masses()?;
        Ok(system)
    }

    /// Lay out reference records so that record `id` lands at index `id`.
    ///
    /// Ids must be a permutation of `0..particles.len()`.
    pub fn from_particles(
        particles: &[ReferenceParticle],
        dt: f64,
        config: PhysicsConfig,
    ) -> Result<Self, SimError> {
        let count = particles.len();
        let mut seen = vec![false; count];
        for p in particles {
            match seen.get_mut(p.id) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(SimError::DuplicateId(p.id)),
            }
        }

        let mut positions = vec![Point3::origin(); count];
        let mut velocities = vec![Vec3::zero(); count];
        let mut masses = vec![0.0; count];
        for p in particles {
            positions[p.id] = p.p;
            velocities[p.id] = p.v;
            masses[p.id] = p.m;
        }
        Self::from_state(&positions, &velocities, &masses, dt, config)
    }

    /// Snapshot as reference records, `id == index`.
    pub fn to_particles(&self) -> Vec<ReferenceParticle> {
        (0..self.len())
            .map(|i| ReferenceParticle {
                p: Point3::new(self.x[i], self.y[i], self.z[i]),
                m: self.m[i],
                v: Vec3::new(self.vx[i], self.vy[i], self.vz[i]),
                id: i,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.m.len()
    }

    /// Always false: construction rejects empty systems.
    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    pub fn timestep(&self) -> f64 {
        self.dt
    }

    pub fn set_timestep(&mut self, dt: f64) -> Result<(), SimError> {
        check_timestep(dt)?;
        self.dt = dt;
        Ok(())
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Switch between sequential and parallel execution between steps.
    pub fn set_execution(&mut self, execution: ExecutionPolicy) {
        self.config.execution = execution;
    }

    /// Replace particle `i`'s mass, keeping `gm` in sync. Rejects m <= 0.
    pub fn set_mass(&mut self, i: usize, mass: f64) -> Result<(), SimError> {
        let len = self.len();
        if i >= len {
            return Err(SimError::out_of_range(i, len));
        }
        check_mass(i, mass)?;
        self.m[i] = mass;
        self.gm[i] = self.config.gravitational_constant * mass;
        Ok(())
    }

    /// Overwrite particle `i`'s position and velocity.
    pub fn set_state(&mut self, i: usize, p: Point3, v: Vec3) -> Result<(), SimError> {
        let len = self.len();
        if i >= len {
            return Err(SimError::out_of_range(i, len));
        }
        if !p.is_finite() {
            return Err(SimError::NonFinite { field: "position", index: i });
        }
        if !v.is_finite() {
            return Err(SimError::NonFinite { field: "velocity", index: i });
        }
        self.x[i] = p.x;
        self.y[i] = p.y;
        self.z[i] = p.z;
        self.vx[i] = v.x;
        self.vy[i] = v.y;
        self.vz[i] = v.z;
        Ok(())
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn vx(&self) -> &[f64] {
        &self.vx
    }

    pub fn vy(&self) -> &[f64] {
        &self.vy
    }

    pub fn vz(&self) -> &[f64] {
        &self.vz
    }

    pub fn masses(&self) -> &[f64] {
        &self.m
    }

    pub fn gm(&self) -> &[f64] {
        &self.gm
    }

    /// Net force from the most recent step; zero before the first one.
    pub fn fx(&self) -> &[f64] {
        &self.fx
    }

    pub fn fy(&self) -> &[f64] {
        &self.fy
    }

    pub fn fz(&self) -> &[f64] {
        &self.fz
    }

    pub fn position(&self, i: usize) -> Option<Point3> {
        (i < self.len()).then(|| Point3::new(self.x[i], self.y[i], self.z[i]))
    }

    pub fn velocity(&self, i: usize) -> Option<Vec3> {
        (i < self.len()).then(|| Vec3::new(self.vx[i], self.vy[i], self.vz[i]))
    }

    pub fn force(&self, i: usize) -> Option<Vec3> {
        (i < self.len()).then(|| Vec3::new(self.fx[i], self.fy[i], self.fz[i]))
    }

    /// True when every state array is finite; used by drivers as a blow-up check.
    pub fn is_finite(&self) -> bool {
        [&self.x, &self.y, &self.z, &self.vx, &self.vy, &self.vz]
            .into_iter()
            .all(|a| check_finite("state", a).is_ok())
    }
}

/// One line per particle: position, mass, velocity and the last net force.
impl fmt::Display for ParticleSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len() {
            writeln!(
                f,
                "particle {i}: p({}) m: {} v({}) F({})",
                Point3::new(self.x[i], self.y[i], self.z[i]),
                self.m[i],
                Vec3::new(self.vx[i], self.vy[i], self.vz[i]),
                Vec3::new(self.fx[i], self.fy[i], self.fz[i]),
            )?;
        }
        Ok(())
    }
}
