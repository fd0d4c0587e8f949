//! Direct-summation gravitational N-body engine over structure-of-arrays storage.
//!
//! A [`ParticleSystem`] owns index-aligned position, velocity, mass and force
//! arrays. Each call to [`ParticleSystem::update`] evaluates all pairwise
//! softened gravitational forces (O(n²)), adds per-particle external and
//! global forces, and advances the state with semi-implicit Euler.
//!
//! [`ReferenceSystem`] runs the same physics one record at a time and exists
//! to cross-check the optimized engine.
//!
//! ```
//! use soa_nbody::{ExternalForces, ParticleSystem, PhysicsConfig, InitRanges, Vec3};
//!
//! let mut rng = fastrand::Rng::with_seed(42);
//! let ranges = InitRanges::default();
//! let mut system = ParticleSystem::random(64, 0.01, PhysicsConfig::default(), &ranges, &mut rng)?;
//! system.update(ExternalForces::none(), Vec3::new(0.0, -9.81, 0.0))?;
//! assert!(system.is_finite());
//! # Ok::<(), soa_nbody::SimError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod particles;
pub mod random;
pub mod reference;
pub mod scenarios;
pub mod step;
pub mod vector;

pub use config::{ExecutionPolicy, PhysicsConfig, SimulationConfig, G};
pub use error::SimError;
pub use forces::ExternalForces;
pub use particles::ParticleSystem;
pub use random::{Bounds, InitRanges, UniformSource};
pub use reference::{ReferenceParticle, ReferenceSystem};
pub use vector::{Point3, Vec3};
