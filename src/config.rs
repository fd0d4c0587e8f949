//! Configuration for the engine and for driver runs.
//!
//! [`PhysicsConfig`] is owned by every [`ParticleSystem`](crate::ParticleSystem)
//! and fixes the gravitational constant, the softening length and the
//! execution policy. [`SimulationConfig`] is driver-facing: it adds the run
//! size, timestep, seed and initial-condition ranges, and can be loaded from
//! JSON.
//!
//! ```json
//! {
//!   "particles": 4000,
//!   "steps": 200,
//!   "timestep": 1.0,
//!   "seed": 12345,
//!   "global_force": { "x": 0.0, "y": -200.0, "z": 0.0 },
//!   "physics": {
//!     "gravitational_constant": 6.6743e-11,
//!     "softening": 1e-4,
//!     "execution": "parallel"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::random::InitRanges;
use crate::vector::Vec3;

/// Newtonian gravitational constant in SI units.
pub const G: f64 = 6.6743e-11;

/// Default softening length; the kernel adds its square to r².
pub const DEFAULT_SOFTENING: f64 = 1e-4;

/// How elementwise passes and the pairwise pass are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// Single thread; pairwise forces use symmetric i<j accumulation.
    #[default]
    Sequential,
    /// Rayon data parallelism; each worker computes the force on its own indices.
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravitational_constant: f64,
    /// Softening length ε. Forces use (r² + ε²)^{-3/2}.
    pub softening: f64,
    pub execution: ExecutionPolicy,
}

impl PhysicsConfig {
    /// G and ε must both be finite and strictly positive.
    pub fn validate(&self) -> Result<(), SimError> {
        for (field, value) in [
            ("gravitational_constant", self.gravitational_constant),
            ("softening", self.softening),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }

    pub fn eps2(&self) -> f64 {
        self.softening * self.softening
    }

    pub fn with_execution(mut self, execution: ExecutionPolicy) -> Self {
        self.execution = execution;
        self
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: G,
            softening: DEFAULT_SOFTENING,
            execution: ExecutionPolicy::Sequential,
        }
    }
}

/// A full driver run: how many particles, how long, and under which forces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub particles: usize,
    pub steps: usize,
    pub timestep: f64,
    pub seed: u64,
    pub ranges: InitRanges,
    pub global_force: Vec3,
    /// Half-width of the uniform per-particle external force; zero disables it.
    pub external_force_magnitude: f64,
    pub physics: PhysicsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particles: 4000,
            steps: 200,
            timestep: 1.0,
            seed: 12345,
            ranges: InitRanges::default(),
            global_force: Vec3::zero(),
            external_force_magnitude: 0.0,
            physics: PhysicsConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
