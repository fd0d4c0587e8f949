//! Uniform random seeding of initial conditions.
//!
//! The engine only needs "fill n values in [low, high)"; anything that can do
//! that implements [`UniformSource`]. `fastrand::Rng` is the stock source.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

pub trait UniformSource {
    /// Fill `out` with independent samples uniformly distributed in `[low, high)`.
    fn fill_uniform(&mut self, out: &mut [f64], low: f64, high: f64);
}

impl UniformSource for fastrand::Rng {
    fn fill_uniform(&mut self, out: &mut [f64], low: f64, high: f64) {
        let width = high - low;
        for v in out.iter_mut() {
            *v = low + width * self.f64();
        }
    }
}

/// Half-open sampling interval `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub const fn new(low: f64, high: f64) -> Self {
        Bounds { low, high }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.low.is_finite() && self.high.is_finite() && self.low < self.high {
            Ok(())
        } else {
            Err(SimError::InvalidBounds { low: self.low, high: self.high })
        }
    }

    pub fn fill<R: UniformSource + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        rng.fill_uniform(out, self.low, self.high);
    }
}

/// Per-field sampling ranges. Positions and velocities share one range on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitRanges {
    pub position: Bounds,
    pub velocity: Bounds,
    pub mass: Bounds,
}

impl InitRanges {
    /// All bounds well formed and masses strictly positive.
    pub fn validate(&self) -> Result<(), SimError> {
        self.position.validate()?;
        self.velocity.validate()?;
        self.mass.validate()?;
        if self.mass.low <= 0.0 {
            return Err(SimError::InvalidBounds { low: self.mass.low, high: self.mass.high });
        }
        Ok(())
    }
}

impl Default for InitRanges {
    fn default() -> Self {
        Self {
            position: Bounds::new(-2.0, 2.0),
            velocity: Bounds::new(-20.0, 20.0),
            mass: Bounds::new(1.0, 200.0),
        }
    }
}
