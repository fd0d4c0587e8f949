//! Error types for the particle engine.

use thiserror::Error;

/// Errors raised by construction, mutation and stepping of a particle system.
///
/// Every variant is a precondition violation reported before any array is
/// mutated, so the system stays valid and inspectable after an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A mass was zero, negative or not finite.
    #[error("particle {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f64 },

    /// A physics parameter was zero, negative or not finite.
    #[error("{field} must be positive and finite, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    /// A system must hold at least one particle.
    #[error("invalid particle count {0}")]
    InvalidParticleCount(usize),

    /// The timestep must be finite and strictly positive.
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    /// A non-empty external force array did not match the particle count.
    #[error("external force on axis {axis} has {actual} entries, expected {expected}")]
    ExternalForceLength {
        axis: char,
        expected: usize,
        actual: usize,
    },

    /// Seeding arrays passed to a constructor had different lengths.
    #[error("{field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An input value was NaN or infinite.
    #[error("{field} at index {index} is not finite")]
    NonFinite { field: &'static str, index: usize },

    /// Indexed access past the end of a vector or array.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A sampling range was empty, inverted or not finite.
    #[error("invalid bounds [{low}, {high})")]
    InvalidBounds { low: f64, high: f64 },

    /// Two reference particles shared an id, or an id fell outside 0..n.
    #[error("particle id {0} is duplicated or out of range")]
    DuplicateId(usize),

    /// Storage for the requested particle count could not be reserved.
    #[error("failed to allocate storage for {0} particles")]
    Allocation(usize),
}

impl SimError {
    /// Creates an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
