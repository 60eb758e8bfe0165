//! Configuration errors.
//!
//! Everything that can go wrong is caught while models, layers and grids are
//! being built. Stepping a simulation never fails.

/// Errors raised while setting up a dispersal simulation.
#[derive(Debug, thiserror::Error)]
pub enum DispersalError {
    /// A kernel radius must be at least one cell.
    #[error("dispersal radius must be positive, got {0}")]
    InvalidRadius(usize),

    /// A base probability outside of `[0, 1]` (or NaN) was supplied.
    #[error("probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    /// A layer sequence entry has a non-finite or non-positive span.
    #[error("layer timespan must be finite and positive, got {0}")]
    InvalidTimespan(f64),

    /// Simulation time must be a finite number.
    #[error("start time must be finite, got {0}")]
    InvalidStartTime(f64),

    /// A layer sequence has no entries.
    #[error("layer sequence must contain at least one layer")]
    EmptySequence,

    /// A raster does not line up with the grid (or with its siblings).
    #[error("raster shape {found:?} does not match expected shape {expected:?}")]
    ShapeMismatch {
        /// The shape everything must agree on.
        expected: (usize, usize),
        /// The offending shape.
        found: (usize, usize),
    },

    /// Grids must have at least one cell.
    #[error("grid is empty, which isnt allowed")]
    EmptyGrid,

    /// The configuration document could not be parsed.
    #[error("failed to parse dispersal config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DispersalError>;

/// Reject probabilities that cannot be clamped into meaning.
pub(crate) fn check_probability(prob: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&prob) {
        Ok(prob)
    } else {
        Err(DispersalError::InvalidProbability(prob))
    }
}
