//! Error types for the MDP core library

use thiserror::Error;

/// Core error type for MDP operations
#[derive(Error, Debug)]
pub enum MarkovError {
    /// A distribution was rejected at construction
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Inverse-CDF lookup found no bucket covering the drawn value
    #[error("Sampling failure: no prefix sum covers {random_value} (prefix sums: {prefix_sums:?})")]
    SamplingFailure {
        /// The uniform draw that could not be placed
        random_value: f64,
        /// Snapshot of the cumulative weights at the time of the draw
        prefix_sums: Vec<f64>,
    },

    /// A dynamic programming loop hit its sweep cap
    #[error("No convergence after {sweeps} sweeps (last delta {delta})")]
    NonConvergence {
        /// Sweeps performed before giving up
        sweeps: usize,
        /// Largest value change in the final sweep
        delta: f64,
    },

    /// A parameter is out of its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MDP operations
pub type Result<T> = std::result::Result<T, MarkovError>;
