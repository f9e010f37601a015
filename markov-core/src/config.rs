//! Solver and learner configuration
//!
//! Both configs deserialize from JSON with every field optional; missing
//! fields take their defaults. Loading always validates.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MarkovError::InvalidParameter(format!(
            "{name} must be between 0 and 1, got {value}"
        )))
    }
}

/// Configuration for the dynamic programming solvers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Convergence threshold on the largest per-sweep value change
    pub tolerance: f64,
    /// Discount factor
    pub discount: f64,
    /// Sweeps allowed before giving up with `NonConvergence`; `None` is unbounded
    pub max_sweeps: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            discount: 0.9,
            max_sweeps: Some(10_000),
        }
    }
}

impl SolverConfig {
    /// Config with the given tolerance and discount and the default sweep cap
    #[must_use]
    pub fn new(tolerance: f64, discount: f64) -> Self {
        Self {
            tolerance,
            discount,
            ..Self::default()
        }
    }

    /// Replace the sweep cap
    #[must_use]
    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Reject settings under which the solvers are meaningless or may never stop
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(MarkovError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        check_unit_interval("discount", self.discount)?;
        if self.discount >= 1.0 && self.max_sweeps.is_none() {
            return Err(MarkovError::InvalidParameter(
                "an undiscounted solve needs a sweep cap".to_string(),
            ));
        }
        if self.max_sweeps == Some(0) {
            return Err(MarkovError::InvalidParameter(
                "max_sweeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}

/// Learning-rate schedule selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schedule", rename_all = "snake_case")]
pub enum StepSizeConfig {
    /// The same step size for every update
    Constant {
        /// Step size in (0, 1]
        step_size: f64,
    },
    /// `max(1 / (1 + visits), minimum)` per (state, action)
    Decaying {
        /// Floor the step size never drops below
        minimum: f64,
    },
}

impl Default for StepSizeConfig {
    fn default() -> Self {
        Self::Decaying { minimum: 0.05 }
    }
}

impl StepSizeConfig {
    /// Reject step sizes outside (0, 1] and floors outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Constant { step_size } if step_size > 0.0 && step_size <= 1.0 => Ok(()),
            Self::Constant { step_size } => Err(MarkovError::InvalidParameter(format!(
                "step_size must be in (0, 1], got {step_size}"
            ))),
            Self::Decaying { minimum } => check_unit_interval("minimum", minimum),
        }
    }
}

/// Configuration for Q-learning runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Discount factor
    pub discount: f64,
    /// Exploration rate of the epsilon-greedy behaviour policy
    pub epsilon: f64,
    /// Learning-rate schedule
    pub step_size: StepSizeConfig,
    /// Step cap per episode
    pub max_steps: usize,
    /// Number of episodes to run
    pub episodes: usize,
    /// Replay each episode backwards instead of updating online
    pub backward: bool,
    /// Random seed
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            discount: 0.9,
            epsilon: 0.1,
            step_size: StepSizeConfig::default(),
            max_steps: 1000,
            episodes: 500,
            backward: false,
            seed: None,
        }
    }
}

impl LearnerConfig {
    /// Check every field is in range
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("discount", self.discount)?;
        check_unit_interval("epsilon", self.epsilon)?;
        self.step_size.validate()?;
        if self.max_steps == 0 {
            return Err(MarkovError::InvalidParameter(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}
