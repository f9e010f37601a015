//! Solvers for finite Markov decision processes
//!
//! This crate provides the planning and learning engines:
//! - Policy evaluation (synchronous Bellman expectation sweeps)
//! - Policy iteration
//! - Value iteration
//! - Tabular Q-learning with pluggable step-size schedules

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod evaluator;
pub mod policy_iteration;
pub mod q_learning;
pub mod step;
pub mod value_iteration;

// Re-export solvers
pub use evaluator::{Evaluation, PolicyEvaluator};
pub use policy_iteration::{PolicyIteration, PolicyIterator};
pub use q_learning::QLearner;
pub use value_iteration::{ValueIteration, ValueIterator};

// Re-export step schedules
pub use step::{ConstantStep, DecayingStep, StepFunction, StepSize};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConstantStep, DecayingStep, PolicyEvaluator, PolicyIterator, QLearner, StepFunction,
        StepSize, ValueIterator,
    };
    pub use markov_core::prelude::*;
}
