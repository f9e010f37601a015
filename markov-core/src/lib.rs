//! Core traits and types for finite Markov decision processes
//!
//! This crate provides the building blocks the solvers in `markov-agent`
//! work against: weighted distributions, the MDP contract and its
//! table-driven implementation, policies, value tables and environments.
//! Every stochastic operation takes an explicit random source so runs are
//! reproducible from a seed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod distribution;
pub mod environment;
pub mod error;
pub mod mdp;
pub mod policy;
pub mod reward;
pub mod table;
pub mod trajectory;
pub mod value;

// Re-export core traits and types
pub use config::{LearnerConfig, SolverConfig, StepSizeConfig};
pub use distribution::{
    EmpiricalDistribution, EventDistribution, UniformDistribution, WeightedDistribution,
    DEFAULT_TOLERANCE,
};
pub use environment::{Environment, Episode, MdpEnvironment, TrackedEnvironment};
pub use error::{MarkovError, Result};
pub use mdp::{MarkovDecisionProcess, Transition};
pub use policy::{EpsilonGreedyPolicy, Policy, RandomSelectPolicy, StochasticPolicy};
pub use reward::Reward;
pub use table::{ActionTable, TableDrivenMdp, TransitionTable};
pub use trajectory::{rollout, Experience, Trajectory};
pub use value::{
    action_value, state_value, ActionValueFunction, ModelActionValues, QTable, SharedQTable,
    ValueFunction, ValueTable, TIE_TOLERANCE,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ActionValueFunction, Environment, EpsilonGreedyPolicy, EventDistribution,
        MarkovDecisionProcess, MdpEnvironment, Policy, RandomSelectPolicy, Result, Reward,
        SolverConfig, StochasticPolicy, TableDrivenMdp, Transition, ValueFunction, ValueTable,
        WeightedDistribution,
    };
}
