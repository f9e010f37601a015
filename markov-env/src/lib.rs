//! Concrete Markov decision processes
//!
//! This crate provides ready-made models built on
//! [`markov_core::TableDrivenMdp`]:
//! - a configurable grid world with goals, vortices, nexuses and stochastic rewards
//! - small classic fixtures with closed-form solutions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classic;
pub mod grid_world;

// Re-export environments
pub use classic::{corridor, meadow, two_state_chain, CorridorMove, MeadowAction, MeadowState};
pub use grid_world::{GridAction, GridSquare, GridWorld};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{GridAction, GridSquare, GridWorld};
    pub use markov_core::prelude::*;
}
