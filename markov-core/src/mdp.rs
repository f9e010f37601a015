//! The Markov decision process contract

use std::hash::Hash;

use indexmap::IndexSet;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::distribution::{EventDistribution, WeightedDistribution};
use crate::{Result, Reward};

/// Outcome of taking an action: the state landed in and the reward on that edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition<S> {
    /// Destination state
    pub state: S,
    /// Reward carried by this edge
    pub reward: Reward,
}

impl<S> Transition<S> {
    /// Create a new transition
    pub fn new(state: S, reward: impl Into<Reward>) -> Self {
        Self {
            state,
            reward: reward.into(),
        }
    }
}

/// A finite MDP.
///
/// Lookups on unknown states or actions never fail: they resolve to no
/// actions, zero reward, or a stay-in-place step.
pub trait MarkovDecisionProcess {
    /// State type
    type State: Clone + Eq + Hash;
    /// Action type
    type Action: Clone + Eq + Hash;

    /// Every state with at least one outgoing action
    fn states(&self) -> IndexSet<Self::State>;

    /// Actions offered at `state`, or `None` when it is terminal or unknown
    fn actions_available(&self, state: &Self::State) -> Option<IndexSet<Self::Action>>;

    /// Full transition distribution for a (state, action) pair
    fn transition_distribution(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Option<&WeightedDistribution<Transition<Self::State>>>;

    /// Whether no action is available at `state`
    fn is_terminal(&self, state: &Self::State) -> bool {
        self.actions_available(state).is_none()
    }

    /// Expected immediate reward of taking `action` at `state`
    fn expected_reward(&self, state: &Self::State, action: &Self::Action) -> Reward {
        self.transition_distribution(state, action)
            .map_or(Reward::ZERO, |dist| {
                Reward(dist.expectation(|transition| transition.reward.0))
            })
    }

    /// Reward on the edge from `state` via `action` into `target`, zero if no such edge
    fn reward(&self, state: &Self::State, action: &Self::Action, target: &Self::State) -> Reward {
        self.transition_distribution(state, action)
            .and_then(|dist| dist.first_matching(|transition| transition.state == *target))
            .map_or(Reward::ZERO, |transition| transition.reward)
    }

    /// Sample one transition. An unknown pair stays at `state` with zero reward.
    fn step(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut dyn RngCore,
    ) -> Result<(Self::State, Reward)> {
        match self.transition_distribution(state, action) {
            Some(dist) => {
                let transition = dist.sample(rng)?;
                Ok((transition.state.clone(), transition.reward))
            }
            None => Ok((state.clone(), Reward::ZERO)),
        }
    }
}
