//! Environment traits and types

use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexSet;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mdp::MarkovDecisionProcess;
use crate::{Result, Reward};

/// Stateful view of a process: a current state plus a way to act on it
pub trait Environment {
    /// State type
    type State: Clone + Eq + Hash;
    /// Action type
    type Action: Clone + Eq + Hash;

    /// The state the environment is in
    fn current_state(&self) -> &Self::State;

    /// Actions offered at an arbitrary state, `None` if it is terminal
    fn actions_for(&self, state: &Self::State) -> Option<IndexSet<Self::Action>>;

    /// Actions offered at the current state
    fn available_actions(&self) -> Option<IndexSet<Self::Action>> {
        self.actions_for(self.current_state())
    }

    /// Move the cursor to `initial`
    fn reset(&mut self, initial: Self::State);

    /// Take `action` from the current state and observe the outcome
    fn step(
        &mut self,
        action: &Self::Action,
        rng: &mut dyn RngCore,
    ) -> Result<(Self::State, Reward)>;
}

/// Environment driven by sampling a shared MDP
pub struct MdpEnvironment<M>
where
    M: MarkovDecisionProcess,
{
    mdp: Rc<M>,
    current: M::State,
}

impl<M> MdpEnvironment<M>
where
    M: MarkovDecisionProcess,
{
    /// Create a new environment positioned at `initial`
    pub fn new(mdp: Rc<M>, initial: M::State) -> Self {
        Self {
            mdp,
            current: initial,
        }
    }

    /// The model behind this environment
    pub fn mdp(&self) -> &Rc<M> {
        &self.mdp
    }
}

impl<M> Environment for MdpEnvironment<M>
where
    M: MarkovDecisionProcess,
{
    type State = M::State;
    type Action = M::Action;

    fn current_state(&self) -> &M::State {
        &self.current
    }

    fn actions_for(&self, state: &M::State) -> Option<IndexSet<M::Action>> {
        self.mdp.actions_available(state)
    }

    fn reset(&mut self, initial: M::State) {
        self.current = initial;
    }

    fn step(&mut self, action: &M::Action, rng: &mut dyn RngCore) -> Result<(M::State, Reward)> {
        let (next, reward) = self.mdp.step(&self.current, action, rng)?;
        self.current = next.clone();
        Ok((next, reward))
    }
}

/// Episode information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether a terminal state was reached
    pub finished: bool,
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    env: E,
    episode: Episode,
    history: Vec<Episode>,
}

impl<E> TrackedEnvironment<E>
where
    E: Environment,
{
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: Episode::default(),
            history: Vec::new(),
        }
    }

    /// The episode in progress
    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Episodes closed by earlier resets, oldest first
    pub fn history(&self) -> &[Episode] {
        &self.history
    }

    /// Unwrap the inner environment
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E> Environment for TrackedEnvironment<E>
where
    E: Environment,
{
    type State = E::State;
    type Action = E::Action;

    fn current_state(&self) -> &E::State {
        self.env.current_state()
    }

    fn actions_for(&self, state: &E::State) -> Option<IndexSet<E::Action>> {
        self.env.actions_for(state)
    }

    fn reset(&mut self, initial: E::State) {
        let finished = std::mem::take(&mut self.episode);
        if finished.steps > 0 {
            self.history.push(finished);
        }
        self.env.reset(initial);
    }

    fn step(&mut self, action: &E::Action, rng: &mut dyn RngCore) -> Result<(E::State, Reward)> {
        let (next, reward) = self.env.step(action, rng)?;
        self.episode.steps += 1;
        self.episode.total_reward += reward.0;
        self.episode.finished = self.env.actions_for(&next).is_none();
        trace!(
            steps = self.episode.steps,
            total_reward = self.episode.total_reward,
            "tracked step"
        );
        Ok((next, reward))
    }
}
