//! Policy abstractions for action selection

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::distribution::{EventDistribution, UniformDistribution};
use crate::error::{MarkovError, Result};
use crate::mdp::MarkovDecisionProcess;
use crate::value::ActionValueFunction;

/// Core policy trait for selecting actions
pub trait Policy<S, A> {
    /// Probability of choosing `action` at `state`
    fn probability(&self, state: &S, action: &A) -> f64;

    /// Pick an action at `state`, or `None` when nothing is available
    fn choose_action(&self, state: &S, rng: &mut dyn RngCore) -> Option<A>;
}

fn uniform_pick<A: Clone>(actions: &IndexSet<A>, rng: &mut dyn RngCore) -> Option<A> {
    if actions.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..actions.len());
    actions.get_index(index).cloned()
}

/// Uniform choice among every action the model offers at a state
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSelectPolicy<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    actions: IndexMap<S, IndexSet<A>>,
}

impl<S, A> RandomSelectPolicy<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    /// Snapshot the action sets of every non-terminal state of `mdp`
    pub fn for_mdp<M>(mdp: &M) -> Self
    where
        M: MarkovDecisionProcess<State = S, Action = A> + ?Sized,
    {
        let actions = mdp
            .states()
            .into_iter()
            .filter_map(|state| {
                let available = mdp.actions_available(&state)?;
                Some((state, available))
            })
            .collect();
        Self { actions }
    }

    /// Build from explicit action sets. Empty sets are dropped.
    #[must_use]
    pub fn from_actions(actions: IndexMap<S, IndexSet<A>>) -> Self {
        Self {
            actions: actions
                .into_iter()
                .filter(|(_, available)| !available.is_empty())
                .collect(),
        }
    }
}

impl<S, A> Policy<S, A> for RandomSelectPolicy<S, A>
where
    S: Eq + Hash,
    A: Clone + Eq + Hash,
{
    #[allow(clippy::cast_precision_loss)]
    fn probability(&self, state: &S, action: &A) -> f64 {
        match self.actions.get(state) {
            Some(available) if available.contains(action) => 1.0 / available.len() as f64,
            _ => 0.0,
        }
    }

    fn choose_action(&self, state: &S, rng: &mut dyn RngCore) -> Option<A> {
        uniform_pick(self.actions.get(state)?, rng)
    }
}

/// Per-state bin of equally preferred actions. Ties stay in the bin.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticPolicy<S, A>
where
    S: Eq + Hash,
{
    choices: IndexMap<S, UniformDistribution<A>>,
}

impl<S, A> Default for StochasticPolicy<S, A>
where
    S: Eq + Hash,
{
    fn default() -> Self {
        Self {
            choices: IndexMap::new(),
        }
    }
}

impl<S, A> StochasticPolicy<S, A>
where
    S: Eq + Hash,
    A: PartialEq,
{
    /// Create a policy with no states
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from preferred actions per state. States with no actions are skipped.
    #[must_use]
    pub fn from_action_map(actions: IndexMap<S, Vec<A>>) -> Self {
        let mut policy = Self::new();
        for (state, preferred) in actions {
            policy.set_actions(state, preferred);
        }
        policy
    }

    /// Replace the preferred actions at `state`; an empty list removes the state
    pub fn set_actions(&mut self, state: S, preferred: Vec<A>) {
        match UniformDistribution::new(preferred) {
            Ok(bin) => {
                self.choices.insert(state, bin);
            }
            Err(_) => {
                self.choices.shift_remove(&state);
            }
        }
    }

    /// Preferred actions at `state`
    #[must_use]
    pub fn actions(&self, state: &S) -> Option<&[A]> {
        self.choices.get(state).map(UniformDistribution::events)
    }

    /// `(state, preferred actions)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&S, &[A])> + '_ {
        self.choices.iter().map(|(state, bin)| (state, bin.events()))
    }

    /// Number of states with a preference
    #[must_use]
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Whether no state has a preference
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl<S, A> Policy<S, A> for StochasticPolicy<S, A>
where
    S: Eq + Hash,
    A: Clone + PartialEq,
{
    fn probability(&self, state: &S, action: &A) -> f64 {
        self.choices
            .get(state)
            .map_or(0.0, |bin| bin.probability(|candidate| candidate == action))
    }

    fn choose_action(&self, state: &S, rng: &mut dyn RngCore) -> Option<A> {
        self.choices.get(state)?.events().choose(rng).cloned()
    }
}

/// Explores uniformly with probability epsilon, otherwise acts greedily on a Q-function.
///
/// `actions` supplies the action set at a state; `None` or an empty set means
/// the state is terminal. Greedy probability mass is split evenly across tied
/// maximal actions, so probabilities at a state sum to one.
#[derive(Debug, Clone)]
pub struct EpsilonGreedyPolicy<Q, F> {
    epsilon: f64,
    values: Q,
    actions: F,
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    if (0.0..=1.0).contains(&epsilon) {
        Ok(())
    } else {
        Err(MarkovError::InvalidParameter(format!(
            "epsilon must be between 0 and 1, got {epsilon}"
        )))
    }
}

impl<Q, F> EpsilonGreedyPolicy<Q, F> {
    /// Create a new epsilon-greedy policy
    pub fn new(epsilon: f64, values: Q, actions: F) -> Result<Self> {
        check_epsilon(epsilon)?;
        Ok(Self {
            epsilon,
            values,
            actions,
        })
    }

    /// Exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set the exploration rate
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        check_epsilon(epsilon)?;
        self.epsilon = epsilon;
        Ok(())
    }

    /// The action-value function being exploited
    pub fn values(&self) -> &Q {
        &self.values
    }
}

impl<S, A, Q, F> Policy<S, A> for EpsilonGreedyPolicy<Q, F>
where
    A: Clone + Eq + Hash,
    Q: ActionValueFunction<S, A>,
    F: Fn(&S) -> Option<IndexSet<A>>,
{
    #[allow(clippy::cast_precision_loss)]
    fn probability(&self, state: &S, action: &A) -> f64 {
        let Some(actions) = (self.actions)(state).filter(|set| set.contains(action)) else {
            return 0.0;
        };
        let ties = self.values.best_actions(state, &actions);
        let greedy = if ties.contains(action) {
            1.0 / ties.len() as f64
        } else {
            0.0
        };
        self.epsilon / actions.len() as f64 + (1.0 - self.epsilon) * greedy
    }

    fn choose_action(&self, state: &S, rng: &mut dyn RngCore) -> Option<A> {
        let actions = (self.actions)(state).filter(|set| !set.is_empty())?;
        if rng.gen::<f64>() < self.epsilon {
            uniform_pick(&actions, rng)
        } else {
            self.values.best_actions(state, &actions).first().cloned()
        }
    }
}
