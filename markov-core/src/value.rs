//! Value tables and one-step lookahead

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::distribution::EventDistribution;
use crate::mdp::MarkovDecisionProcess;
use crate::policy::Policy;

/// Two action values closer than this are treated as tied
pub const TIE_TOLERANCE: f64 = 1e-9;

/// State value function V(s)
pub trait ValueFunction<S> {
    /// Estimated value of `state`
    fn value(&self, state: &S) -> f64;
}

/// Action value function Q(s, a)
pub trait ActionValueFunction<S, A> {
    /// Estimated value of taking `action` at `state`
    fn q_value(&self, state: &S, action: &A) -> f64;

    /// Largest Q-value among `actions`, `None` when there are none
    fn max_q_value<'a, I>(&self, state: &S, actions: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a A>,
        A: 'a,
    {
        actions
            .into_iter()
            .map(|action| self.q_value(state, action))
            .fold(None, |best, q| Some(best.map_or(q, |b: f64| b.max(q))))
    }

    /// Every action within [`TIE_TOLERANCE`] of the maximum, in `actions` order
    fn best_actions(&self, state: &S, actions: &IndexSet<A>) -> IndexSet<A>
    where
        A: Clone + Eq + Hash,
    {
        let Some(best) = self.max_q_value(state, actions) else {
            return IndexSet::new();
        };
        actions
            .iter()
            .filter(|action| best - self.q_value(state, action) <= TIE_TOLERANCE)
            .cloned()
            .collect()
    }
}

impl<S, T> ValueFunction<S> for &T
where
    T: ValueFunction<S> + ?Sized,
{
    fn value(&self, state: &S) -> f64 {
        (**self).value(state)
    }
}

impl<S, A, T> ActionValueFunction<S, A> for &T
where
    T: ActionValueFunction<S, A> + ?Sized,
{
    fn q_value(&self, state: &S, action: &A) -> f64 {
        (**self).q_value(state, action)
    }
}

/// Tabular V(s); unseen states are worth zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueTable<S>
where
    S: Eq + Hash,
{
    values: IndexMap<S, f64>,
}

impl<S> Default for ValueTable<S>
where
    S: Eq + Hash,
{
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }
}

impl<S> ValueTable<S>
where
    S: Eq + Hash,
{
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `state`, zero if never set
    #[must_use]
    pub fn get(&self, state: &S) -> f64 {
        self.values.get(state).copied().unwrap_or(0.0)
    }

    /// Set the value of `state`
    pub fn set(&mut self, state: S, value: f64) {
        self.values.insert(state, value);
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored `(state, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> + '_ {
        self.values.iter().map(|(state, value)| (state, *value))
    }

    /// Sum of all stored values
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// Largest absolute difference over the union of both key sets
    #[must_use]
    pub fn max_abs_difference(&self, other: &Self) -> f64 {
        let ours = self
            .values
            .iter()
            .map(|(state, value)| (value - other.get(state)).abs());
        let theirs = other
            .values
            .iter()
            .filter(|(state, _)| !self.values.contains_key(*state))
            .map(|(_, value)| value.abs());
        ours.chain(theirs).fold(0.0, f64::max)
    }
}

impl<S> FromIterator<(S, f64)> for ValueTable<S>
where
    S: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<S> ValueFunction<S> for ValueTable<S>
where
    S: Eq + Hash,
{
    fn value(&self, state: &S) -> f64 {
        self.get(state)
    }
}

/// Tabular Q(s, a) with a hierarchical zero default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    values: IndexMap<S, IndexMap<A, f64>>,
}

impl<S, A> Default for QTable<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }
}

impl<S, A> QTable<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Q-value of the pair, zero if the state or the action was never set
    #[must_use]
    pub fn get(&self, state: &S, action: &A) -> f64 {
        self.values
            .get(state)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Set the Q-value of a pair
    pub fn set(&mut self, state: S, action: A, value: f64) {
        self.values.entry(state).or_default().insert(action, value);
    }

    /// Stored action values for `state`
    #[must_use]
    pub fn actions(&self, state: &S) -> Option<&IndexMap<A, f64>> {
        self.values.get(state)
    }

    /// Largest stored value at `state`
    #[must_use]
    pub fn max_value(&self, state: &S) -> Option<f64> {
        self.values
            .get(state)?
            .values()
            .copied()
            .reduce(f64::max)
    }

    /// First stored action holding the largest value at `state`
    #[must_use]
    pub fn greedy_action(&self, state: &S) -> Option<&A> {
        let best = self.max_value(state)?;
        self.values
            .get(state)?
            .iter()
            .find(|(_, value)| best - **value <= TIE_TOLERANCE)
            .map(|(action, _)| action)
    }

    /// States with at least one stored entry
    pub fn states(&self) -> impl Iterator<Item = &S> + '_ {
        self.values.keys()
    }

    /// Number of states with stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S, A> ActionValueFunction<S, A> for QTable<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    fn q_value(&self, state: &S, action: &A) -> f64 {
        self.get(state, action)
    }
}

/// Q-table handle shared between a learner and the policy exploring with it
pub type SharedQTable<S, A> = Rc<RefCell<QTable<S, A>>>;

impl<S, A> ActionValueFunction<S, A> for Rc<RefCell<QTable<S, A>>>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    fn q_value(&self, state: &S, action: &A) -> f64 {
        self.borrow().get(state, action)
    }
}

/// One-step lookahead: Σ p · (r + γ · V(s')) over the pair's transitions.
///
/// Zero when the pair is unknown.
pub fn action_value<M, V>(
    mdp: &M,
    state: &M::State,
    action: &M::Action,
    discount: f64,
    values: &V,
) -> f64
where
    M: MarkovDecisionProcess + ?Sized,
    V: ValueFunction<M::State> + ?Sized,
{
    mdp.transition_distribution(state, action)
        .map_or(0.0, |dist| {
            dist.expectation(|transition| {
                transition.reward.0 + discount * values.value(&transition.state)
            })
        })
}

/// Bellman expectation backup at `state` under `policy`. Terminal states are worth zero.
pub fn state_value<M, P, V>(
    mdp: &M,
    policy: &P,
    state: &M::State,
    discount: f64,
    values: &V,
) -> f64
where
    M: MarkovDecisionProcess + ?Sized,
    P: Policy<M::State, M::Action> + ?Sized,
    V: ValueFunction<M::State> + ?Sized,
{
    mdp.actions_available(state).map_or(0.0, |actions| {
        actions
            .iter()
            .map(|action| {
                let weight = policy.probability(state, action);
                if weight == 0.0 {
                    0.0
                } else {
                    weight * action_value(mdp, state, action, discount, values)
                }
            })
            .sum()
    })
}

/// Q-values read off a model and a state value table by one-step lookahead
#[derive(Debug, Clone, Copy)]
pub struct ModelActionValues<'a, M, V> {
    mdp: &'a M,
    values: &'a V,
    discount: f64,
}

impl<'a, M, V> ModelActionValues<'a, M, V> {
    /// Wrap a model and the value table to look ahead into
    pub fn new(mdp: &'a M, values: &'a V, discount: f64) -> Self {
        Self {
            mdp,
            values,
            discount,
        }
    }
}

impl<M, V> ActionValueFunction<M::State, M::Action> for ModelActionValues<'_, M, V>
where
    M: MarkovDecisionProcess,
    V: ValueFunction<M::State>,
{
    fn q_value(&self, state: &M::State, action: &M::Action) -> f64 {
        action_value(self.mdp, state, action, self.discount, self.values)
    }
}
