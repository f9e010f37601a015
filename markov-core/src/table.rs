//! Table-driven MDP backed by explicit transition distributions

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::distribution::WeightedDistribution;
use crate::mdp::{MarkovDecisionProcess, Transition};
use crate::Reward;

/// Per-action transition distributions offered at one state
pub type ActionTable<S, A> = IndexMap<A, WeightedDistribution<Transition<S>>>;

/// State → action → distribution over transitions
pub type TransitionTable<S, A> = IndexMap<S, ActionTable<S, A>>;

/// MDP whose dynamics are an explicit [`TransitionTable`].
///
/// A state missing from the table, or mapped to no actions, is terminal.
#[derive(Debug, Clone)]
pub struct TableDrivenMdp<S, A> {
    transitions: TransitionTable<S, A>,
}

impl<S, A> Default for TableDrivenMdp<S, A> {
    fn default() -> Self {
        Self {
            transitions: IndexMap::new(),
        }
    }
}

impl<S, A> TableDrivenMdp<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    /// Wrap a fully populated transition table
    #[must_use]
    pub fn new(transitions: TransitionTable<S, A>) -> Self {
        Self { transitions }
    }

    /// Set the distribution for one (state, action) pair
    pub fn insert(
        &mut self,
        state: S,
        action: A,
        distribution: WeightedDistribution<Transition<S>>,
    ) -> Option<WeightedDistribution<Transition<S>>> {
        self.transitions
            .entry(state)
            .or_default()
            .insert(action, distribution)
    }

    /// Replace every action offered at `state`
    pub fn set_actions(&mut self, state: S, actions: ActionTable<S, A>) {
        self.transitions.insert(state, actions);
    }

    /// Drop `state` from the table, making it terminal
    pub fn remove_state(&mut self, state: &S) -> Option<ActionTable<S, A>> {
        self.transitions.shift_remove(state)
    }

    /// Rewrite the reward of every transition landing on `target`.
    ///
    /// Returns how many transitions were rewritten.
    pub fn overwrite_rewards_into(&mut self, target: &S, reward: Reward) -> usize {
        let mut rewritten = 0;
        for distribution in self.transitions.values_mut().flat_map(IndexMap::values_mut) {
            distribution.for_each_event_mut(|transition| {
                if transition.state == *target {
                    transition.reward = reward;
                    rewritten += 1;
                }
            });
        }
        debug!(rewritten, reward = reward.0, "overwrote rewards into state");
        rewritten
    }

    /// Whether `state` has an entry in the table
    #[must_use]
    pub fn contains_state(&self, state: &S) -> bool {
        self.transitions.contains_key(state)
    }

    /// Number of states with an entry
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// The underlying table
    #[must_use]
    pub fn table(&self) -> &TransitionTable<S, A> {
        &self.transitions
    }
}

impl<S, A> From<TransitionTable<S, A>> for TableDrivenMdp<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    fn from(transitions: TransitionTable<S, A>) -> Self {
        Self::new(transitions)
    }
}

impl<S, A> MarkovDecisionProcess for TableDrivenMdp<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    type State = S;
    type Action = A;

    fn states(&self) -> IndexSet<S> {
        self.transitions
            .iter()
            .filter(|(_, actions)| !actions.is_empty())
            .map(|(state, _)| state.clone())
            .collect()
    }

    fn actions_available(&self, state: &S) -> Option<IndexSet<A>> {
        self.transitions
            .get(state)
            .filter(|actions| !actions.is_empty())
            .map(|actions| actions.keys().cloned().collect())
    }

    fn transition_distribution(
        &self,
        state: &S,
        action: &A,
    ) -> Option<&WeightedDistribution<Transition<S>>> {
        self.transitions.get(state)?.get(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn split_path() -> TableDrivenMdp<&'static str, &'static str> {
        let mut mdp = TableDrivenMdp::default();
        mdp.insert(
            "start",
            "go",
            WeightedDistribution::new(vec![
                (Transition::new("left", 1.0), 0.5),
                (Transition::new("right", 3.0), 0.5),
            ])
            .unwrap(),
        );
        mdp.insert(
            "start",
            "wait",
            WeightedDistribution::certain(Transition::new("start", 0.0)),
        );
        mdp.insert(
            "left",
            "go",
            WeightedDistribution::certain(Transition::new("right", -2.0)),
        );
        mdp
    }

    #[test]
    fn test_states_and_actions() {
        let mdp = split_path();
        let states: Vec<_> = mdp.states().into_iter().collect();
        assert_eq!(states, vec!["start", "left"]);

        let actions = mdp.actions_available(&"start").unwrap();
        assert!(actions.contains("go") && actions.contains("wait"));
        assert!(mdp.actions_available(&"right").is_none());
        assert!(mdp.is_terminal(&"right"));
        assert!(!mdp.is_terminal(&"left"));
    }

    #[test]
    fn test_rewards() {
        let mdp = split_path();
        assert_relative_eq!(mdp.expected_reward(&"start", &"go").0, 2.0);
        assert_relative_eq!(mdp.reward(&"start", &"go", &"right").0, 3.0);
        assert_relative_eq!(mdp.reward(&"start", &"go", &"start").0, 0.0);
        assert_relative_eq!(mdp.expected_reward(&"right", &"go").0, 0.0);
    }

    #[test]
    fn test_unknown_pair_steps_in_place() {
        let mdp = split_path();
        let mut rng = StdRng::seed_from_u64(1);
        let (next, reward) = mdp.step(&"right", &"go", &mut rng).unwrap();
        assert_eq!(next, "right");
        assert_eq!(reward, Reward::ZERO);

        let (next, _) = mdp.step(&"left", &"missing", &mut rng).unwrap();
        assert_eq!(next, "left");
    }

    #[test]
    fn test_step_samples_support() {
        let mdp = split_path();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let (next, reward) = mdp.step(&"start", &"go", &mut rng).unwrap();
            assert_eq!(reward, mdp.reward(&"start", &"go", &next));
        }
    }

    #[test]
    fn test_overwrite_rewards_into() {
        let mut mdp = split_path();
        let rewritten = mdp.overwrite_rewards_into(&"right", Reward(50.0));
        assert_eq!(rewritten, 2);

        assert_relative_eq!(mdp.reward(&"start", &"go", &"right").0, 50.0);
        assert_relative_eq!(mdp.reward(&"left", &"go", &"right").0, 50.0);
        // other edges keep their rewards
        assert_relative_eq!(mdp.reward(&"start", &"go", &"left").0, 1.0);
        assert_relative_eq!(mdp.reward(&"start", &"wait", &"start").0, 0.0);
    }

    #[test]
    fn test_remove_state_makes_it_terminal() {
        let mut mdp = split_path();
        assert!(mdp.remove_state(&"left").is_some());
        assert!(mdp.is_terminal(&"left"));
        assert_eq!(mdp.states().len(), 1);
    }
}
