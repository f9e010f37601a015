//! Value iteration: Bellman optimality sweeps that record the greedy policy as they go

use std::hash::Hash;

use markov_core::{
    ActionValueFunction, MarkovDecisionProcess, ModelActionValues, Result, SolverConfig,
    StochasticPolicy, ValueTable,
};
use tracing::{debug, info};

use crate::evaluator::check_sweep_cap;

/// Outcome of a value iteration run
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIteration<S, A>
where
    S: Eq + Hash,
{
    /// Optimal state values, within tolerance
    pub values: ValueTable<S>,
    /// Argmax actions from the final sweep, ties kept
    pub policy: StochasticPolicy<S, A>,
    /// Sweeps performed
    pub sweeps: usize,
}

/// Solves for V* with synchronous max-backups
#[derive(Debug, Clone)]
pub struct ValueIterator<'a, M> {
    mdp: &'a M,
    config: SolverConfig,
}

impl<'a, M> ValueIterator<'a, M>
where
    M: MarkovDecisionProcess,
{
    /// Create an iterator, rejecting an invalid config
    pub fn new(mdp: &'a M, config: &SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mdp,
            config: config.clone(),
        })
    }

    /// One backup of every state against `values`.
    ///
    /// Returns the new table, the argmax policy and the largest change.
    pub fn sweep(
        &self,
        values: &ValueTable<M::State>,
    ) -> (ValueTable<M::State>, StochasticPolicy<M::State, M::Action>, f64) {
        let lookahead = ModelActionValues::new(self.mdp, values, self.config.discount);
        let mut next = ValueTable::new();
        let mut policy = StochasticPolicy::new();
        let mut delta: f64 = 0.0;

        for state in self.mdp.states() {
            let Some(actions) = self.mdp.actions_available(&state) else {
                continue;
            };
            let Some(best) = lookahead.max_q_value(&state, &actions) else {
                continue;
            };
            delta = delta.max((best - values.get(&state)).abs());
            policy.set_actions(
                state.clone(),
                lookahead.best_actions(&state, &actions).into_iter().collect(),
            );
            next.set(state, best);
        }

        (next, policy, delta)
    }

    /// Sweep from an all-zero table until the largest change is within tolerance
    pub fn solve(&self) -> Result<ValueIteration<M::State, M::Action>> {
        let mut values = ValueTable::new();
        let mut sweeps = 0;

        loop {
            let (next, policy, delta) = self.sweep(&values);
            values = next;
            sweeps += 1;
            debug!(sweeps, delta, "value iteration sweep");

            if delta <= self.config.tolerance {
                info!(sweeps, "value iteration converged");
                return Ok(ValueIteration {
                    values,
                    policy,
                    sweeps,
                });
            }
            check_sweep_cap(&self.config, sweeps, delta)?;
        }
    }
}

/// Run value iteration on `mdp`
pub fn optimal_policy<M>(
    mdp: &M,
    config: &SolverConfig,
) -> Result<ValueIteration<M::State, M::Action>>
where
    M: MarkovDecisionProcess,
{
    ValueIterator::new(mdp, config)?.solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use markov_core::{MarkovError, TableDrivenMdp, Transition, WeightedDistribution};

    fn gamble() -> TableDrivenMdp<&'static str, &'static str> {
        let mut mdp = TableDrivenMdp::default();
        mdp.insert(
            "home",
            "safe",
            WeightedDistribution::certain(Transition::new("done", 4.0)),
        );
        mdp.insert(
            "home",
            "risky",
            WeightedDistribution::new(vec![
                (Transition::new("done", 10.0), 0.5),
                (Transition::new("home", 0.0), 0.5),
            ])
            .unwrap(),
        );
        mdp
    }

    #[test]
    fn test_single_sweep() {
        let mdp = gamble();
        let iterator = ValueIterator::new(&mdp, &SolverConfig::new(1e-9, 0.9)).unwrap();
        let (values, policy, delta) = iterator.sweep(&ValueTable::new());
        assert_relative_eq!(values.get(&"home"), 5.0);
        assert_relative_eq!(delta, 5.0);
        assert_eq!(policy.actions(&"home"), Some(&["risky"][..]));
    }

    #[test]
    fn test_converges_to_fixed_point() {
        // V = max(4, 5 + 0.45 V) = 5 / 0.55
        let mdp = gamble();
        let result = optimal_policy(&mdp, &SolverConfig::new(1e-10, 0.9)).unwrap();
        assert_relative_eq!(result.values.get(&"home"), 5.0 / 0.55, epsilon = 1e-8);
        assert_relative_eq!(result.values.get(&"done"), 0.0);
        assert_eq!(result.policy.actions(&"home"), Some(&["risky"][..]));
        assert!(result.policy.actions(&"done").is_none());
    }

    #[test]
    fn test_sweep_cap() {
        let mdp = gamble();
        let config = SolverConfig::new(1e-12, 0.9).with_max_sweeps(Some(3));
        assert!(matches!(
            optimal_policy(&mdp, &config),
            Err(MarkovError::NonConvergence { sweeps: 3, .. })
        ));
    }
}
