//! Policy iteration: alternate evaluation with greedy improvement

use std::hash::Hash;

use indexmap::IndexSet;
use markov_core::{
    ActionValueFunction, MarkovDecisionProcess, ModelActionValues, Policy, RandomSelectPolicy,
    Result, SolverConfig, StochasticPolicy, ValueTable,
};
use tracing::{debug, info, warn};

use crate::evaluator::{check_sweep_cap, PolicyEvaluator};

/// Outcome of a policy iteration run
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyIteration<S, A>
where
    S: Eq + Hash,
{
    /// Greedy policy with respect to the final values, ties kept
    pub policy: StochasticPolicy<S, A>,
    /// Values of the last evaluated policy
    pub values: ValueTable<S>,
    /// Evaluate/improve rounds performed
    pub iterations: usize,
    /// Evaluation sweeps summed over every round
    pub evaluation_sweeps: usize,
}

/// Greedy policy improvement over a model
#[derive(Debug, Clone)]
pub struct PolicyIterator<'a, M> {
    mdp: &'a M,
    config: SolverConfig,
}

impl<'a, M> PolicyIterator<'a, M>
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

    /// Greedy improvement of `policy` against `values`.
    ///
    /// Only actions `policy` already takes with nonzero probability compete at
    /// each state, and every action tied for the best lookahead value is kept.
    /// An action dropped here can never come back in a later round.
    pub fn improve<P>(
        &self,
        policy: &P,
        values: &ValueTable<M::State>,
    ) -> StochasticPolicy<M::State, M::Action>
    where
        P: Policy<M::State, M::Action> + ?Sized,
    {
        let lookahead = ModelActionValues::new(self.mdp, values, self.config.discount);
        let mut improved = StochasticPolicy::new();

        for state in self.mdp.states() {
            let Some(actions) = self.mdp.actions_available(&state) else {
                continue;
            };
            let candidates: IndexSet<M::Action> = actions
                .into_iter()
                .filter(|action| policy.probability(&state, action) > 0.0)
                .collect();
            if candidates.is_empty() {
                warn!("policy gives no action a nonzero probability; state dropped");
                continue;
            }

            let best = lookahead.best_actions(&state, &candidates);
            improved.set_actions(state, best.into_iter().collect());
        }

        improved
    }

    /// Iterate from the uniform random policy until successive value tables
    /// agree within tolerance.
    ///
    /// Because improvement never widens the action set, the first round
    /// against the random policy's values fixes which actions survive. When
    /// that round drops the action an optimal policy needs, the result is the
    /// best policy over the survivors and can fall short of value iteration.
    pub fn solve(&self) -> Result<PolicyIteration<M::State, M::Action>> {
        let evaluator = PolicyEvaluator::new(self.mdp, &self.config)?;
        let random = RandomSelectPolicy::for_mdp(self.mdp);

        let first = evaluator.evaluate(&random)?;
        let mut evaluation_sweeps = first.sweeps;
        let mut policy = self.improve(&random, &first.values);
        let mut values = first.values;
        let mut iterations = 1;

        loop {
            let evaluation = evaluator.evaluate(&policy)?;
            evaluation_sweeps += evaluation.sweeps;
            iterations += 1;

            let delta = evaluation.values.max_abs_difference(&values);
            policy = self.improve(&policy, &evaluation.values);
            values = evaluation.values;
            debug!(iterations, delta, "policy iteration round");

            if delta <= self.config.tolerance {
                info!(iterations, evaluation_sweeps, "policy iteration converged");
                return Ok(PolicyIteration {
                    policy,
                    values,
                    iterations,
                    evaluation_sweeps,
                });
            }
            check_sweep_cap(&self.config, iterations, delta)?;
        }
    }
}

/// Run policy iteration on `mdp`
pub fn optimal_policy<M>(
    mdp: &M,
    config: &SolverConfig,
) -> Result<PolicyIteration<M::State, M::Action>>
where
    M: MarkovDecisionProcess,
{
    PolicyIterator::new(mdp, config)?.solve()
}
