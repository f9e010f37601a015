//! Iterative policy evaluation

use std::hash::Hash;

use markov_core::{
    state_value, MarkovDecisionProcess, MarkovError, Policy, Result, SolverConfig, ValueTable,
};
use tracing::{debug, info};

/// Fail with `NonConvergence` once `sweeps` reaches the configured cap
pub(crate) fn check_sweep_cap(config: &SolverConfig, sweeps: usize, delta: f64) -> Result<()> {
    match config.max_sweeps {
        Some(cap) if sweeps >= cap => Err(MarkovError::NonConvergence { sweeps, delta }),
        _ => Ok(()),
    }
}

/// Value table for a fixed policy and the sweeps it took
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<S>
where
    S: Eq + Hash,
{
    /// State values under the policy
    pub values: ValueTable<S>,
    /// Sweeps until the largest change fell within tolerance
    pub sweeps: usize,
}

/// Computes V^π by synchronous Bellman expectation sweeps.
///
/// Each sweep reads only the previous sweep's table, so the order states are
/// visited in does not affect the result.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator<'a, M> {
    mdp: &'a M,
    config: SolverConfig,
}

impl<'a, M> PolicyEvaluator<'a, M>
where
    M: MarkovDecisionProcess,
{
    /// Create an evaluator, rejecting an invalid config
    pub fn new(mdp: &'a M, config: &SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mdp,
            config: config.clone(),
        })
    }

    /// The solver settings in use
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Evaluate `policy` starting from an all-zero table
    pub fn evaluate<P>(&self, policy: &P) -> Result<Evaluation<M::State>>
    where
        P: Policy<M::State, M::Action> + ?Sized,
    {
        let states = self.mdp.states();
        let mut values = ValueTable::new();
        let mut sweeps = 0;

        loop {
            let next: ValueTable<M::State> = states
                .iter()
                .map(|state| {
                    let value =
                        state_value(self.mdp, policy, state, self.config.discount, &values);
                    (state.clone(), value)
                })
                .collect();
            let delta = next.max_abs_difference(&values);
            values = next;
            sweeps += 1;
            debug!(sweeps, delta, "policy evaluation sweep");

            if delta <= self.config.tolerance {
                info!(sweeps, states = states.len(), "policy evaluation converged");
                return Ok(Evaluation { values, sweeps });
            }
            check_sweep_cap(&self.config, sweeps, delta)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use markov_core::{RandomSelectPolicy, TableDrivenMdp, Transition, WeightedDistribution};

    fn loop_forever() -> TableDrivenMdp<&'static str, &'static str> {
        let mut mdp = TableDrivenMdp::default();
        mdp.insert(
            "spin",
            "again",
            WeightedDistribution::certain(Transition::new("spin", 1.0)),
        );
        mdp
    }

    #[test]
    fn test_geometric_series() {
        // V = 1 / (1 - 0.5)
        let mdp = loop_forever();
        let config = SolverConfig::new(1e-10, 0.5);
        let evaluator = PolicyEvaluator::new(&mdp, &config).unwrap();
        let evaluation = evaluator
            .evaluate(&RandomSelectPolicy::for_mdp(&mdp))
            .unwrap();
        assert_relative_eq!(evaluation.values.get(&"spin"), 2.0, epsilon = 1e-9);
        assert!(evaluation.sweeps > 1);
    }

    #[test]
    fn test_sweep_cap_reports_non_convergence() {
        let mdp = loop_forever();
        let config = SolverConfig::new(1e-6, 1.0).with_max_sweeps(Some(25));
        let evaluator = PolicyEvaluator::new(&mdp, &config).unwrap();
        match evaluator.evaluate(&RandomSelectPolicy::for_mdp(&mdp)) {
            Err(MarkovError::NonConvergence { sweeps, delta }) => {
                assert_eq!(sweeps, 25);
                assert_relative_eq!(delta, 1.0);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mdp = loop_forever();
        assert!(PolicyEvaluator::new(&mdp, &SolverConfig::new(1e-3, 1.5)).is_err());
    }

    #[test]
    fn test_empty_mdp_converges_immediately() {
        let mdp: TableDrivenMdp<u8, u8> = TableDrivenMdp::default();
        let evaluator = PolicyEvaluator::new(&mdp, &SolverConfig::default()).unwrap();
        let evaluation = evaluator
            .evaluate(&RandomSelectPolicy::for_mdp(&mdp))
            .unwrap();
        assert!(evaluation.values.is_empty());
        assert_eq!(evaluation.sweeps, 1);
    }
}
