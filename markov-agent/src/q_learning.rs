//! Tabular Q-learning
//!
//! [`QLearner`] only ever sees an [`Environment`]: it never inspects a model.
//! Estimates live in a [`SharedQTable`] so an exploration policy can read
//! them while the learner keeps writing.

use std::rc::Rc;

use indexmap::IndexSet;
use markov_core::{
    rollout, ActionValueFunction, Environment, EpsilonGreedyPolicy, Experience, LearnerConfig,
    MarkovError, Policy, QTable, Result, SharedQTable,
};
use rand::RngCore;
use tracing::{debug, info, trace};

use crate::step::{StepFunction, StepSize};

/// Off-policy TD(0) control over an environment
pub struct QLearner<E, F>
where
    E: Environment,
{
    environment: E,
    discount: f64,
    step_function: F,
    estimates: SharedQTable<E::State, E::Action>,
}

impl<E> QLearner<E, StepSize<E::State, E::Action>>
where
    E: Environment,
{
    /// Learner using the discount and step schedule from `config`
    pub fn from_config(environment: E, config: &LearnerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            environment,
            config.discount,
            StepSize::from_config(&config.step_size)?,
        )
    }
}

impl<E, F> QLearner<E, F>
where
    E: Environment,
    F: StepFunction<E::State, E::Action>,
{
    /// Create a learner with an empty Q-table
    pub fn new(environment: E, discount: f64, step_function: F) -> Result<Self> {
        if !(0.0..=1.0).contains(&discount) {
            return Err(MarkovError::InvalidParameter(format!(
                "discount must be between 0 and 1, got {discount}"
            )));
        }
        Ok(Self {
            environment,
            discount,
            step_function,
            estimates: Rc::default(),
        })
    }

    /// Run one episode from `initial`, updating after every step.
    ///
    /// Stops after `max_steps` steps or as soon as `policy` offers no action.
    /// Returns the number of steps taken.
    pub fn learn<P>(
        &mut self,
        policy: &P,
        initial: E::State,
        max_steps: usize,
        rng: &mut dyn RngCore,
    ) -> Result<usize>
    where
        P: Policy<E::State, E::Action> + ?Sized,
    {
        self.environment.reset(initial);
        let mut steps = 0;

        while steps < max_steps {
            let state = self.environment.current_state().clone();
            let Some(action) = policy.choose_action(&state, rng) else {
                break;
            };
            let (next_state, reward) = self.environment.step(&action, rng)?;
            self.update(&Experience {
                state,
                action,
                reward,
                next_state,
            });
            steps += 1;
        }

        debug!(steps, "q-learning episode");
        Ok(steps)
    }

    /// Run one episode from `initial`, then apply its updates newest first.
    ///
    /// The whole episode is held in memory, bounded by `max_steps`.
    pub fn learn_backwards<P>(
        &mut self,
        policy: &P,
        initial: E::State,
        max_steps: usize,
        rng: &mut dyn RngCore,
    ) -> Result<usize>
    where
        P: Policy<E::State, E::Action> + ?Sized,
    {
        let trajectory = rollout(&mut self.environment, policy, initial, max_steps, rng)?;
        for experience in trajectory.iter().rev() {
            self.update(experience);
        }

        debug!(steps = trajectory.len(), "backward q-learning episode");
        Ok(trajectory.len())
    }

    /// Run `config.episodes` episodes from `initial`, forward or backward per
    /// `config.backward`. Returns the total number of steps.
    pub fn train<P>(
        &mut self,
        policy: &P,
        initial: &E::State,
        config: &LearnerConfig,
        rng: &mut dyn RngCore,
    ) -> Result<usize>
    where
        P: Policy<E::State, E::Action> + ?Sized,
    {
        config.validate()?;
        let mut total = 0;
        for _ in 0..config.episodes {
            total += if config.backward {
                self.learn_backwards(policy, initial.clone(), config.max_steps, rng)?
            } else {
                self.learn(policy, initial.clone(), config.max_steps, rng)?
            };
        }
        info!(
            episodes = config.episodes,
            steps = total,
            backward = config.backward,
            "q-learning finished"
        );
        Ok(total)
    }

    /// Q(s,a) ← Q(s,a) + α·(r + γ·max Q(s',·) − Q(s,a)); the max is zero at terminal s'
    fn update(&mut self, experience: &Experience<E::State, E::Action>) {
        let Experience {
            state,
            action,
            reward,
            next_state,
        } = experience;

        let best_next = self
            .environment
            .actions_for(next_state)
            .and_then(|actions| self.estimates.max_q_value(next_state, &actions))
            .unwrap_or(0.0);
        let step_size = self.step_function.step_size(state, action);

        let mut estimates = self.estimates.borrow_mut();
        let current = estimates.get(state, action);
        let updated = current + step_size * (reward.0 + self.discount * best_next - current);
        trace!(current, updated, step_size, "q update");
        estimates.set(state.clone(), action.clone(), updated);
    }

    /// Current estimate of Q(s,a)
    pub fn estimate(&self, state: &E::State, action: &E::Action) -> f64 {
        self.estimates.borrow().get(state, action)
    }

    /// Shared handle to the live Q-table
    pub fn estimates(&self) -> SharedQTable<E::State, E::Action> {
        Rc::clone(&self.estimates)
    }

    /// Copy of the Q-table as it stands
    pub fn snapshot(&self) -> QTable<E::State, E::Action> {
        self.estimates.borrow().clone()
    }

    /// Epsilon-greedy policy reading this learner's live estimates.
    ///
    /// `actions` gives the action set at a state, as for [`EpsilonGreedyPolicy`].
    pub fn greedy_policy<G>(
        &self,
        epsilon: f64,
        actions: G,
    ) -> Result<EpsilonGreedyPolicy<SharedQTable<E::State, E::Action>, G>>
    where
        G: Fn(&E::State) -> Option<IndexSet<E::Action>>,
    {
        EpsilonGreedyPolicy::new(epsilon, self.estimates(), actions)
    }

    /// The environment being learned from
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Discount factor
    pub fn discount(&self) -> f64 {
        self.discount
    }
}
