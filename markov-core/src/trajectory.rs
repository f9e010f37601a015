//! Trajectory and experience storage

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::policy::Policy;
use crate::{Result, Reward};

/// One recorded step: where the agent was, what it did, and what came of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience<S, A> {
    /// State the action was taken in
    pub state: S,
    /// Action taken
    pub action: A,
    /// Reward received
    pub reward: Reward,
    /// State landed in
    pub next_state: S,
}

/// Complete trajectory of an episode
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<S, A> {
    experiences: Vec<Experience<S, A>>,
    total_reward: f64,
}

impl<S, A> Default for Trajectory<S, A> {
    fn default() -> Self {
        Self {
            experiences: Vec::new(),
            total_reward: 0.0,
        }
    }
}

impl<S, A> Trajectory<S, A> {
    /// Create a new empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an experience to the trajectory
    pub fn push(&mut self, experience: Experience<S, A>) {
        self.total_reward += experience.reward.0;
        self.experiences.push(experience);
    }

    /// Get the length of the trajectory
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiences.len()
    }

    /// Check if trajectory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
    }

    /// Undiscounted sum of rewards
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Recorded experiences, oldest first
    #[must_use]
    pub fn experiences(&self) -> &[Experience<S, A>] {
        &self.experiences
    }

    /// Experiences, oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, Experience<S, A>> {
        self.experiences.iter()
    }

    /// Discounted return from every position onward
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for (i, experience) in self.experiences.iter().enumerate().rev() {
            running_return = experience.reward.0 + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }

    /// Discounted return from the first step
    #[must_use]
    pub fn discounted_return(&self, gamma: f64) -> f64 {
        self.experiences
            .iter()
            .rev()
            .fold(0.0, |running, experience| experience.reward.0 + gamma * running)
    }
}

impl<S, A> IntoIterator for Trajectory<S, A> {
    type Item = Experience<S, A>;
    type IntoIter = std::vec::IntoIter<Experience<S, A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.experiences.into_iter()
    }
}

impl<'a, S, A> IntoIterator for &'a Trajectory<S, A> {
    type Item = &'a Experience<S, A>;
    type IntoIter = std::slice::Iter<'a, Experience<S, A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.experiences.iter()
    }
}

/// Play `policy` from `initial` for at most `max_steps` steps.
///
/// Stops early once the policy has no action to offer.
pub fn rollout<E, P>(
    env: &mut E,
    policy: &P,
    initial: E::State,
    max_steps: usize,
    rng: &mut dyn RngCore,
) -> Result<Trajectory<E::State, E::Action>>
where
    E: Environment + ?Sized,
    P: Policy<E::State, E::Action> + ?Sized,
{
    env.reset(initial);
    let mut trajectory = Trajectory::new();

    for _ in 0..max_steps {
        let state = env.current_state().clone();
        let Some(action) = policy.choose_action(&state, rng) else {
            break;
        };
        let (next_state, reward) = env.step(&action, rng)?;
        trajectory.push(Experience {
            state,
            action,
            reward,
            next_state,
        });
    }

    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::WeightedDistribution;
    use crate::environment::MdpEnvironment;
    use crate::mdp::Transition;
    use crate::policy::RandomSelectPolicy;
    use crate::table::TableDrivenMdp;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::rc::Rc;

    fn experience(reward: f64) -> Experience<u8, u8> {
        Experience {
            state: 0,
            action: 0,
            reward: Reward(reward),
            next_state: 0,
        }
    }

    #[test]
    fn test_returns() {
        let mut trajectory = Trajectory::new();
        for reward in [1.0, 0.0, 10.0] {
            trajectory.push(experience(reward));
        }
        assert_relative_eq!(trajectory.total_reward(), 11.0);

        let returns = trajectory.returns(0.5);
        assert_relative_eq!(returns[2], 10.0);
        assert_relative_eq!(returns[1], 5.0);
        assert_relative_eq!(returns[0], 3.5);
        assert_relative_eq!(trajectory.discounted_return(0.5), 3.5);
    }

    #[test]
    fn test_rollout_stops_at_terminal() {
        let mut mdp = TableDrivenMdp::default();
        for state in 0u8..3 {
            mdp.insert(
                state,
                "forward",
                WeightedDistribution::certain(Transition::new(state + 1, -1.0)),
            );
        }
        let mdp = Rc::new(mdp);
        let policy = RandomSelectPolicy::for_mdp(&*mdp);
        let mut env = MdpEnvironment::new(Rc::clone(&mdp), 0);
        let mut rng = StdRng::seed_from_u64(3);

        let trajectory = rollout(&mut env, &policy, 0, 100, &mut rng).unwrap();
        assert_eq!(trajectory.len(), 3);
        assert_relative_eq!(trajectory.total_reward(), -3.0);
        assert_eq!(trajectory.experiences()[2].next_state, 3);

        let capped = rollout(&mut env, &policy, 0, 2, &mut rng).unwrap();
        assert_eq!(capped.len(), 2);
    }
}
