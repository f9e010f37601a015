//! Learning-rate schedules keyed by (state, action)

use std::hash::Hash;

use indexmap::IndexMap;
use markov_core::{MarkovError, Result, StepSizeConfig};

/// Step size to use for the next update of a (state, action) pair
pub trait StepFunction<S, A> {
    /// Step size for this update. Stateful schedules count the call as a visit.
    fn step_size(&mut self, state: &S, action: &A) -> f64;
}

/// The same step size everywhere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantStep {
    step_size: f64,
}

impl ConstantStep {
    /// Create a constant schedule; the step size must lie in (0, 1]
    pub fn new(step_size: f64) -> Result<Self> {
        StepSizeConfig::Constant { step_size }.validate()?;
        Ok(Self { step_size })
    }
}

impl<S, A> StepFunction<S, A> for ConstantStep {
    fn step_size(&mut self, _state: &S, _action: &A) -> f64 {
        self.step_size
    }
}

/// `max(1 / (1 + visits), minimum)`, counting visits per pair
#[derive(Debug, Clone)]
pub struct DecayingStep<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    minimum: f64,
    visits: IndexMap<S, IndexMap<A, u64>>,
}

impl<S, A> DecayingStep<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    /// Create a decaying schedule with the given floor in [0, 1]
    pub fn new(minimum: f64) -> Result<Self> {
        StepSizeConfig::Decaying { minimum }.validate()?;
        Ok(Self {
            minimum,
            visits: IndexMap::new(),
        })
    }

    /// Times `step_size` has been asked for this pair
    #[must_use]
    pub fn visits(&self, state: &S, action: &A) -> u64 {
        self.visits
            .get(state)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(0)
    }
}

impl<S, A> StepFunction<S, A> for DecayingStep<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    #[allow(clippy::cast_precision_loss)]
    fn step_size(&mut self, state: &S, action: &A) -> f64 {
        let count = self
            .visits
            .entry(state.clone())
            .or_default()
            .entry(action.clone())
            .or_insert(0);
        *count += 1;
        (1.0 / (1.0 + *count as f64)).max(self.minimum)
    }
}

/// A schedule chosen at runtime from a [`StepSizeConfig`]
#[derive(Debug, Clone)]
pub enum StepSize<S, A>
where
    S: Eq + Hash,
    A: Eq + Hash,
{
    /// Constant schedule
    Constant(ConstantStep),
    /// Visit-count decaying schedule
    Decaying(DecayingStep<S, A>),
}

impl<S, A> StepSize<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    /// Build the configured schedule
    pub fn from_config(config: &StepSizeConfig) -> Result<Self> {
        match *config {
            StepSizeConfig::Constant { step_size } => {
                Ok(Self::Constant(ConstantStep::new(step_size)?))
            }
            StepSizeConfig::Decaying { minimum } => {
                Ok(Self::Decaying(DecayingStep::new(minimum)?))
            }
        }
    }
}

impl<S, A> TryFrom<StepSizeConfig> for StepSize<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    type Error = MarkovError;

    fn try_from(config: StepSizeConfig) -> Result<Self> {
        Self::from_config(&config)
    }
}

impl<S, A> StepFunction<S, A> for StepSize<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    fn step_size(&mut self, state: &S, action: &A) -> f64 {
        match self {
            Self::Constant(step) => StepFunction::<S, A>::step_size(step, state, action),
            Self::Decaying(step) => step.step_size(state, action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_step() {
        let mut step = ConstantStep::new(0.25).unwrap();
        for _ in 0..3 {
            assert_relative_eq!(StepFunction::<u8, u8>::step_size(&mut step, &0, &0), 0.25);
        }
        assert!(ConstantStep::new(0.0).is_err());
        assert!(ConstantStep::new(1.5).is_err());
    }

    #[test]
    fn test_decaying_step_counts_per_pair() {
        let mut step = DecayingStep::new(0.0).unwrap();
        assert_relative_eq!(step.step_size(&"s", &"a"), 0.5);
        assert_relative_eq!(step.step_size(&"s", &"a"), 1.0 / 3.0);
        assert_relative_eq!(step.step_size(&"s", &"b"), 0.5);
        assert_eq!(step.visits(&"s", &"a"), 2);
        assert_eq!(step.visits(&"t", &"a"), 0);
    }

    #[test]
    fn test_decaying_step_floor() {
        let mut step = DecayingStep::new(0.4).unwrap();
        assert_relative_eq!(step.step_size(&0, &0), 0.5);
        assert_relative_eq!(step.step_size(&0, &0), 0.4);
        for _ in 0..100 {
            step.step_size(&0, &0);
        }
        assert_relative_eq!(step.step_size(&0, &0), 0.4);
    }

    #[test]
    fn test_from_config() {
        let mut step: StepSize<u8, u8> =
            StepSize::from_config(&StepSizeConfig::Constant { step_size: 0.1 }).unwrap();
        assert_relative_eq!(step.step_size(&1, &1), 0.1);

        let mut step: StepSize<u8, u8> =
            StepSizeConfig::Decaying { minimum: 0.2 }.try_into().unwrap();
        assert_relative_eq!(step.step_size(&1, &1), 0.5);

        let invalid = StepSizeConfig::Decaying { minimum: 2.0 };
        assert!(StepSize::<u8, u8>::from_config(&invalid).is_err());
    }
}
