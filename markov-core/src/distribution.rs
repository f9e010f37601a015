//! Discrete probability distributions over events
//!
//! [`WeightedDistribution`] is the workhorse: transition tables store one per
//! (state, action) pair. [`UniformDistribution`] backs stochastic policies and
//! [`EmpiricalDistribution`] estimates frequencies from observed samples.

use std::hash::Hash;

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::error::{MarkovError, Result};

/// Tolerance used when checking that weights sum to one
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Common operations over a finite distribution of events
pub trait EventDistribution<T> {
    /// Weighted sum of `transform` over every event
    fn expectation<F>(&self, transform: F) -> f64
    where
        F: Fn(&T) -> f64;

    /// Draw one event using the supplied random source
    fn sample(&self, rng: &mut dyn RngCore) -> Result<&T>;

    /// Probability of the first event satisfying `predicate`, or zero
    fn probability<P>(&self, predicate: P) -> f64
    where
        P: Fn(&T) -> bool;

    /// First event satisfying `predicate`
    fn first_matching<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool;
}

/// Running totals of `weights` in order
fn running_totals(weights: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .scan(0.0, |total, weight| {
            *total += weight;
            Some(*total)
        })
        .collect()
}

/// Immutable distribution over an ordered list of weighted events.
///
/// Declaration order is fixed at construction; it drives both sampling and
/// iteration. The only mutation allowed is editing events in place through
/// [`WeightedDistribution::for_each_event_mut`], which leaves weights alone.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDistribution<T> {
    events: Vec<T>,
    weights: Vec<f64>,
    prefix_sums: Vec<f64>,
}

impl<T> WeightedDistribution<T> {
    /// Build a distribution from `(event, weight)` pairs.
    ///
    /// Fails with [`MarkovError::InvalidDistribution`] when the list is empty,
    /// a weight is negative or not finite, or the weights do not sum to one
    /// within [`DEFAULT_TOLERANCE`]. Weights are never renormalized.
    pub fn new(weighted_events: Vec<(T, f64)>) -> Result<Self> {
        if weighted_events.is_empty() {
            return Err(MarkovError::InvalidDistribution(
                "a distribution needs at least one event".to_string(),
            ));
        }

        let (events, weights): (Vec<T>, Vec<f64>) = weighted_events.into_iter().unzip();
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(MarkovError::InvalidDistribution(format!(
                "weight {bad} is not a finite non-negative number"
            )));
        }

        let prefix_sums = running_totals(&weights);
        let total = prefix_sums.last().copied().unwrap_or_default();
        if (total - 1.0).abs() > DEFAULT_TOLERANCE {
            return Err(MarkovError::InvalidDistribution(format!(
                "weights sum to {total}, expected 1"
            )));
        }

        Ok(Self {
            events,
            weights,
            prefix_sums,
        })
    }

    /// Distribution putting all mass on a single event
    #[must_use]
    pub fn certain(event: T) -> Self {
        Self {
            events: vec![event],
            weights: vec![1.0],
            prefix_sums: vec![1.0],
        }
    }

    /// Inverse-CDF lookup: the first event whose cumulative weight reaches `r`.
    ///
    /// Zero-weight events are never returned. A value no bucket covers yields
    /// [`MarkovError::SamplingFailure`] carrying `r` and the prefix sums.
    pub fn invert(&self, r: f64) -> Result<&T> {
        self.prefix_sums
            .iter()
            .zip(&self.weights)
            .position(|(total, weight)| *total >= r && *weight > 0.0)
            .map(|index| &self.events[index])
            .ok_or_else(|| MarkovError::SamplingFailure {
                random_value: r,
                prefix_sums: self.prefix_sums.clone(),
            })
    }

    /// Iterate `(event, weight)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.events.iter().zip(self.weights.iter().copied())
    }

    /// Events in declaration order
    #[must_use]
    pub fn events(&self) -> &[T] {
        &self.events
    }

    /// Cumulative weights in declaration order
    #[must_use]
    pub fn prefix_sums(&self) -> &[f64] {
        &self.prefix_sums
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false: construction rejects empty lists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Edit every event in place. Weights and order are untouched.
    pub fn for_each_event_mut<F>(&mut self, mut edit: F)
    where
        F: FnMut(&mut T),
    {
        for event in &mut self.events {
            edit(event);
        }
    }
}

impl<T> EventDistribution<T> for WeightedDistribution<T> {
    fn expectation<F>(&self, transform: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.iter().map(|(event, weight)| weight * transform(event)).sum()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<&T> {
        let r: f64 = rng.gen_range(0.0..=1.0);
        self.invert(r)
    }

    fn probability<P>(&self, predicate: P) -> f64
    where
        P: Fn(&T) -> bool,
    {
        self.iter()
            .find(|(event, _)| predicate(event))
            .map_or(0.0, |(_, weight)| weight)
    }

    fn first_matching<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.events.iter().find(|event| predicate(event))
    }
}

impl<'a, T> IntoIterator for &'a WeightedDistribution<T> {
    type Item = (&'a T, f64);
    type IntoIter = std::iter::Zip<
        std::slice::Iter<'a, T>,
        std::iter::Copied<std::slice::Iter<'a, f64>>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter().zip(self.weights.iter().copied())
    }
}

/// Bin of equally likely events. Duplicates weigh proportionally.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDistribution<T> {
    events: Vec<T>,
}

impl<T> UniformDistribution<T> {
    /// Build a bin from a non-empty list of events
    pub fn new(events: Vec<T>) -> Result<Self> {
        if events.is_empty() {
            return Err(MarkovError::InvalidDistribution(
                "a uniform distribution needs at least one event".to_string(),
            ));
        }
        Ok(Self { events })
    }

    /// Events in insertion order
    #[must_use]
    pub fn events(&self) -> &[T] {
        &self.events
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false: construction rejects empty lists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[allow(clippy::cast_precision_loss)]
    fn weight(&self) -> f64 {
        1.0 / self.events.len() as f64
    }
}

impl<T> EventDistribution<T> for UniformDistribution<T> {
    fn expectation<F>(&self, transform: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.events.iter().map(transform).sum::<f64>() * self.weight()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<&T> {
        self.events.choose(rng).ok_or_else(|| {
            MarkovError::InvalidDistribution("cannot sample an empty bin".to_string())
        })
    }

    /// Mass of every matching event, so duplicated entries add up
    #[allow(clippy::cast_precision_loss)]
    fn probability<P>(&self, predicate: P) -> f64
    where
        P: Fn(&T) -> bool,
    {
        self.events.iter().filter(|event| predicate(event)).count() as f64 * self.weight()
    }

    fn first_matching<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.events.iter().find(|event| predicate(event))
    }
}

/// Frequency estimate built from observed events
#[derive(Debug, Clone)]
pub struct EmpiricalDistribution<T>
where
    T: Eq + Hash,
{
    counts: IndexMap<T, u64>,
    total: u64,
}

impl<T> Default for EmpiricalDistribution<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
            total: 0,
        }
    }
}

impl<T> EmpiricalDistribution<T>
where
    T: Eq + Hash,
{
    /// Create an estimator with no observations
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` observations of `event`
    pub fn observe(&mut self, event: T, count: u64) {
        *self.counts.entry(event).or_insert(0) += count;
        self.total += count;
    }

    /// Observations recorded for `event`
    #[must_use]
    pub fn count(&self, event: &T) -> u64 {
        self.counts.get(event).copied().unwrap_or(0)
    }

    /// Total observations
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Observed frequency of `event`, zero before any observation
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frequency(&self, event: &T) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(event) as f64 / self.total as f64
        }
    }

    /// Freeze the current frequencies into a [`WeightedDistribution`]
    pub fn to_weighted(&self) -> Result<WeightedDistribution<T>>
    where
        T: Clone,
    {
        WeightedDistribution::new(
            self.counts
                .keys()
                .map(|event| (event.clone(), self.frequency(event)))
                .collect(),
        )
    }
}

impl<T> EventDistribution<T> for EmpiricalDistribution<T>
where
    T: Eq + Hash,
{
    fn expectation<F>(&self, transform: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.counts
            .keys()
            .map(|event| self.frequency(event) * transform(event))
            .sum()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<&T> {
        if self.total == 0 {
            return Err(MarkovError::InvalidDistribution(
                "cannot sample before any observation".to_string(),
            ));
        }
        let mut draw = rng.gen_range(0..self.total);
        for (event, count) in &self.counts {
            if draw < *count {
                return Ok(event);
            }
            draw -= count;
        }
        Err(MarkovError::InvalidDistribution(
            "observation counts are inconsistent with their total".to_string(),
        ))
    }

    fn probability<P>(&self, predicate: P) -> f64
    where
        P: Fn(&T) -> bool,
    {
        self.counts
            .keys()
            .find(|event| predicate(event))
            .map_or(0.0, |event| self.frequency(event))
    }

    fn first_matching<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.counts.keys().find(|event| predicate(event))
    }
}
