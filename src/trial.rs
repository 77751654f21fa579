//! Trial implementation for tracking sampled parameters and trial state.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::distribution::FloatDistribution;
use crate::error::{Error, Result};
use crate::parameter::FloatParam;
use crate::sampler::Sampler;
use crate::sampler::random::RandomSampler;
use crate::types::{Direction, TrialState};

/// A user attribute value attached to a trial.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// A floating-point attribute.
    Float(f64),
    /// An integer attribute.
    Int(i64),
    /// A string attribute.
    String(String),
    /// A boolean attribute.
    Bool(bool),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// A finished trial with its parameters and objective values.
///
/// Failed trials are recorded too (with empty `values`) so that persisted
/// studies show every attempt; samplers only learn from
/// [`Complete`](TrialState::Complete) trials.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletedTrial {
    /// The unique identifier for this trial.
    pub id: u64,
    /// The sampled parameter values, keyed by parameter name.
    pub params: BTreeMap<String, f64>,
    /// The parameter distributions used, keyed by parameter name.
    pub distributions: BTreeMap<String, FloatDistribution>,
    /// The objective values (one per objective, empty if the trial failed).
    pub values: Vec<f64>,
    /// The state of the trial.
    pub state: TrialState,
    /// User-defined attributes stored during the trial.
    #[cfg_attr(feature = "serde", serde(default))]
    pub user_attrs: BTreeMap<String, AttrValue>,
}

impl CompletedTrial {
    /// Returns the value sampled for `name`, if the trial used it.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Gets a user attribute by key.
    #[must_use]
    pub fn user_attr(&self, key: &str) -> Option<&AttrValue> {
        self.user_attrs.get(key)
    }

    /// Returns `true` if the trial completed successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == TrialState::Complete
    }
}

/// A trial represents a single evaluation of the objective function.
///
/// Each trial has a unique ID and stores the sampled parameters along with
/// their distributions. The trial progresses through states: Running -> Complete/Failed.
///
/// Trials created by a [`Study`](crate::Study) receive the study's sampler,
/// its directions, and shared access to the trial history so that
/// suggestions can be informed by earlier results.
#[derive(Clone)]
pub struct Trial {
    /// Unique identifier for this trial.
    id: u64,
    /// Current state of the trial.
    state: TrialState,
    /// Sampled parameter values, keyed by parameter name.
    params: BTreeMap<String, f64>,
    /// Parameter distributions, keyed by parameter name.
    distributions: BTreeMap<String, FloatDistribution>,
    user_attrs: BTreeMap<String, AttrValue>,
    /// The sampler to use for generating parameter values.
    sampler: Option<Arc<dyn Sampler>>,
    /// Access to the history of finished trials (shared with the study).
    history: Option<Arc<RwLock<Vec<CompletedTrial>>>>,
    directions: Vec<Direction>,
}

impl core::fmt::Debug for Trial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trial")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("params", &self.params)
            .field("distributions", &self.distributions)
            .field("user_attrs", &self.user_attrs)
            .field("has_sampler", &self.sampler.is_some())
            .field("has_history", &self.history.is_some())
            .finish_non_exhaustive()
    }
}

impl Trial {
    /// Creates a standalone trial with the given ID.
    ///
    /// The trial starts in the `Running` state and falls back to uniform
    /// random sampling because it has no sampler attached.
    ///
    /// # Examples
    ///
    /// ```
    /// use rrtune::Trial;
    ///
    /// let trial = Trial::new(0);
    /// assert_eq!(trial.id(), 0);
    /// ```
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: TrialState::Running,
            params: BTreeMap::new(),
            distributions: BTreeMap::new(),
            user_attrs: BTreeMap::new(),
            sampler: None,
            history: None,
            directions: Vec::new(),
        }
    }

    /// Creates a new trial wired to a sampler and the study history.
    pub(crate) fn with_sampler(
        id: u64,
        sampler: Arc<dyn Sampler>,
        history: Arc<RwLock<Vec<CompletedTrial>>>,
        directions: Vec<Direction>,
    ) -> Self {
        Self {
            sampler: Some(sampler),
            history: Some(history),
            directions,
            ..Self::new(id)
        }
    }

    fn sample_value(&self, name: &str, distribution: &FloatDistribution) -> f64 {
        if let (Some(sampler), Some(history)) = (&self.sampler, &self.history) {
            let history_guard = history.read();
            sampler.sample(
                name,
                distribution,
                self.id,
                &history_guard,
                &self.directions,
            )
        } else {
            RandomSampler::new().sample(name, distribution, self.id, &[], &[])
        }
    }

    /// Returns the unique ID of this trial.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current state of this trial.
    #[must_use]
    pub fn state(&self) -> TrialState {
        self.state
    }

    /// Returns the sampled parameters.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, f64> {
        &self.params
    }

    /// Returns the parameter distributions.
    #[must_use]
    pub fn distributions(&self) -> &BTreeMap<String, FloatDistribution> {
        &self.distributions
    }

    /// Returns all user attributes.
    #[must_use]
    pub fn user_attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.user_attrs
    }

    /// Stores a user attribute on the trial; it is persisted with the
    /// trial record.
    pub fn set_user_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.user_attrs.insert(key.into(), value.into());
    }

    pub(crate) fn set_complete(&mut self) {
        self.state = TrialState::Complete;
    }

    pub(crate) fn set_failed(&mut self) {
        self.state = TrialState::Failed;
    }

    /// Freezes the trial into a history record.
    pub(crate) fn into_record(self, values: Vec<f64>) -> CompletedTrial {
        CompletedTrial {
            id: self.id,
            params: self.params,
            distributions: self.distributions,
            values,
            state: self.state,
            user_attrs: self.user_attrs,
        }
    }

    /// Suggests a float in `[low, high]` under the given name.
    ///
    /// Shorthand for `FloatParam::new(name, low, high).suggest(trial)`.
    ///
    /// # Errors
    ///
    /// See [`suggest_param`](Self::suggest_param).
    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        self.suggest_param(&FloatParam::new(name, low, high))
    }

    /// Suggests a parameter value using a [`FloatParam`] definition.
    ///
    /// Suggesting the same name twice with an identical distribution
    /// returns the cached value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parameter fails validation
    /// - The name was previously suggested with a different distribution
    pub fn suggest_param(&mut self, param: &FloatParam) -> Result<f64> {
        param.validate()?;

        let name = param.name();
        let distribution = param.distribution();

        if let Some(existing) = self.distributions.get(name) {
            if *existing == distribution {
                if let Some(&value) = self.params.get(name) {
                    return Ok(value);
                }
            }
            return Err(Error::ParameterConflict {
                name: name.to_owned(),
                reason: "parameter was previously sampled with a different distribution"
                    .to_owned(),
            });
        }

        let value = self.sample_value(name, &distribution);

        self.distributions.insert(name.to_owned(), distribution);
        self.params.insert(name.to_owned(), value);

        Ok(value)
    }
}
