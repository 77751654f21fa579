//! Builder for configuring a [`Study`](super::Study).

use std::sync::Arc;

use crate::sampler::Sampler;
use crate::sampler::random::RandomSampler;
use crate::storage::{MemoryStorage, Storage};
use crate::types::Direction;

use super::Study;

/// A builder for constructing [`Study`] instances with a fluent API.
///
/// Created via [`Study::builder()`].
///
/// # Defaults
///
/// - Study name: `"default"`
/// - Directions: a single [`Minimize`](Direction::Minimize)
/// - Sampler: [`RandomSampler`]
/// - Storage: [`MemoryStorage`]
///
/// # Examples
///
/// ```
/// use rrtune::sampler::MotpeSampler;
/// use rrtune::{Direction, Study};
///
/// let study = Study::builder()
///     .study_name("weights")
///     .directions(vec![Direction::Minimize; 4])
///     .sampler(MotpeSampler::with_seed(123))
///     .build()
///     .unwrap();
///
/// assert_eq!(study.n_objectives(), 4);
/// ```
pub struct StudyBuilder {
    study_name: String,
    directions: Vec<Direction>,
    sampler: Option<Box<dyn Sampler>>,
    storage: Option<Box<dyn Storage>>,
}

impl StudyBuilder {
    pub(super) fn new() -> Self {
        Self {
            study_name: "default".to_owned(),
            directions: vec![Direction::Minimize],
            sampler: None,
            storage: None,
        }
    }

    /// Set the study name used in log events.
    #[must_use]
    pub fn study_name(mut self, name: impl Into<String>) -> Self {
        self.study_name = name.into();
        self
    }

    /// Set one direction per objective.
    #[must_use]
    pub fn directions(mut self, directions: Vec<Direction>) -> Self {
        self.directions = directions;
        self
    }

    /// Set the sampler used for parameter suggestions.
    #[must_use]
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Set a custom storage backend.
    #[must_use]
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Set a storage backend chosen at runtime.
    #[must_use]
    pub fn boxed_storage(mut self, storage: Box<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Build the [`Study`] with the configured options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`](crate::Error::Internal) if no direction
    /// was given.
    pub fn build(self) -> crate::Result<Study> {
        if self.directions.is_empty() {
            return Err(crate::Error::Internal(
                "a study needs at least one direction",
            ));
        }

        let sampler = self
            .sampler
            .unwrap_or_else(|| Box::new(RandomSampler::new()));
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));

        Ok(Study {
            study_name: self.study_name,
            directions: self.directions,
            sampler: Arc::from(sampler),
            storage: Arc::from(storage),
        })
    }
}
