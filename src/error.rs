//! Error type shared by the search engine and the mechanism tuner.

/// Errors returned by `rrtune` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// Returned when step size is not positive.
    #[error("invalid step: step must be positive")]
    InvalidStep,

    /// Returned when a parameter is suggested with a different configuration.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// Returned when requesting results but no trials have completed.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// Returned when bandwidth is not positive.
    #[error("invalid bandwidth: {0} must be positive")]
    InvalidBandwidth(f64),

    /// Returned when KDE is created with empty samples.
    #[error("KDE requires at least one sample")]
    EmptySamples,

    /// Returned when the objective returns the wrong number of values.
    #[error("objective dimension mismatch: expected {expected} values, got {got}")]
    ObjectiveDimensionMismatch {
        /// The expected number of objective values.
        expected: usize,
        /// The actual number of objective values returned.
        got: usize,
    },

    /// Returned when the privacy target is outside `epsilon > 0`, `0 <= delta <= 1`.
    #[error("invalid privacy params: eps={epsilon}, delta={delta}")]
    InvalidPrivacyParams {
        /// The requested epsilon.
        epsilon: f64,
        /// The requested delta.
        delta: f64,
    },

    /// Returned when the category boundaries cannot describe a category table.
    #[error("invalid category edges: {0}")]
    InvalidCategoryEdges(String),

    /// Returned when a flat logit buffer does not match `(n_seats + 1) * n_cats`.
    #[error("logit shape mismatch: expected {rows}x{cols} values, got {got}")]
    ShapeMismatch {
        /// Expected number of rows (seats including the reject sentinel).
        rows: usize,
        /// Expected number of columns (categories).
        cols: usize,
        /// Length of the buffer actually supplied.
        got: usize,
    },

    /// Returned when mechanism training diverges.
    #[error("training failed: {0}")]
    Training(String),

    /// Returned when an existing study was created with other directions.
    #[error("study '{study_name}' exists with {stored} directions, requested {requested}")]
    StudyDirectionMismatch {
        /// Name of the stored study.
        study_name: String,
        /// Directions recorded in storage.
        stored: String,
        /// Directions requested by the caller.
        requested: String,
    },

    /// Returned when a study already exists and resuming was not requested.
    #[error("study '{0}' already exists")]
    StudyAlreadyExists(String),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when a storage operation fails.
    #[cfg(feature = "sqlite")]
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = core::result::Result<T, Error>;
