//! Trial storage backends.
//!
//! The [`Storage`] trait defines how finished trials are persisted and
//! retrieved. Every [`Study`](crate::Study) owns an `Arc<dyn Storage>`.
//!
//! # Available backends
//!
//! | Backend | Description | Feature flag |
//! |---------|-------------|-------------|
//! | [`MemoryStorage`] | In-memory `Vec` behind a read-write lock (the default) | — |
//! | `SqliteStorage` | `SQLite` database keyed by study name, resumable across restarts | `sqlite` |
//!
//! Inject a backend through the builder:
//!
//! ```
//! use rrtune::Study;
//! use rrtune::storage::MemoryStorage;
//!
//! let study = Study::builder().storage(MemoryStorage::new()).build().unwrap();
//! assert_eq!(study.n_trials(), 0);
//! ```

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::sync::Arc;

pub use memory::MemoryStorage;
use parking_lot::RwLock;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

use crate::trial::CompletedTrial;

/// Trait for storing and retrieving finished trials.
///
/// Implementations must be `Send + Sync` because the study shares the
/// backend with every trial's sampler bridge.
pub trait Storage: Send + Sync {
    /// Append a finished trial to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a persistent backend cannot write the trial.
    /// The in-memory buffer is left unchanged in that case.
    fn push(&self, trial: CompletedTrial) -> crate::Result<()>;

    /// Return the in-memory trial buffer.
    ///
    /// Callers may acquire a read lock for allocation-free access.
    fn trials_arc(&self) -> &Arc<RwLock<Vec<CompletedTrial>>>;

    /// Atomically return the next unique trial ID.
    fn next_trial_id(&self) -> u64;
}
