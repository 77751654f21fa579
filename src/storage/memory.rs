//! In-memory trial storage.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::Storage;
use crate::trial::CompletedTrial;

/// In-memory trial storage (the default).
///
/// This is a thin wrapper around `Arc<RwLock<Vec<CompletedTrial>>>`.
pub struct MemoryStorage {
    trials: Arc<RwLock<Vec<CompletedTrial>>>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_trials(Vec::new())
    }

    /// Creates an in-memory store pre-populated with `trials`.
    ///
    /// The ID counter continues after the largest stored ID.
    #[must_use]
    pub fn with_trials(trials: Vec<CompletedTrial>) -> Self {
        let next_id = trials.iter().map(|t| t.id).max().map_or(0, |id| id + 1);
        Self {
            trials: Arc::new(RwLock::new(trials)),
            next_id: AtomicU64::new(next_id),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn push(&self, trial: CompletedTrial) -> crate::Result<()> {
        self.trials.write().push(trial);
        Ok(())
    }

    fn trials_arc(&self) -> &Arc<RwLock<Vec<CompletedTrial>>> {
        &self.trials
    }

    fn next_trial_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}
