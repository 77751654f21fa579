//! The randomized response mechanism: category tables, penalties, the DP
//! evaluator, and a reference trainer.
//!
//! A mechanism is a logit matrix with one row per ordinal position (seat 0
//! is the reject sentinel) and one column per category. Row `i` softmaxes
//! to the distribution of the reported category given true position `i`.

mod categories;
mod evaluate;
mod penalty;
mod privacy;
mod trainer;

pub use categories::{CategoryTable, DEFAULT_EDGES, DEFAULT_N_CATS, DEFAULT_N_SEATS};
pub use evaluate::{DpEvaluator, DpMetrics};
pub use penalty::{
    ApproxDpPenalty, CompositePenalty, DistancePenalty, L2Penalty, Penalty, PenaltyComposer,
    PenaltyFactory, PenaltyWeights, PureDpPenalty, StandardPenalties,
};
pub use privacy::{DpMode, PrivacyTarget};
pub use trainer::{SgdTrainer, Trainer};

use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Reshapes flat logits row-major into a `rows × cols` matrix.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if `flat.len() != rows * cols`.
pub fn reshape_logits(flat: &[f64], rows: usize, cols: usize) -> Result<DMatrix<f64>> {
    if flat.len() != rows * cols {
        return Err(Error::ShapeMismatch {
            rows,
            cols,
            got: flat.len(),
        });
    }
    Ok(DMatrix::from_row_slice(rows, cols, flat))
}

/// Flattens a logit matrix row-major; inverse of [`reshape_logits`].
#[must_use]
pub fn flatten_logits(logits: &DMatrix<f64>) -> Vec<f64> {
    logits.transpose().as_slice().to_vec()
}

/// Row-wise log-softmax, max-shifted.
#[must_use]
pub fn log_softmax(logits: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = logits.clone();
    for mut row in out.row_iter_mut() {
        let max = row.max();
        let log_sum = row.iter().map(|&q| (q - max).exp()).sum::<f64>().ln() + max;
        row.add_scalar_mut(-log_sum);
    }
    out
}

/// Row-wise softmax.
#[must_use]
pub fn softmax(logits: &DMatrix<f64>) -> DMatrix<f64> {
    log_softmax(logits).map(f64::exp)
}

/// `e^eps`, saturated so that `scale * 0.0` stays finite.
pub(crate) fn privacy_scale(epsilon: f64) -> f64 {
    epsilon.exp().min(f64::MAX)
}
