//! Empirical privacy loss of a learned mechanism.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use super::categories::CategoryTable;
use super::{privacy_scale, reshape_logits};
use crate::error::Result;

/// What the evaluator measures for one set of logits.
#[derive(Clone, Debug, PartialEq)]
pub struct DpMetrics {
    /// Row-wise log-softmax of the logits.
    pub log_probs: DMatrix<f64>,
    /// Log-probability of reporting each position's true category.
    pub log_p_correct: DVector<f64>,
    /// Largest excess of an adjacent log-probability gap over the target
    /// epsilon; 0 when every pair is within budget.
    pub epsilon_total: f64,
    /// Larger of the worst add and worst remove hockey-stick divergences.
    pub delta_total: f64,
}

/// Computes [`DpMetrics`] for flat learned logits.
///
/// # Examples
///
/// ```
/// use rrtune::mechanism::{CategoryTable, DpEvaluator};
///
/// let table = CategoryTable::default_seats();
/// let evaluator = DpEvaluator::new(table.into());
///
/// let logits = vec![0.0; 79 * 6];
/// let metrics = evaluator.evaluate(&logits, 1.0).unwrap();
/// assert_eq!(metrics.epsilon_total, 0.0);
/// assert_eq!(metrics.delta_total, 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct DpEvaluator {
    table: Arc<CategoryTable>,
}

impl DpEvaluator {
    #[must_use]
    pub fn new(table: Arc<CategoryTable>) -> Self {
        Self { table }
    }

    /// The category table the logits are laid out against.
    #[must_use]
    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Evaluates flat row-major `logits` against `epsilon_target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) if
    /// `logits.len() != (n_seats + 1) * n_cats`.
    pub fn evaluate(&self, logits: &[f64], epsilon_target: f64) -> Result<DpMetrics> {
        let logits = reshape_logits(logits, self.table.n_rows(), self.table.n_cats())?;
        Ok(self.evaluate_matrix(&logits, epsilon_target))
    }

    /// As [`evaluate`](Self::evaluate) for an already shaped logit matrix.
    #[must_use]
    pub fn evaluate_matrix(&self, logits: &DMatrix<f64>, epsilon_target: f64) -> DpMetrics {
        let log_probs = super::log_softmax(logits);
        let probs = log_probs.map(f64::exp);

        let log_p_correct = DVector::from_iterator(
            log_probs.nrows(),
            self.table
                .categories()
                .iter()
                .enumerate()
                .map(|(i, &c)| log_probs[(i, c)]),
        );

        let mut epsilon_total: f64 = 0.0;
        let mut delta_add: f64 = 0.0;
        let mut delta_remove: f64 = 0.0;
        let scale = privacy_scale(epsilon_target);

        for i in 0..log_probs.nrows().saturating_sub(1) {
            let mut add = 0.0;
            let mut remove = 0.0;
            for c in 0..log_probs.ncols() {
                let gap = (log_probs[(i, c)] - log_probs[(i + 1, c)]).abs();
                epsilon_total = epsilon_total.max((gap - epsilon_target).max(0.0));

                let (a, b) = (probs[(i, c)], probs[(i + 1, c)]);
                add += (a - scale * b).max(0.0);
                remove += (b - scale * a).max(0.0);
            }
            delta_add = delta_add.max(add);
            delta_remove = delta_remove.max(remove);
        }

        DpMetrics {
            log_probs,
            log_p_correct,
            epsilon_total,
            delta_total: delta_add.max(delta_remove),
        }
    }
}
