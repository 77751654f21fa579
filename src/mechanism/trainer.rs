//! Gradient-based learning of mechanism logits under a penalty.

use std::sync::Arc;

use nalgebra::DMatrix;

use super::categories::CategoryTable;
use super::penalty::Penalty;
use super::{flatten_logits, log_softmax};
use crate::error::{Error, Result};

/// Learns flat row-major logits for one penalty.
///
/// The penalty is passed per call; a trainer holds no penalty state between
/// runs.
pub trait Trainer {
    /// Runs `n_iters` optimization steps from a `seed`-determined start and
    /// returns the learned logits, `(n_seats + 1) * n_cats` values.
    ///
    /// # Errors
    ///
    /// Implementations return an error when training cannot produce usable
    /// logits.
    fn train(
        &mut self,
        penalty: &dyn Penalty,
        n_iters: usize,
        seed: u64,
        silent: bool,
    ) -> Result<Vec<f64>>;
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;
const INIT_SCALE: f64 = 0.01;

/// Adam on `−mean_i log p(true category of i) + penalty`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use rrtune::mechanism::{CategoryTable, L2Penalty, SgdTrainer, Trainer};
///
/// let table = Arc::new(CategoryTable::new(4, 2, &[1, 4]).unwrap());
/// let mut trainer = SgdTrainer::new(Arc::clone(&table), 0.05);
/// let logits = trainer.train(&L2Penalty, 200, 0, true).unwrap();
/// assert_eq!(logits.len(), 5 * 2);
/// ```
#[derive(Clone, Debug)]
pub struct SgdTrainer {
    table: Arc<CategoryTable>,
    learning_rate: f64,
}

impl SgdTrainer {
    #[must_use]
    pub fn new(table: Arc<CategoryTable>, learning_rate: f64) -> Self {
        Self {
            table,
            learning_rate,
        }
    }

    /// Data term and its gradient.
    fn likelihood(&self, logits: &DMatrix<f64>) -> (f64, DMatrix<f64>) {
        let log_probs = log_softmax(logits);
        #[allow(clippy::cast_precision_loss)]
        let n = logits.nrows() as f64;

        let mut loss = 0.0;
        let mut grad = log_probs.map(f64::exp);
        for (i, &c) in self.table.categories().iter().enumerate() {
            loss -= log_probs[(i, c)];
            grad[(i, c)] -= 1.0;
        }
        (loss / n, grad / n)
    }

    fn loss(&self, logits: &DMatrix<f64>, penalty: &dyn Penalty) -> f64 {
        self.likelihood(logits).0 + penalty.value(logits)
    }
}

impl Trainer for SgdTrainer {
    fn train(
        &mut self,
        penalty: &dyn Penalty,
        n_iters: usize,
        seed: u64,
        silent: bool,
    ) -> Result<Vec<f64>> {
        let (rows, cols) = (self.table.n_rows(), self.table.n_cats());
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut logits = DMatrix::from_fn(rows, cols, |_, _| {
            crate::rng_util::f64_range(&mut rng, -INIT_SCALE, INIT_SCALE)
        });

        let mut m = DMatrix::<f64>::zeros(rows, cols);
        let mut v = DMatrix::<f64>::zeros(rows, cols);
        let report_every = (n_iters / 10).max(1);

        for step in 1..=n_iters {
            let (_, mut grad) = self.likelihood(&logits);
            grad += penalty.gradient(&logits);

            m = m * BETA1 + &grad * (1.0 - BETA1);
            v = v * BETA2 + grad.map(|g| g * g) * (1.0 - BETA2);

            let t = i32::try_from(step).unwrap_or(i32::MAX);
            let m_correction = 1.0 - BETA1.powi(t);
            let v_correction = 1.0 - BETA2.powi(t);
            let lr = self.learning_rate;
            logits.zip_zip_apply(&m, &v, |q, mi, vi| {
                *q -= lr * (mi / m_correction) / ((vi / v_correction).sqrt() + ADAM_EPS);
            });

            if step % report_every == 0 || step == n_iters {
                let loss = self.loss(&logits, penalty);
                if !loss.is_finite() {
                    return Err(Error::Training(format!(
                        "loss became {loss} at iteration {step}"
                    )));
                }
                if !silent {
                    trace_debug!(step, loss, "training progress");
                }
            }
        }

        Ok(flatten_logits(&logits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::{DpEvaluator, L2Penalty, PureDpPenalty};

    struct Exploding;

    struct Unpenalized;

    impl Penalty for Unpenalized {
        fn value(&self, _logits: &DMatrix<f64>) -> f64 {
            0.0
        }

        fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
            DMatrix::zeros(logits.nrows(), logits.ncols())
        }
    }

    impl Penalty for Exploding {
        fn value(&self, _logits: &DMatrix<f64>) -> f64 {
            f64::NAN
        }

        fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
            DMatrix::zeros(logits.nrows(), logits.ncols())
        }
    }

    fn table() -> Arc<CategoryTable> {
        Arc::new(CategoryTable::new(9, 3, &[2, 5, 9]).unwrap())
    }

    #[test]
    fn test_same_seed_same_logits() {
        let mut a = SgdTrainer::new(table(), 0.05);
        let mut b = SgdTrainer::new(table(), 0.05);
        let la = a.train(&L2Penalty, 50, 9, true).unwrap();
        let lb = b.train(&L2Penalty, 50, 9, true).unwrap();
        assert_eq!(la, lb);
    }

    #[test]
    fn test_unpenalized_training_favours_true_category() {
        let table = table();
        let mut trainer = SgdTrainer::new(Arc::clone(&table), 0.05);
        let logits = trainer.train(&Unpenalized, 300, 1, true).unwrap();
        let metrics = DpEvaluator::new(table).evaluate(&logits, 1.0).unwrap();
        assert!(metrics.log_p_correct.iter().all(|&lp| lp > (0.5_f64).ln()));
    }

    #[test]
    fn test_dp_penalty_tightens_privacy() {
        let table = table();
        let evaluator = DpEvaluator::new(Arc::clone(&table));
        let mut trainer = SgdTrainer::new(Arc::clone(&table), 0.05);

        let loose = trainer.train(&Unpenalized, 400, 2, true).unwrap();
        let tight = trainer.train(&PureDpPenalty::new(0.1), 400, 2, true).unwrap();

        let loose_eps = evaluator.evaluate(&loose, 0.1).unwrap().epsilon_total;
        let tight_eps = evaluator.evaluate(&tight, 0.1).unwrap().epsilon_total;
        assert!(tight_eps < loose_eps);
    }

    #[test]
    fn test_non_finite_loss_is_an_error() {
        let mut trainer = SgdTrainer::new(table(), 0.05);
        let err = trainer.train(&Exploding, 20, 0, true).unwrap_err();
        assert!(matches!(err, Error::Training(_)));
    }
}
