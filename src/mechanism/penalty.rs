//! Differentiable penalty terms on the logit matrix and their composition.

use std::sync::Arc;

use nalgebra::DMatrix;

use super::privacy::{DpMode, PrivacyTarget};
use super::{log_softmax, privacy_scale, softmax};

/// A scalar penalty on a logit matrix together with its gradient.
pub trait Penalty: Send + Sync {
    /// Penalty value at `logits`.
    fn value(&self, logits: &DMatrix<f64>) -> f64;

    /// Gradient of [`value`](Self::value) with respect to `logits`.
    fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64>;
}

/// Backpropagates a gradient w.r.t. row probabilities through softmax.
fn softmax_backward(probs: &DMatrix<f64>, grad_probs: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = grad_probs.clone();
    for i in 0..probs.nrows() {
        let dot = probs.row(i).dot(&grad_probs.row(i));
        for c in 0..probs.ncols() {
            out[(i, c)] = probs[(i, c)] * (grad_probs[(i, c)] - dot);
        }
    }
    out
}

/// Backpropagates a gradient w.r.t. row log-probabilities through
/// log-softmax.
fn log_softmax_backward(probs: &DMatrix<f64>, grad_log_probs: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = grad_log_probs.clone();
    for i in 0..probs.nrows() {
        let total = grad_log_probs.row(i).sum();
        for c in 0..probs.ncols() {
            out[(i, c)] -= probs[(i, c)] * total;
        }
    }
    out
}

/// Sum of squared logits.
#[derive(Clone, Copy, Debug, Default)]
pub struct L2Penalty;

impl Penalty for L2Penalty {
    fn value(&self, logits: &DMatrix<f64>) -> f64 {
        logits.norm_squared()
    }

    fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
        logits * 2.0
    }
}

/// Mean over positions of the expected category distance
/// `Σ_c p_ic · D_ic`.
#[derive(Clone, Debug)]
pub struct DistancePenalty {
    distance_matrix: DMatrix<f64>,
}

impl DistancePenalty {
    /// `distance_matrix` is the per-position table from
    /// [`CategoryTable::distance_matrix`](super::CategoryTable::distance_matrix).
    #[must_use]
    pub fn new(distance_matrix: DMatrix<f64>) -> Self {
        Self { distance_matrix }
    }
}

impl Penalty for DistancePenalty {
    fn value(&self, logits: &DMatrix<f64>) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = logits.nrows() as f64;
        softmax(logits).component_mul(&self.distance_matrix).sum() / n
    }

    fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
        #[allow(clippy::cast_precision_loss)]
        let n = logits.nrows() as f64;
        let probs = softmax(logits);
        softmax_backward(&probs, &(&self.distance_matrix / n))
    }
}

/// Squared excess of adjacent log-probability gaps over `epsilon`:
/// `Σ_{i,c} relu(|lp_ic − lp_{i+1,c}| − eps)²`.
#[derive(Clone, Copy, Debug)]
pub struct PureDpPenalty {
    epsilon: f64,
}

impl PureDpPenalty {
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Penalty for PureDpPenalty {
    fn value(&self, logits: &DMatrix<f64>) -> f64 {
        let lp = log_softmax(logits);
        let mut total = 0.0;
        for i in 0..lp.nrows().saturating_sub(1) {
            for c in 0..lp.ncols() {
                let excess = ((lp[(i, c)] - lp[(i + 1, c)]).abs() - self.epsilon).max(0.0);
                total += excess * excess;
            }
        }
        total
    }

    fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
        let lp = log_softmax(logits);
        let mut grad_lp = DMatrix::zeros(lp.nrows(), lp.ncols());
        for i in 0..lp.nrows().saturating_sub(1) {
            for c in 0..lp.ncols() {
                let gap = lp[(i, c)] - lp[(i + 1, c)];
                let excess = gap.abs() - self.epsilon;
                if excess > 0.0 {
                    let g = 2.0 * excess * gap.signum();
                    grad_lp[(i, c)] += g;
                    grad_lp[(i + 1, c)] -= g;
                }
            }
        }
        log_softmax_backward(&lp.map(f64::exp), &grad_lp)
    }
}

/// Squared excess of the adjacent add/remove hockey-stick divergences over
/// `delta`.
///
/// For each adjacent pair the add divergence is
/// `Σ_c relu(p_ic − e^eps p_{i+1,c})` and the remove divergence is its
/// mirror.
#[derive(Clone, Copy, Debug)]
pub struct ApproxDpPenalty {
    epsilon: f64,
    delta: f64,
}

impl ApproxDpPenalty {
    #[must_use]
    pub fn new(epsilon: f64, delta: f64) -> Self {
        Self { epsilon, delta }
    }

    /// Returns `(add, remove)` divergences of positions `i` and `i + 1`.
    fn divergences(probs: &DMatrix<f64>, i: usize, scale: f64) -> (f64, f64) {
        let mut add = 0.0;
        let mut remove = 0.0;
        for c in 0..probs.ncols() {
            let (a, b) = (probs[(i, c)], probs[(i + 1, c)]);
            add += (a - scale * b).max(0.0);
            remove += (b - scale * a).max(0.0);
        }
        (add, remove)
    }
}

impl Penalty for ApproxDpPenalty {
    fn value(&self, logits: &DMatrix<f64>) -> f64 {
        let probs = softmax(logits);
        let scale = privacy_scale(self.epsilon);
        let mut total = 0.0;
        for i in 0..probs.nrows().saturating_sub(1) {
            let (add, remove) = Self::divergences(&probs, i, scale);
            let add = (add - self.delta).max(0.0);
            let remove = (remove - self.delta).max(0.0);
            total += add * add + remove * remove;
        }
        total
    }

    fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
        let probs = softmax(logits);
        let scale = privacy_scale(self.epsilon);
        let mut grad_p = DMatrix::zeros(probs.nrows(), probs.ncols());
        for i in 0..probs.nrows().saturating_sub(1) {
            let (add, remove) = Self::divergences(&probs, i, scale);
            let add = 2.0 * (add - self.delta).max(0.0);
            let remove = 2.0 * (remove - self.delta).max(0.0);
            for c in 0..probs.ncols() {
                let (a, b) = (probs[(i, c)], probs[(i + 1, c)]);
                if add > 0.0 && a - scale * b > 0.0 {
                    grad_p[(i, c)] += add;
                    grad_p[(i + 1, c)] -= add * scale;
                }
                if remove > 0.0 && b - scale * a > 0.0 {
                    grad_p[(i + 1, c)] += remove;
                    grad_p[(i, c)] -= remove * scale;
                }
            }
        }
        softmax_backward(&probs, &grad_p)
    }
}

/// Builds the primitive penalties.
///
/// [`StandardPenalties`] is the production implementation; the seam lets
/// callers substitute their own terms.
pub trait PenaltyFactory {
    /// The L2 regularizer.
    fn l2(&self) -> Arc<dyn Penalty>;
    /// The category-distance term over a per-position distance table.
    fn distance(&self, distance_matrix: &DMatrix<f64>) -> Arc<dyn Penalty>;
    /// The pure-DP violation term.
    fn pure_dp(&self, epsilon: f64) -> Arc<dyn Penalty>;
    /// The approximate-DP violation term.
    fn approx_dp(&self, epsilon: f64, delta: f64) -> Arc<dyn Penalty>;
}

/// The built-in penalty terms of this module.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardPenalties;

impl PenaltyFactory for StandardPenalties {
    fn l2(&self) -> Arc<dyn Penalty> {
        Arc::new(L2Penalty)
    }

    fn distance(&self, distance_matrix: &DMatrix<f64>) -> Arc<dyn Penalty> {
        Arc::new(DistancePenalty::new(distance_matrix.clone()))
    }

    fn pure_dp(&self, epsilon: f64) -> Arc<dyn Penalty> {
        Arc::new(PureDpPenalty::new(epsilon))
    }

    fn approx_dp(&self, epsilon: f64, delta: f64) -> Arc<dyn Penalty> {
        Arc::new(ApproxDpPenalty::new(epsilon, delta))
    }
}

/// Non-negative weights of the three penalty terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenaltyWeights {
    /// Weight of the DP-violation term.
    pub dp: f64,
    /// Weight of the L2 term.
    pub l2: f64,
    /// Weight of the distance term.
    pub dist: f64,
}

/// `l2·L2 + dist·Distance + dp·DP` for one set of weights.
#[derive(Clone)]
pub struct CompositePenalty {
    weights: PenaltyWeights,
    mode: DpMode,
    l2: Arc<dyn Penalty>,
    distance: Arc<dyn Penalty>,
    dp: Arc<dyn Penalty>,
}

impl core::fmt::Debug for CompositePenalty {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompositePenalty")
            .field("weights", &self.weights)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl CompositePenalty {
    /// The weights this penalty was composed with.
    #[must_use]
    pub fn weights(&self) -> PenaltyWeights {
        self.weights
    }

    /// Which DP term is included.
    #[must_use]
    pub fn mode(&self) -> DpMode {
        self.mode
    }
}

impl Penalty for CompositePenalty {
    fn value(&self, logits: &DMatrix<f64>) -> f64 {
        self.weights.l2 * self.l2.value(logits)
            + self.weights.dist * self.distance.value(logits)
            + self.weights.dp * self.dp.value(logits)
    }

    fn gradient(&self, logits: &DMatrix<f64>) -> DMatrix<f64> {
        let mut grad = self.l2.gradient(logits) * self.weights.l2;
        grad += self.distance.gradient(logits) * self.weights.dist;
        grad += self.dp.gradient(logits) * self.weights.dp;
        grad
    }
}

/// Holds the primitive penalties for one privacy target and composes them
/// with per-trial weights.
///
/// The DP form is chosen once at construction: pure when
/// `target.delta() == 0`, approximate otherwise.
///
/// # Examples
///
/// ```
/// use rrtune::mechanism::{
///     CategoryTable, DpMode, PenaltyComposer, PenaltyWeights, PrivacyTarget, StandardPenalties,
/// };
///
/// let table = CategoryTable::default_seats();
/// let target = PrivacyTarget::new(1.0, 0.0).unwrap();
/// let composer = PenaltyComposer::new(&StandardPenalties, table.distance_matrix(), target);
///
/// let penalty = composer.compose(PenaltyWeights { dp: 1.0, l2: 1e-3, dist: 1e-4 });
/// assert_eq!(penalty.mode(), DpMode::Pure);
/// ```
#[derive(Clone)]
pub struct PenaltyComposer {
    target: PrivacyTarget,
    l2: Arc<dyn Penalty>,
    distance: Arc<dyn Penalty>,
    dp: Arc<dyn Penalty>,
}

impl core::fmt::Debug for PenaltyComposer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PenaltyComposer")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl PenaltyComposer {
    /// Builds the primitive terms through `factory`.
    #[must_use]
    pub fn new(
        factory: &dyn PenaltyFactory,
        distance_matrix: &DMatrix<f64>,
        target: PrivacyTarget,
    ) -> Self {
        let dp = match target.mode() {
            DpMode::Pure => factory.pure_dp(target.epsilon()),
            DpMode::Approximate => factory.approx_dp(target.epsilon(), target.delta()),
        };
        Self {
            target,
            l2: factory.l2(),
            distance: factory.distance(distance_matrix),
            dp,
        }
    }

    /// The privacy target the DP term enforces.
    #[must_use]
    pub fn target(&self) -> PrivacyTarget {
        self.target
    }

    /// A fresh weighted sum of the three terms.
    #[must_use]
    pub fn compose(&self, weights: PenaltyWeights) -> CompositePenalty {
        CompositePenalty {
            weights,
            mode: self.target.mode(),
            l2: Arc::clone(&self.l2),
            distance: Arc::clone(&self.distance),
            dp: Arc::clone(&self.dp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::CategoryTable;

    fn random_logits(rows: usize, cols: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = fastrand::Rng::with_seed(seed);
        DMatrix::from_fn(rows, cols, |_, _| rng.f64() * 4.0 - 2.0)
    }

    fn assert_gradient_matches(penalty: &dyn Penalty, logits: &DMatrix<f64>) {
        let analytic = penalty.gradient(logits);
        let h = 1e-6;
        for i in 0..logits.nrows() {
            for c in 0..logits.ncols() {
                let mut up = logits.clone();
                up[(i, c)] += h;
                let mut down = logits.clone();
                down[(i, c)] -= h;
                let numeric = (penalty.value(&up) - penalty.value(&down)) / (2.0 * h);
                let tol = 1e-5 * (1.0 + numeric.abs());
                assert!(
                    (numeric - analytic[(i, c)]).abs() < tol,
                    "({i}, {c}): numeric {numeric} vs analytic {}",
                    analytic[(i, c)]
                );
            }
        }
    }

    fn small_table() -> CategoryTable {
        CategoryTable::new(7, 3, &[1, 4, 7]).unwrap()
    }

    #[test]
    fn test_l2_value_and_gradient() {
        let q = DMatrix::from_row_slice(1, 2, &[1.0, -2.0]);
        assert!((L2Penalty.value(&q) - 5.0).abs() < 1e-12);
        assert_gradient_matches(&L2Penalty, &random_logits(4, 3, 1));
    }

    #[test]
    fn test_distance_penalty_uniform_logits() {
        let table = small_table();
        let penalty = DistancePenalty::new(table.distance_matrix().clone());
        let q = DMatrix::zeros(table.n_rows(), table.n_cats());
        let expected = table.distance_matrix().sum() / 3.0 / 8.0;
        assert!((penalty.value(&q) - expected).abs() < 1e-12);
        assert_gradient_matches(&penalty, &random_logits(8, 3, 2));
    }

    #[test]
    fn test_pure_dp_gradient() {
        let penalty = PureDpPenalty::new(0.1);
        let q = random_logits(6, 4, 3);
        assert!(penalty.value(&q) > 0.0);
        assert_gradient_matches(&penalty, &q);
    }

    #[test]
    fn test_pure_dp_zero_within_budget() {
        let q = DMatrix::from_element(5, 3, 0.7);
        assert_eq!(PureDpPenalty::new(0.5).value(&q), 0.0);
        assert_eq!(PureDpPenalty::new(0.5).gradient(&q).norm(), 0.0);
    }

    #[test]
    fn test_approx_dp_gradient() {
        let penalty = ApproxDpPenalty::new(0.1, 1e-3);
        let q = random_logits(6, 4, 4);
        assert!(penalty.value(&q) > 0.0);
        assert_gradient_matches(&penalty, &q);
    }

    #[test]
    fn test_approx_dp_vanishes_for_loose_target() {
        let q = random_logits(10, 5, 5) * 10.0;
        let penalty = ApproxDpPenalty::new(1e6, 1.0);
        assert_eq!(penalty.value(&q), 0.0);
        assert!(penalty.gradient(&q).iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_composer_selects_dp_form() {
        let table = small_table();
        let pure = PenaltyComposer::new(
            &StandardPenalties,
            table.distance_matrix(),
            PrivacyTarget::new(1.0, 0.0).unwrap(),
        );
        let approx = PenaltyComposer::new(
            &StandardPenalties,
            table.distance_matrix(),
            PrivacyTarget::new(1.0, 1e-5).unwrap(),
        );
        let w = PenaltyWeights {
            dp: 1.0,
            l2: 0.0,
            dist: 0.0,
        };
        let q = random_logits(8, 3, 6) * 3.0;
        assert_eq!(pure.compose(w).mode(), DpMode::Pure);
        assert_eq!(approx.compose(w).mode(), DpMode::Approximate);
        assert!((pure.compose(w).value(&q) - PureDpPenalty::new(1.0).value(&q)).abs() < 1e-12);
        assert!(
            (approx.compose(w).value(&q) - ApproxDpPenalty::new(1.0, 1e-5).value(&q)).abs()
                < 1e-12
        );
    }

    #[test]
    fn test_composite_is_weighted_sum() {
        let table = small_table();
        let composer = PenaltyComposer::new(
            &StandardPenalties,
            table.distance_matrix(),
            PrivacyTarget::new(0.5, 1e-2).unwrap(),
        );
        let w = PenaltyWeights {
            dp: 2.0,
            l2: 0.3,
            dist: 0.05,
        };
        let penalty = composer.compose(w);
        let q = random_logits(8, 3, 7);
        let expected = 0.3 * L2Penalty.value(&q)
            + 0.05 * DistancePenalty::new(table.distance_matrix().clone()).value(&q)
            + 2.0 * ApproxDpPenalty::new(0.5, 1e-2).value(&q);
        assert!((penalty.value(&q) - expected).abs() < 1e-10);
        assert_gradient_matches(&penalty, &q);
    }
}
