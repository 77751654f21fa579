//! The per-trial objective: sample weights, train, evaluate, score.

use crate::error::Result;
use crate::mechanism::{
    CategoryTable, DpEvaluator, DpMetrics, PenaltyComposer, PenaltyWeights, PrivacyTarget, Trainer,
};
use crate::parameter::FloatParam;
use crate::trial::Trial;

/// Name of the DP-term weight parameter.
pub const DP_WEIGHT: &str = "dp weight";
/// Name of the L2-term weight parameter.
pub const L2_WEIGHT: &str = "l2 weight";
/// Name of the distance-term weight parameter.
pub const DIST_WEIGHT: &str = "dist. weight";

/// Probability above which mass on the furthest category counts as a miss.
pub const FAR_MASS_THRESHOLD: f64 = 1e-3;

/// The three weight parameters and their ranges.
///
/// The default ranges are sampled uniformly:
/// `dp weight ∈ [1e-3, 10]`, `l2 weight ∈ [1e-4, 1]`,
/// `dist. weight ∈ [1e-5, 1e-3]`.
#[derive(Clone, Debug)]
pub struct WeightSpace {
    pub dp: FloatParam,
    pub l2: FloatParam,
    pub dist: FloatParam,
}

impl Default for WeightSpace {
    fn default() -> Self {
        Self {
            dp: FloatParam::new(DP_WEIGHT, 1e-3, 1e1),
            l2: FloatParam::new(L2_WEIGHT, 1e-4, 1e0),
            dist: FloatParam::new(DIST_WEIGHT, 1e-5, 1e-3),
        }
    }
}

impl WeightSpace {
    /// Suggests all three weights, DP weight first.
    ///
    /// # Errors
    ///
    /// Propagates parameter validation and conflict errors from the trial.
    pub fn suggest(&self, trial: &mut Trial) -> Result<PenaltyWeights> {
        let dp = self.dp.suggest(trial)?;
        let l2 = self.l2.suggest(trial)?;
        let dist = self.dist.suggest(trial)?;
        Ok(PenaltyWeights { dp, l2, dist })
    }
}

/// The four minimized objective values of one trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialScore {
    /// `‖log p(true category)‖₂` over all positions.
    pub logp_loss: f64,
    /// `|epsilon_total − ε| + |delta_total − δ|`.
    pub dp_params_loss: f64,
    /// Number of positions reporting their furthest category with
    /// probability above [`FAR_MASS_THRESHOLD`].
    pub dist_loss: f64,
    /// `‖p(furthest category)‖₂` over all positions.
    pub far_mass_norm: f64,
}

impl TrialScore {
    /// Scores `metrics` for `target`; `furthest[i]` is the category
    /// furthest from position `i`'s own.
    #[must_use]
    pub fn new(metrics: &DpMetrics, target: PrivacyTarget, furthest: &[usize]) -> Self {
        let far_mass: Vec<f64> = furthest
            .iter()
            .enumerate()
            .map(|(i, &c)| metrics.log_probs[(i, c)].exp())
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let dist_loss = far_mass.iter().filter(|&&p| p > FAR_MASS_THRESHOLD).count() as f64;

        Self {
            logp_loss: metrics.log_p_correct.norm(),
            dp_params_loss: (metrics.epsilon_total - target.epsilon()).abs()
                + (metrics.delta_total - target.delta()).abs(),
            dist_loss,
            far_mass_norm: far_mass.iter().map(|p| p * p).sum::<f64>().sqrt(),
        }
    }

    /// Objective values in study order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        vec![
            self.logp_loss,
            self.dp_params_loss,
            self.dist_loss,
            self.far_mass_norm,
        ]
    }
}

/// Number of objectives a [`TuningObjective`] reports.
pub const N_OBJECTIVES: usize = 4;

/// Trains and scores one mechanism per trial.
///
/// The trainer receives the composed penalty as an argument on every call;
/// nothing about the previous trial carries over except the trainer's own
/// state.
pub struct TuningObjective<T> {
    composer: PenaltyComposer,
    evaluator: DpEvaluator,
    furthest: Vec<usize>,
    weights: WeightSpace,
    trainer: T,
    n_iters: usize,
    seed: u64,
    silent: bool,
}

impl<T: Trainer> TuningObjective<T> {
    /// Wires an objective over `table` with the given composer and trainer.
    #[must_use]
    pub fn new(
        table: std::sync::Arc<CategoryTable>,
        composer: PenaltyComposer,
        trainer: T,
        n_iters: usize,
        seed: u64,
    ) -> Self {
        Self {
            furthest: table.furthest_categories(),
            evaluator: DpEvaluator::new(table),
            composer,
            weights: WeightSpace::default(),
            trainer,
            n_iters,
            seed,
            silent: true,
        }
    }

    /// Replaces the weight search space.
    #[must_use]
    pub fn weight_space(mut self, weights: WeightSpace) -> Self {
        self.weights = weights;
        self
    }

    /// Whether the trainer should suppress progress output.
    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// The trainer, for inspection after a run.
    #[must_use]
    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    /// Runs one trial and returns its [`N_OBJECTIVES`] values.
    ///
    /// Records `epsilon_total`, `delta_total` and `dp_mode` as trial user
    /// attributes.
    ///
    /// # Errors
    ///
    /// Propagates parameter, training and evaluation errors unchanged.
    pub fn evaluate(&mut self, trial: &mut Trial) -> Result<Vec<f64>> {
        let weights = self.weights.suggest(trial)?;
        let penalty = self.composer.compose(weights);

        let logits = self
            .trainer
            .train(&penalty, self.n_iters, self.seed, self.silent)?;

        let target = self.composer.target();
        let metrics = self.evaluator.evaluate(&logits, target.epsilon())?;
        let score = TrialScore::new(&metrics, target, &self.furthest);

        trial.set_user_attr("epsilon_total", metrics.epsilon_total);
        trial.set_user_attr("delta_total", metrics.delta_total);
        trial.set_user_attr("dp_mode", penalty.mode().as_str());

        trace_debug!(
            trial_id = trial.id(),
            dp_weight = weights.dp,
            l2_weight = weights.l2,
            dist_weight = weights.dist,
            epsilon_total = metrics.epsilon_total,
            delta_total = metrics.delta_total,
            logp_loss = score.logp_loss,
            dp_params_loss = score.dp_params_loss,
            dist_loss = score.dist_loss,
            far_mass_norm = score.far_mass_norm,
            "trial evaluated"
        );

        Ok(score.values())
    }
}
