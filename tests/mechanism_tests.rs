//! Properties of the category tables, penalties and DP evaluator.

use std::sync::Arc;

use nalgebra::DMatrix;
use rrtune::mechanism::{
    CategoryTable, DpEvaluator, DpMode, Penalty, PenaltyComposer, PenaltyWeights, PrivacyTarget,
    StandardPenalties, flatten_logits,
};

fn random_logits(table: &CategoryTable, seed: u64, scale: f64) -> DMatrix<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    DMatrix::from_fn(table.n_rows(), table.n_cats(), |_, _| {
        (rng.f64() * 2.0 - 1.0) * scale
    })
}

#[test]
fn default_table_layout() {
    let table = CategoryTable::default_seats();
    assert_eq!((table.n_rows(), table.n_cats()), (79, 6));
    assert_eq!(table.category_of(0), 0);
    assert_eq!(table.category_of(6), 1);
    assert_eq!(table.category_of(78), 5);
    assert!(table.categories().windows(2).all(|w| w[0] <= w[1]));
    for row in table.one_hot().row_iter() {
        assert!((row.sum() - 1.0).abs() < f64::EPSILON);
    }
}

#[test]
fn loose_approximate_target_silences_dp_term() {
    let table = CategoryTable::default_seats();
    let composer = PenaltyComposer::new(
        &StandardPenalties,
        table.distance_matrix(),
        PrivacyTarget::new(1e6, 1.0).unwrap(),
    );
    let penalty = composer.compose(PenaltyWeights {
        dp: 1.0,
        l2: 0.0,
        dist: 0.0,
    });
    assert_eq!(penalty.mode(), DpMode::Approximate);
    let q = random_logits(&table, 1, 20.0);
    assert!(penalty.value(&q).abs() < 1e-12);
}

#[test]
fn evaluator_is_deterministic() {
    let table = Arc::new(CategoryTable::default_seats());
    let evaluator = DpEvaluator::new(Arc::clone(&table));
    let logits = flatten_logits(&random_logits(&table, 2, 3.0));
    let first = evaluator.evaluate(&logits, 0.5).unwrap();
    let second = evaluator.evaluate(&logits, 0.5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn evaluator_zero_epsilon_for_smooth_mechanism() {
    let table = Arc::new(CategoryTable::default_seats());
    let evaluator = DpEvaluator::new(Arc::clone(&table));
    // adjacent rows differ by at most 0.01 per logit
    let logits = DMatrix::from_fn(79, 6, |i, c| {
        #[allow(clippy::cast_precision_loss)]
        let v = 0.01 * (i as f64) * (c as f64) / 5.0;
        v
    });
    let metrics = evaluator.evaluate(&flatten_logits(&logits), 0.1).unwrap();
    assert_eq!(metrics.epsilon_total, 0.0);
    assert_eq!(metrics.delta_total, 0.0);
}

#[test]
fn evaluator_rejects_wrong_shape() {
    let evaluator = DpEvaluator::new(Arc::new(CategoryTable::default_seats()));
    assert!(evaluator.evaluate(&[0.0; 78 * 6], 1.0).is_err());
}
