use rrtune::sampler::MotpeSampler;
use rrtune::tuning::WeightSpace;
use rrtune::{Direction, Error, Study};

#[test]
fn test_motpe_weights_stay_in_bounds() {
    let study = Study::builder()
        .directions(vec![Direction::Minimize; 4])
        .sampler(MotpeSampler::builder().seed(5).n_startup_trials(5).build())
        .build()
        .unwrap();
    let space = WeightSpace::default();

    study
        .optimize(30, |trial| {
            let w = space.suggest(trial)?;
            Ok::<_, Error>(vec![w.dp, w.l2, w.dist, (w.dp - 5.0).abs()])
        })
        .unwrap();

    for t in study.trials() {
        assert!((1e-3..=10.0).contains(&t.param("dp weight").unwrap()));
        assert!((1e-4..=1.0).contains(&t.param("l2 weight").unwrap()));
        assert!((1e-5..=1e-3).contains(&t.param("dist. weight").unwrap()));
    }
}

#[test]
fn test_motpe_concentrates_on_good_region() {
    let study = Study::builder()
        .directions(vec![Direction::Minimize, Direction::Minimize])
        .sampler(MotpeSampler::builder().seed(11).n_startup_trials(10).build())
        .build()
        .unwrap();

    // both objectives favour x near 0.2
    study
        .optimize(60, |trial| {
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            let y = trial.suggest_float("y", 0.0, 1.0)?;
            Ok::<_, Error>(vec![(x - 0.2).abs() + y, (x - 0.2).powi(2) + 0.5 * y])
        })
        .unwrap();

    let trials = study.trials();
    let late: Vec<f64> = trials[30..].iter().map(|t| t.param("x").unwrap()).collect();
    #[allow(clippy::cast_precision_loss)]
    let mean_err = late.iter().map(|x| (x - 0.2).abs()).sum::<f64>() / late.len() as f64;
    // uniform sampling would average about 0.34
    assert!(mean_err < 0.25, "mean |x - 0.2| = {mean_err}");
}
