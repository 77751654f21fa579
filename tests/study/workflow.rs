use rrtune::pareto::dominates;
use rrtune::sampler::{MotpeSampler, RandomSampler};
use rrtune::{Direction, Error, Study};

#[test]
fn test_optimize_two_objective_front() {
    let study = Study::builder()
        .directions(vec![Direction::Minimize, Direction::Minimize])
        .sampler(MotpeSampler::builder().seed(7).build())
        .build()
        .unwrap();

    study
        .optimize(40, |trial| {
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            let y = trial.suggest_float("y", 0.0, 1.0)?;
            Ok::<_, Error>(vec![x + y, (1.0 - x) + y])
        })
        .unwrap();

    assert_eq!(study.n_trials(), 40);
    let front = study.best_trials();
    assert!(!front.is_empty());
    let all = study.trials();
    for a in &front {
        for b in &all {
            assert!(!dominates(&b.values, &a.values, study.directions()));
        }
    }
}

#[test]
fn test_optimize_records_failures_and_continues() {
    let study = Study::builder()
        .directions(vec![Direction::Minimize; 4])
        .sampler(RandomSampler::with_seed(1))
        .build()
        .unwrap();

    study
        .optimize(6, |trial| -> rrtune::Result<Vec<f64>> {
            let w = trial.suggest_float("dp weight", 1e-3, 10.0)?;
            if trial.id() == 2 {
                return Err(Error::Training("diverged".to_owned()));
            }
            Ok(vec![w, 0.0, 0.0, 0.0])
        })
        .unwrap();

    let trials = study.trials();
    assert_eq!(trials.len(), 6);
    assert!(!trials[2].is_complete());
    assert!(trials[2].values.is_empty());
    assert_eq!(trials.iter().filter(|t| t.is_complete()).count(), 5);
}

#[test]
fn test_optimize_all_failed() {
    let study = Study::builder().build().unwrap();
    let err = study
        .optimize(3, |_trial| {
            Err::<Vec<f64>, _>(Error::Training("nan".to_owned()))
        })
        .unwrap_err();
    assert!(matches!(err, Error::NoCompletedTrials));
    assert_eq!(study.n_trials(), 3);
}

#[test]
fn test_same_seed_same_history() {
    let run = || {
        let study = Study::builder()
            .directions(vec![Direction::Minimize, Direction::Minimize])
            .sampler(MotpeSampler::builder().seed(99).n_startup_trials(4).build())
            .build()
            .unwrap();
        study
            .optimize(15, |trial| {
                let x = trial.suggest_float("x", -2.0, 2.0)?;
                Ok::<_, Error>(vec![x * x, (x - 1.0).powi(2)])
            })
            .unwrap();
        study
            .trials()
            .iter()
            .map(|t| t.param("x").unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
