use rrtune::parameter::FloatParam;
use rrtune::sampler::MotpeSampler;
use rrtune::{Direction, Error, Study, TrialState};

fn study() -> Study {
    Study::builder()
        .directions(vec![Direction::Minimize, Direction::Minimize])
        .sampler(MotpeSampler::builder().seed(42).n_startup_trials(5).build())
        .build()
        .unwrap()
}

#[test]
fn test_ask_and_tell_basic() {
    let study = study();
    let x_param = FloatParam::new("x", 0.0, 10.0);

    for _ in 0..10 {
        let mut trial = study.ask();
        let x = x_param.suggest(&mut trial).unwrap();
        study.tell(trial, Ok::<_, &str>(vec![x, 10.0 - x])).unwrap();
    }

    assert_eq!(study.n_trials(), 10);
    // every point on x + y = 10 is non-dominated
    assert_eq!(study.best_trials().len(), 10);
}

#[test]
fn test_ask_and_tell_with_failures() {
    let study = study();
    let x_param = FloatParam::new("x", -5.0, 5.0);

    for i in 0..10 {
        let mut trial = study.ask();
        let x = x_param.suggest(&mut trial).unwrap();
        if i % 2 == 0 {
            study
                .tell(trial, Ok::<_, &str>(vec![x * x, (x - 1.0).powi(2)]))
                .unwrap();
        } else {
            study
                .tell(trial, Err::<Vec<f64>, _>("simulated failure"))
                .unwrap();
        }
    }

    let trials = study.trials();
    assert_eq!(trials.len(), 10);
    let failed: Vec<_> = trials
        .iter()
        .filter(|t| t.state == TrialState::Failed)
        .collect();
    assert_eq!(failed.len(), 5);
    assert!(failed.iter().all(|t| t.user_attr("fail_reason").is_some()));
    assert!(study.best_trials().iter().all(|t| t.is_complete()));
}

#[test]
fn test_tell_wrong_arity_stores_nothing() {
    let study = study();
    let trial = study.ask();
    let err = study
        .tell(trial, Ok::<_, &str>(vec![1.0, 2.0, 3.0]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ObjectiveDimensionMismatch {
            expected: 2,
            got: 3
        }
    ));
    assert_eq!(study.n_trials(), 0);
}
