use rrtune::parameter::FloatParam;
use rrtune::sampler::RandomSampler;
use rrtune::{Direction, Error, Study};

#[test]
fn test_random_sampler_respects_ranges() {
    let study = Study::builder()
        .directions(vec![Direction::Minimize])
        .sampler(RandomSampler::with_seed(3))
        .build()
        .unwrap();
    let lr = FloatParam::new("lr", 1e-5, 1e-1).log_scale();
    let coarse = FloatParam::new("coarse", 0.0, 1.0).step(0.25);

    study
        .optimize(50, |trial| {
            let a = lr.suggest(trial)?;
            let b = coarse.suggest(trial)?;
            Ok::<_, Error>(vec![a + b])
        })
        .unwrap();

    for t in study.trials() {
        let a = t.param("lr").unwrap();
        let b = t.param("coarse").unwrap();
        assert!((1e-5..=1e-1).contains(&a));
        assert!((b / 0.25 - (b / 0.25).round()).abs() < 1e-9);
    }
}
