use rrtune::storage::MemoryStorage;
use rrtune::{Direction, Study};

#[test]
fn test_builder_defaults() {
    let study = Study::builder().build().unwrap();
    assert_eq!(study.study_name(), "default");
    assert_eq!(study.directions(), &[Direction::Minimize]);
    assert_eq!(study.n_trials(), 0);
}

#[test]
fn test_builder_sets_name_and_directions() {
    let study = Study::builder()
        .study_name("weights")
        .directions(vec![Direction::Minimize, Direction::Maximize])
        .storage(MemoryStorage::new())
        .build()
        .unwrap();
    assert_eq!(study.study_name(), "weights");
    assert_eq!(study.n_objectives(), 2);
    assert_eq!(study.directions()[1], Direction::Maximize);
}

#[test]
fn test_builder_rejects_no_directions() {
    assert!(Study::builder().directions(vec![]).build().is_err());
}
