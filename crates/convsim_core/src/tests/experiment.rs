//! Grid expansion and runner behaviour

use super::{EchoSimulator, FailingSimulator, selfplay_grid, selfplay_plan};
use crate::error::RunnerError;
use crate::runner::{RunProgress, derive_seed, run_experiment};

#[test]
fn test_selfplay_grid_expands_to_864_configurations() {
    let grid = selfplay_grid();
    grid.validate().unwrap();
    assert_eq!(grid.total_configurations(), 864);
    assert_eq!(grid.configurations().count(), 864);
}

#[test]
fn test_total_runs_are_configurations_times_simulations() {
    let plan = selfplay_plan(15);
    let progress = RunProgress::default();
    let file = run_experiment(&plan, &EchoSimulator, Some(&progress)).unwrap();

    assert_eq!(file.results.len(), 12_960);
    assert_eq!(progress.completed(), 12_960);
    assert!(progress.is_finished());

    let metadata = file.metadata.as_ref().unwrap();
    assert_eq!(metadata.total_configurations, 864);
    assert_eq!(metadata.total_runs, 12_960);
    assert_eq!(metadata.simulations, 15);
    assert_eq!(metadata.engine, "echo");
    assert_eq!(metadata.run_name, "exp_selfplay_grid");
}

#[test]
fn test_records_follow_configuration_then_repetition_order() {
    let plan = selfplay_plan(3);
    let file = run_experiment(&plan, &EchoSimulator, None).unwrap();
    for (j, record) in file.results.iter().enumerate() {
        let expected = plan.grid.configuration(j / 3).unwrap();
        assert_eq!(plan.grid.index_of(&record.config), Some(j / 3));
        assert_eq!(record.config.altruism_prob, expected.altruism_prob);
        assert_eq!(record.config.seed, derive_seed(plan.base_seed, j as u64));
    }
}

#[test]
fn test_serial_and_parallel_runs_match() {
    let serial = selfplay_plan(2);
    let parallel = crate::runner::ExperimentPlan {
        parallel: true,
        ..serial.clone()
    };
    let a = run_experiment(&serial, &EchoSimulator, None).unwrap();
    let b = run_experiment(&parallel, &EchoSimulator, None).unwrap();
    assert_eq!(a.results, b.results);
}

#[test]
fn test_base_seed_changes_every_record_seed() {
    let mut plan = selfplay_plan(1);
    let a = run_experiment(&plan, &EchoSimulator, None).unwrap();
    plan.base_seed = 99;
    let b = run_experiment(&plan, &EchoSimulator, None).unwrap();
    assert!(
        a.results
            .iter()
            .zip(&b.results)
            .all(|(x, y)| x.config.seed != y.config.seed)
    );
}

#[test]
fn test_engine_failure_reports_configuration() {
    let plan = selfplay_plan(2);
    let err = run_experiment(&plan, &FailingSimulator { altruism: 0.25 }, None).unwrap_err();
    match err {
        RunnerError::Engine { configuration, .. } => {
            let config = plan.grid.configuration(configuration).unwrap();
            assert_eq!(config.altruism_prob, 0.25);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cancelled_run_stops() {
    let plan = selfplay_plan(2);
    let progress = RunProgress::default();
    progress.cancel();
    let err = run_experiment(&plan, &EchoSimulator, Some(&progress)).unwrap_err();
    assert!(matches!(err, RunnerError::Cancelled));
    assert_eq!(progress.completed(), 0);
}
