use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use convsim_core::storage::dashboard_path;
use convsim_core::{
    EngineError, ResultsFile, RunResult, SimulationConfig, Simulator, load_results, write_results,
};

use super::{parse_analyze, quick_run_args};
use crate::cli::RunArgs;
use crate::commands::{analyze_to, execute, run};
use crate::plan::resolve;

struct BrokenEngine;

impl Simulator for BrokenEngine {
    fn name(&self) -> &str {
        "broken"
    }

    fn simulate(&self, _config: &SimulationConfig, _seed: u64) -> Result<RunResult, EngineError> {
        Err(EngineError::InvalidConfig("engine offline".to_string()))
    }
}

struct CrashingEngine;

impl Simulator for CrashingEngine {
    fn name(&self) -> &str {
        "crashing"
    }

    fn simulate(&self, _config: &SimulationConfig, _seed: u64) -> Result<RunResult, EngineError> {
        panic!("simulator crashed");
    }
}

fn analyze_output(path: &Path, flags: &[&str]) -> color_eyre::Result<String> {
    let mut out = Vec::new();
    analyze_to(&parse_analyze(path, flags), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

/// Text after `title` up to the next section header
fn section<'a>(text: &'a str, title: &str) -> &'a str {
    let start = text.find(title).map_or(text.len(), |i| i + title.len());
    let rest = &text[start..];
    rest.find("\n===").map_or(rest, |end| &rest[..end])
}

#[test]
fn test_run_writes_results_and_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let args = RunArgs {
        dashboard: true,
        ..quick_run_args(dir.path())
    };
    let path = run(&args).unwrap();

    assert_eq!(path.parent(), Some(dir.path()));
    assert!(path.file_name().unwrap().to_string_lossy().ends_with("_smoke_test.json"));
    let file = load_results(&path).unwrap();
    assert_eq!(file.len(), 12);
    let metadata = file.metadata.as_ref().unwrap();
    assert_eq!(metadata.run_name, "smoke test");
    assert_eq!(metadata.engine, "conversation");
    assert_eq!(metadata.base_seed, 11);
    assert!(file.validate().unwrap().is_valid());

    let html = fs::read_to_string(dashboard_path(&path)).unwrap();
    assert!(html.contains("<h1>smoke test</h1>"));
}

#[test]
fn test_parallel_run_matches_serial() {
    let serial_dir = tempfile::tempdir().unwrap();
    let parallel_dir = tempfile::tempdir().unwrap();
    let serial = load_results(&run(&quick_run_args(serial_dir.path())).unwrap()).unwrap();
    let args = RunArgs {
        parallel: true,
        threads: Some(2),
        ..quick_run_args(parallel_dir.path())
    };
    let parallel = load_results(&run(&args).unwrap()).unwrap();

    assert_eq!(serial.len(), parallel.len());
    for (a, b) in serial.results.iter().zip(&parallel.results) {
        assert_eq!(a.config, b.config);
        assert_eq!(a.total_score, b.total_score);
        assert_eq!(a.player_metrics, b.player_metrics);
        assert_eq!(a.pause_count, b.pause_count);
    }
}

#[test]
fn test_engine_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = resolve(&quick_run_args(dir.path()), None).unwrap();
    let err = execute(&settings, &BrokenEngine).unwrap_err();
    assert!(err.to_string().contains("engine offline"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_simulator_panic_propagates_instead_of_hanging() {
    let dir = tempfile::tempdir().unwrap();
    let settings = resolve(&quick_run_args(dir.path()), None).unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| execute(&settings, &CrashingEngine)));
        let _ = tx.send(outcome.is_err());
    });

    let panicked = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("run did not return after the simulator panicked");
    assert!(panicked);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_analyze_prints_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = run(&quick_run_args(dir.path())).unwrap();
    let dashboard = dir.path().join("report").join("dash.html");
    let dashboard_arg = dashboard.to_string_lossy().into_owned();

    let output = analyze_output(
        &path,
        &[
            "--analysis",
            "--ci",
            "--ci-iterations",
            "200",
            "--pairwise",
            "--validate",
            "--seed",
            "5",
            "--dashboard",
            &dashboard_arg,
        ],
    )
    .unwrap();

    assert!(output.starts_with("Loaded 12 runs from"));
    for section in [
        "Column dtypes:",
        "=== OVERALL ===",
        "=== Top configurations (group means) ===",
        "=== Bootstrap confidence intervals ===",
        "=== Pairwise deltas ===",
        "=== VALIDATION ===",
    ] {
        assert!(output.contains(section), "missing {section}");
    }
    assert!(
        output
            .lines()
            .any(|l| l.starts_with("altruism_prob ") && l.ends_with("float64"))
    );
    assert!(output.contains("players"));
    assert!(output.contains("OK"));
    assert!(dashboard.exists());

    // the same seed reproduces the bootstrap table
    let again = analyze_output(&path, &["--ci", "--ci-iterations", "200", "--seed", "5"]).unwrap();
    let title = "=== Bootstrap confidence intervals ===";
    assert_eq!(section(&again, title), section(&output, title));
}

#[test]
fn test_analyze_heatmaps_follow_axis_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = run(&quick_run_args(dir.path())).unwrap();

    let output = analyze_output(&path, &["--heatmap"]).unwrap();
    let main = section(&output, "=== total_score heatmap ===");
    assert!(main.contains("altruism_prob \\ tau_margin"));
    assert!(main.contains("0.020") && main.contains("0.100"));
    // the default facet is also the row column
    assert!(!output.contains("total_score | "));

    let faceted = analyze_output(
        &path,
        &["--heatmap", "--param2", "epsilon_fresh", "--metric", "pause_count", "--fixed", "tau_margin"],
    )
    .unwrap();
    assert!(faceted.contains("=== pause_count heatmap ==="));
    for facet in ["=== pause_count | tau_margin=0.020 ===", "=== pause_count | tau_margin=0.100 ==="] {
        let table = section(&faceted, facet);
        assert!(table.contains("altruism_prob \\ epsilon_fresh"), "missing {facet}");
        assert_eq!(table.lines().filter(|l| !l.is_empty()).count(), 4);
    }

    let broken = analyze_output(&path, &["--heatmap", "--metric", "players"]).unwrap();
    assert!(broken.contains("Failed to compute heatmap: column `players` is not numeric"));
}

#[test]
fn test_rosters_without_player10_summarise_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let args = RunArgs {
        players: Some(vec![r#"{"pr": 3}"#.parse().unwrap()]),
        ..quick_run_args(dir.path())
    };
    let path = run(&args).unwrap();

    let output = analyze_output(&path, &["--analysis"]).unwrap();
    assert!(
        output
            .lines()
            .any(|l| l.starts_with("player10_score ") && l.ends_with("float64"))
    );
    let overall = section(&output, "=== OVERALL ===");
    let row = overall
        .lines()
        .find(|l| l.starts_with("player10_score "))
        .expect("player10_score row");
    assert_eq!(row.split_whitespace().collect::<Vec<_>>(), ["player10_score", "n/a", "n/a"]);
}

#[test]
fn test_repeated_runs_keep_every_results_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = run(&quick_run_args(dir.path())).unwrap();
    let second = run(&quick_run_args(dir.path())).unwrap();

    assert_ne!(first, second);
    assert_eq!(load_results(&first).unwrap().len(), 12);
    assert_eq!(load_results(&second).unwrap().len(), 12);
}

#[test]
fn test_analyze_reports_problems_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let path = run(&quick_run_args(dir.path())).unwrap();

    let output = analyze_output(
        &path,
        &[
            "--analysis",
            "--analysis-columns",
            "total_score",
            "no_such_column",
            "--dtype-filter",
            "complex",
            "--ci",
            "--ci-confidence",
            "1.5",
            "--pairwise",
            "--pairwise-metric",
            "players",
        ],
    )
    .unwrap();

    assert!(output.contains("Warning: columns not found in table: no_such_column"));
    assert!(output.contains("(no columns match dtype filter)"));
    assert!(output.contains("total_score_mean"));
    assert!(output.contains("Failed to compute bootstrap CI: confidence must be between 0 and 1"));
    assert!(output.contains("Failed to compute pairwise deltas: column `players` is not numeric"));
}

#[test]
fn test_analyze_rejects_missing_and_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = analyze_output(&dir.path().join("nope.json"), &[]).unwrap_err();
    assert!(missing.to_string().starts_with("File not found"));

    let empty = dir.path().join("empty.json");
    write_results(
        &ResultsFile {
            metadata: None,
            results: Vec::new(),
        },
        &empty,
    )
    .unwrap();
    let err = analyze_output(&empty, &[]).unwrap_err();
    assert_eq!(err.to_string(), "No runs found in results file.");
}

#[test]
fn test_legacy_list_has_nothing_to_validate() {
    let dir = tempfile::tempdir().unwrap();
    let path = run(&quick_run_args(dir.path())).unwrap();
    let file = load_results(&path).unwrap();
    let legacy = dir.path().join("legacy.json");
    fs::write(&legacy, serde_json::to_string(&file.results).unwrap()).unwrap();

    let output = analyze_output(&legacy, &["--validate"]).unwrap();
    assert!(output.contains("(no metadata; nothing to validate)"));
}
