use std::path::PathBuf;

use clap::Parser;
use convsim_core::Roster;

use super::{parse_analyze, parse_run};
use crate::cli::{Cli, Command};

#[test]
fn test_run_flags_take_value_lists() {
    let args = parse_run(&[
        "--name",
        "grid",
        "--altruism",
        "0",
        "0.5",
        "1",
        "--min-samples",
        "2",
        "4",
        "--players",
        r#"{"p10": 4, "pr": 2}"#,
        r#"{"p10": 6}"#,
        "--simulations",
        "15",
        "--parallel",
    ]);
    assert_eq!(args.name.as_deref(), Some("grid"));
    assert_eq!(args.altruism, Some(vec![0.0, 0.5, 1.0]));
    assert_eq!(args.min_samples, Some(vec![2, 4]));
    let players = args.players.unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].total_players(), 6);
    assert_eq!(players[1], Roster::self_play(6));
    assert_eq!(args.simulations, Some(15));
    assert!(args.parallel);
    assert!(args.tau.is_none());
    assert!(!args.dashboard);
}

#[test]
fn test_run_requires_name_or_plan() {
    assert!(Cli::try_parse_from(["convsim", "run", "--altruism", "0.5"]).is_err());
    let args = parse_run(&["--plan", "plan.yaml"]);
    assert_eq!(args.plan, Some(PathBuf::from("plan.yaml")));
    assert!(args.name.is_none());
}

#[test]
fn test_invalid_roster_is_rejected_at_parse_time() {
    let unknown = Cli::try_parse_from(["convsim", "run", "--name", "x", "--players", r#"{"zz": 1}"#]);
    assert!(unknown.is_err());
    let malformed = Cli::try_parse_from(["convsim", "run", "--name", "x", "--players", "p10=3"]);
    assert!(malformed.is_err());
}

#[test]
fn test_analyze_defaults() {
    let args = parse_analyze(std::path::Path::new("results.json"), &[]);
    assert_eq!(args.results_file, PathBuf::from("results.json"));
    assert!(!args.analysis && !args.ci && !args.pairwise && !args.validate);
    assert_eq!(args.ci_group, vec!["altruism_prob"]);
    assert_eq!(args.ci_metric, "total_score");
    assert_eq!(args.ci_iterations, 1000);
    assert_eq!(args.ci_confidence, 0.95);
    assert_eq!(args.pairwise_group, "altruism_prob");
    assert_eq!(args.pairwise_metric, "total_score");
    assert!(!args.heatmap);
    assert_eq!(
        [args.param1.as_str(), args.param2.as_str(), args.metric.as_str(), args.fixed.as_str()],
        ["altruism_prob", "tau_margin", "total_score", "altruism_prob"]
    );
    assert!(args.seed.is_none());
    assert!(args.dashboard.is_none());
}

#[test]
fn test_global_flags_follow_subcommand() {
    let cli = Cli::try_parse_from([
        "convsim",
        "analyze",
        "r.json",
        "--ci-group",
        "altruism_prob",
        "tau_margin",
        "--log-level",
        "debug",
        "--log-file",
        "logs/convsim.log",
    ])
    .unwrap();
    assert_eq!(cli.log_level, "debug");
    assert_eq!(cli.log_file, Some(PathBuf::from("logs/convsim.log")));
    let Command::Analyze(args) = cli.command else {
        panic!("expected analyze");
    };
    assert_eq!(args.ci_group, vec!["altruism_prob", "tau_margin"]);

    let cli = Cli::try_parse_from(["convsim", "run", "--name", "x"]).unwrap();
    assert_eq!(cli.log_level, "info");
    assert!(cli.log_file.is_none());
}
