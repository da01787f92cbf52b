//! CLI-level tests: argument parsing, plan files and end-to-end commands

mod cli;
mod commands;

use std::path::Path;

use clap::Parser;

use crate::cli::{AnalyzeArgs, Cli, Command, RunArgs};

/// Parse `convsim <args...>` and return the `run` flags
fn parse_run(args: &[&str]) -> RunArgs {
    let argv = ["convsim", "run"].into_iter().chain(args.iter().copied());
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Run(run) => run,
        Command::Analyze(_) => panic!("expected run"),
    }
}

/// Parse `convsim analyze <path> <flags...>`
fn parse_analyze(path: &Path, flags: &[&str]) -> AnalyzeArgs {
    let path = path.to_string_lossy().into_owned();
    let argv = ["convsim", "analyze", path.as_str()]
        .into_iter()
        .chain(flags.iter().copied());
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Analyze(analyze) => analyze,
        Command::Run(_) => panic!("expected analyze"),
    }
}

/// Small grid that runs in milliseconds
fn quick_run_args(output_dir: &Path) -> RunArgs {
    RunArgs {
        name: Some("smoke test".to_string()),
        altruism: Some(vec![0.0, 1.0]),
        tau: Some(vec![0.02, 0.1]),
        conversation_length: Some(vec![12]),
        simulations: Some(3),
        seed: Some(11),
        output_dir: Some(output_dir.to_path_buf()),
        ..Default::default()
    }
}
