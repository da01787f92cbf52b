//! Command-line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use convsim_core::Roster;

#[derive(Parser, Debug)]
#[command(name = "convsim")]
#[command(version, about = "Run and analyze conversation game experiments")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Also append logs to this file (rotated when it grows past 5 MB)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sweep a parameter grid and save every run to a results file
    Run(RunArgs),
    /// Summarise a saved results file
    Analyze(AnalyzeArgs),
}

/// Flags of `convsim run`.
///
/// List flags take one or more values; each value list becomes one grid
/// dimension. Flags that are not given fall back to the plan file, then to the
/// built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Experiment name, used in the results file name
    #[arg(long, required_unless_present = "plan")]
    pub name: Option<String>,

    /// Probability that Player10 plays for the shared score on a turn
    #[arg(long, num_args = 1..)]
    pub altruism: Option<Vec<f64>>,

    /// Margin Player10 needs over the baseline before speaking
    #[arg(long, num_args = 1..)]
    pub tau: Option<Vec<f64>>,

    /// Freshness bonus and bar relaxation after a pause
    #[arg(long, num_args = 1..)]
    pub epsilon_fresh: Option<Vec<f64>>,

    /// Bar tightening for monotonous candidates
    #[arg(long, num_args = 1..)]
    pub epsilon_mono: Option<Vec<f64>>,

    /// Observations before a player's estimate joins the baseline
    #[arg(long, num_args = 1..)]
    pub min_samples: Option<Vec<u32>>,

    /// Smoothing factor of Player10's quality estimates
    #[arg(long, num_args = 1..)]
    pub ewma_alpha: Option<Vec<f64>>,

    #[arg(long, num_args = 1..)]
    pub w_importance: Option<Vec<f64>>,

    #[arg(long, num_args = 1..)]
    pub w_coherence: Option<Vec<f64>>,

    #[arg(long, num_args = 1..)]
    pub w_freshness: Option<Vec<f64>>,

    #[arg(long, num_args = 1..)]
    pub w_monotony: Option<Vec<f64>>,

    /// Rosters as JSON objects, e.g. '{"p10": 4, "pr": 2}'
    #[arg(long, num_args = 1..)]
    pub players: Option<Vec<Roster>>,

    #[arg(long, num_args = 1..)]
    pub subjects: Option<Vec<u32>>,

    #[arg(long, num_args = 1..)]
    pub memory_size: Option<Vec<u32>>,

    #[arg(long, num_args = 1..)]
    pub conversation_length: Option<Vec<u32>>,

    /// Repetitions per configuration [default: 10]
    #[arg(long)]
    pub simulations: Option<usize>,

    /// Run simulations on a thread pool
    #[arg(long)]
    pub parallel: bool,

    /// Base seed for per-run seed derivation [default: 0]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for results files [default: results]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// YAML plan file; flags override its fields
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Worker threads for --parallel
    #[arg(long)]
    pub threads: Option<usize>,

    /// Also write an HTML dashboard next to the results
    #[arg(long)]
    pub dashboard: bool,
}

/// Flags of `convsim analyze`
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Results file written by `convsim run`
    pub results_file: PathBuf,

    /// Print column types, overall and grouped summaries
    #[arg(long)]
    pub analysis: bool,

    /// Restrict summaries to these columns
    #[arg(long, num_args = 1..)]
    pub analysis_columns: Vec<String>,

    /// Bootstrap confidence intervals by group
    #[arg(long)]
    pub ci: bool,

    #[arg(long, num_args = 1.., default_value = "altruism_prob")]
    pub ci_group: Vec<String>,

    #[arg(long, default_value = "total_score")]
    pub ci_metric: String,

    #[arg(long, default_value_t = 1000)]
    pub ci_iterations: usize,

    #[arg(long, default_value_t = 0.95)]
    pub ci_confidence: f64,

    /// Mean deltas and Cohen's d between levels of a column
    #[arg(long)]
    pub pairwise: bool,

    #[arg(long, default_value = "altruism_prob")]
    pub pairwise_group: String,

    #[arg(long, default_value = "total_score")]
    pub pairwise_metric: String,

    /// Print the heatmap of `--metric` over `--param1` by `--param2`, plus
    /// one heatmap per level of `--fixed`
    #[arg(long)]
    pub heatmap: bool,

    /// Heatmap rows
    #[arg(long, default_value = "altruism_prob")]
    pub param1: String,

    /// Heatmap columns
    #[arg(long, default_value = "tau_margin")]
    pub param2: String,

    /// Heatmap cell value
    #[arg(long, default_value = "total_score")]
    pub metric: String,

    /// Facet column of the per-level heatmaps
    #[arg(long, default_value = "altruism_prob")]
    pub fixed: String,

    /// Only list columns whose type contains one of these tokens
    #[arg(long, num_args = 1..)]
    pub dtype_filter: Vec<String>,

    /// Seed for bootstrap resampling (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Check run counts and grid membership against the file's metadata
    #[arg(long)]
    pub validate: bool,

    /// Write an HTML dashboard to this path
    #[arg(long)]
    pub dashboard: Option<PathBuf>,
}
