//! YAML plan files and their merge with `run` flags.
//!
//! ```yaml
//! name: exp_selfplay_grid
//! simulations: 15
//! parallel: true
//! grid:
//!   altruism_prob: [0.0, 0.25, 0.5, 0.75]
//!   tau_margin: [0.02, 0.05, 0.1]
//!   players: [{ p10: 10 }]
//! ```

use std::path::{Path, PathBuf};

use color_eyre::eyre::{WrapErr, eyre};
use convsim_core::ParameterGrid;
use convsim_core::runner::{DEFAULT_SIMULATIONS, ExperimentPlan};
use serde::{Deserialize, Serialize};

use crate::cli::RunArgs;

pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Contents of a plan file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanFile {
    pub name: Option<String>,
    pub simulations: Option<usize>,
    pub parallel: Option<bool>,
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub threads: Option<usize>,
    pub dashboard: Option<bool>,
    pub grid: Option<ParameterGrid>,
}

impl PlanFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }
}

pub fn load_plan(path: &Path) -> color_eyre::Result<PlanFile> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read plan file {}", path.display()))?;
    PlanFile::from_yaml(&content).wrap_err_with(|| format!("Invalid plan file {}", path.display()))
}

/// Everything `run` needs after flags and plan are merged
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub plan: ExperimentPlan,
    pub output_dir: PathBuf,
    pub threads: Option<usize>,
    pub dashboard: bool,
}

/// Merge flags over a plan file over the defaults
pub fn resolve(args: &RunArgs, file: Option<PlanFile>) -> color_eyre::Result<RunSettings> {
    let file = file.unwrap_or_default();
    let name = args
        .name
        .clone()
        .or(file.name)
        .ok_or_else(|| eyre!("an experiment name is required (--name or `name` in the plan file)"))?;

    let mut grid = file.grid.unwrap_or_default();
    override_list(&mut grid.altruism_prob, &args.altruism);
    override_list(&mut grid.tau_margin, &args.tau);
    override_list(&mut grid.epsilon_fresh, &args.epsilon_fresh);
    override_list(&mut grid.epsilon_mono, &args.epsilon_mono);
    override_list(&mut grid.min_samples_pid, &args.min_samples);
    override_list(&mut grid.ewma_alpha, &args.ewma_alpha);
    override_list(&mut grid.importance_weight, &args.w_importance);
    override_list(&mut grid.coherence_weight, &args.w_coherence);
    override_list(&mut grid.freshness_weight, &args.w_freshness);
    override_list(&mut grid.monotony_weight, &args.w_monotony);
    override_list(&mut grid.players, &args.players);
    override_list(&mut grid.subjects, &args.subjects);
    override_list(&mut grid.memory_size, &args.memory_size);
    override_list(&mut grid.conversation_length, &args.conversation_length);

    Ok(RunSettings {
        plan: ExperimentPlan {
            name,
            grid,
            simulations: args.simulations.or(file.simulations).unwrap_or(DEFAULT_SIMULATIONS),
            parallel: args.parallel || file.parallel.unwrap_or(false),
            base_seed: args.seed.or(file.seed).unwrap_or(0),
        },
        output_dir: args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        threads: args.threads.or(file.threads),
        dashboard: args.dashboard || file.dashboard.unwrap_or(false),
    })
}

fn override_list<T: Clone>(target: &mut Vec<T>, flag: &Option<Vec<T>>) {
    if let Some(values) = flag {
        target.clone_from(values);
    }
}
