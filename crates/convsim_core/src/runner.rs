//! Experiment execution.
//!
//! A plan expands its grid into configurations and plays `simulations`
//! matches of each. Job `j` covers configuration `j / simulations`, repetition
//! `j % simulations`, and is seeded with `derive_seed(base_seed, j)`, so a
//! serial and a parallel run of the same plan produce the same records in the
//! same order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::Simulator;
use crate::error::RunnerError;
use crate::grid::ParameterGrid;
use crate::model::{ResultsFile, ResultsMetadata, RunResult, SimulationConfig};

/// Default repetitions per configuration
pub const DEFAULT_SIMULATIONS: usize = 10;

/// A named experiment: the grid to sweep and how to run it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentPlan {
    pub name: String,
    pub grid: ParameterGrid,
    pub simulations: usize,
    pub parallel: bool,
    pub base_seed: u64,
}

impl ExperimentPlan {
    pub fn new(name: impl Into<String>, grid: ParameterGrid) -> Self {
        Self {
            name: name.into(),
            grid,
            simulations: DEFAULT_SIMULATIONS,
            parallel: false,
            base_seed: 0,
        }
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.name.trim().is_empty() {
            return Err(RunnerError::EmptyName);
        }
        if self.simulations == 0 {
            return Err(RunnerError::ZeroSimulations);
        }
        self.grid.validate()?;
        Ok(())
    }

    pub fn total_runs(&self) -> usize {
        self.grid.total_configurations() * self.simulations
    }
}

/// SplitMix64 mix of a base seed and a stream index
pub fn derive_seed(base_seed: u64, stream: u64) -> u64 {
    let mut z = base_seed.wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Progress tracking for a running experiment.
///
/// Clones share the same counters, so a reporter thread can watch a run
/// executing on another thread and cancel it.
#[derive(Debug, Clone)]
pub struct RunProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl RunProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in `[0, 1]`
    #[must_use]
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        (self.completed() as f64 / total as f64).min(1.0)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed() >= self.total()
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Run every configuration of the plan `simulations` times.
///
/// When `plan.parallel` is set (and the `parallel` feature is enabled) jobs run
/// on the current rayon pool. The first engine failure aborts the experiment.
pub fn run_experiment<S: Simulator + ?Sized>(
    plan: &ExperimentPlan,
    simulator: &S,
    progress: Option<&RunProgress>,
) -> Result<ResultsFile, RunnerError> {
    plan.validate()?;

    let configurations: Vec<SimulationConfig> =
        plan.grid.configurations().map(|(_, config)| config).collect();
    let total_runs = configurations.len() * plan.simulations;
    let parallel = plan.parallel && cfg!(feature = "parallel");

    if let Some(p) = progress {
        p.reset(total_runs);
    }
    info!(
        name = %plan.name,
        configurations = configurations.len(),
        simulations = plan.simulations,
        total_runs,
        parallel,
        engine = simulator.name(),
        "Starting experiment"
    );
    debug!(grid = %plan.grid.describe(), "Expanded parameter grid");

    let job = |j: usize| -> Result<RunResult, RunnerError> {
        if progress.is_some_and(RunProgress::is_cancelled) {
            return Err(RunnerError::Cancelled);
        }
        let (configuration, run) = (j / plan.simulations, j % plan.simulations);
        let seed = derive_seed(plan.base_seed, j as u64);
        let result = simulator
            .simulate(&configurations[configuration], seed)
            .map_err(|source| RunnerError::Engine {
                configuration,
                run,
                source,
            })?;
        if let Some(p) = progress {
            p.increment();
        }
        Ok(result)
    };

    let results = if parallel {
        run_parallel(total_runs, &job)?
    } else {
        (0..total_runs).map(&job).collect::<Result<Vec<_>, _>>()?
    };

    info!(name = %plan.name, total_runs = results.len(), "Experiment finished");

    Ok(ResultsFile {
        metadata: Some(ResultsMetadata {
            run_name: plan.name.clone(),
            created_at: jiff::Timestamp::now(),
            parameter_grid: plan.grid.clone(),
            simulations: plan.simulations,
            total_configurations: configurations.len(),
            total_runs,
            parallel,
            base_seed: plan.base_seed,
            engine: simulator.name().to_string(),
        }),
        results,
    })
}

#[cfg(feature = "parallel")]
fn run_parallel<F>(total_runs: usize, job: &F) -> Result<Vec<RunResult>, RunnerError>
where
    F: Fn(usize) -> Result<RunResult, RunnerError> + Sync,
{
    (0..total_runs).into_par_iter().map(job).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_parallel<F>(total_runs: usize, job: &F) -> Result<Vec<RunResult>, RunnerError>
where
    F: Fn(usize) -> Result<RunResult, RunnerError> + Sync,
{
    (0..total_runs).map(job).collect()
}
