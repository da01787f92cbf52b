//! Conversation game experiment library
//!
//! Sweeps a parameter grid over a conversation simulator, stores every run as
//! a JSON record and computes summary statistics over stored results.
//!
//! - [`grid`]: parameter lists and their row-major Cartesian product
//! - [`engine`]: the [`Simulator`] seam and the reference conversation engine
//! - [`runner`]: seeded, optionally parallel execution of an experiment plan
//! - [`storage`]: results files on disk
//! - [`analysis`]: flattening, grouped summaries, bootstrap CIs, effect sizes
//!
//! ```ignore
//! use convsim_core::{ConversationEngine, ExperimentPlan, ParameterGrid, run_experiment};
//!
//! let grid = ParameterGrid {
//!     altruism_prob: vec![0.0, 0.5, 1.0],
//!     ..Default::default()
//! };
//! let plan = ExperimentPlan { simulations: 5, ..ExperimentPlan::new("demo", grid) };
//! let file = run_experiment(&plan, &ConversationEngine::new(), None)?;
//! assert_eq!(file.results.len(), 15);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod engine;
pub mod error;
pub mod grid;
pub mod runner;
pub mod storage;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use engine::{ConversationEngine, Simulator};
pub use error::{AnalysisError, EngineError, GridError, ResultsError, RunnerError};
pub use grid::ParameterGrid;
pub use model::{
    Archetype, PlayerMetrics, ResultsFile, ResultsMetadata, Roster, RunResult, ScoreBreakdown,
    SimulationConfig, ValidationReport,
};
pub use runner::{ExperimentPlan, RunProgress, derive_seed, run_experiment};
pub use storage::{load_results, write_results};
