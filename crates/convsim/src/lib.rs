//! Command-line front end for conversation game experiments
//!
//! `convsim run` sweeps a parameter grid over the reference engine and saves
//! every run; `convsim analyze` prints summaries of a saved results file and
//! can render an HTML dashboard.

// ============================================================================
// Command modules
// ============================================================================

pub mod cli;
pub mod commands;
pub mod plan;

// ============================================================================
// Output and support modules
// ============================================================================

pub mod dashboard;
pub mod format;
pub mod logging;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use cli::{AnalyzeArgs, Cli, Command, RunArgs};
pub use logging::init_logging;
