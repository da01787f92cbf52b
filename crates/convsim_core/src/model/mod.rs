mod config;
mod results;
mod roster;

pub use config::SimulationConfig;
pub use results::{
    PlayerMetrics, ResultsFile, ResultsMetadata, RunResult, ScoreBreakdown, ValidationReport,
};
pub use roster::{Archetype, MAX_PLAYERS, Roster};
