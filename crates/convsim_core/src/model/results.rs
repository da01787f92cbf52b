//! Run records and the results file
//!
//! Contains the output types produced by the runner and consumed by the
//! analyzer. Records are written once and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::SimulationConfig;
use crate::grid::ParameterGrid;

/// Shared score split into its four components
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBreakdown {
    pub importance: f64,
    pub coherence: f64,
    pub freshness: f64,
    pub nonmonotonousness: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    /// Component names in display order (excludes `total`)
    pub const COMPONENTS: [&'static str; 4] =
        ["importance", "coherence", "freshness", "nonmonotonousness"];

    pub fn components(&self) -> [(&'static str, f64); 4] {
        [
            ("importance", self.importance),
            ("coherence", self.coherence),
            ("freshness", self.freshness),
            ("nonmonotonousness", self.nonmonotonousness),
        ]
    }

    pub fn component(&self, name: &str) -> Option<f64> {
        self.components()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Sum of the four components
    pub fn component_sum(&self) -> f64 {
        self.importance + self.coherence + self.freshness + self.nonmonotonousness
    }
}

/// Final standing of a single seat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub class_name: String,
    pub alias: String,
    pub total: f64,
    pub shared: f64,
    pub individual: f64,
    /// 1-based rank by total score; ties share the best rank
    pub rank: u32,
}

/// Outcome of one simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunResult {
    pub config: SimulationConfig,
    pub total_score: f64,
    pub score_breakdown: ScoreBreakdown,
    /// Per-seat metrics keyed by seat label (e.g. `p10_3`)
    pub player_metrics: BTreeMap<String, PlayerMetrics>,
    pub player10_total_mean: Option<f64>,
    pub player10_individual_mean: Option<f64>,
    pub player10_rank_mean: Option<f64>,
    pub player10_gap_to_best: Option<f64>,
    pub player10_instances: u32,
    pub best_total_score: f64,
    /// Number of turns actually played
    pub conversation_length: u32,
    pub early_termination: bool,
    pub pause_count: u32,
    pub unique_items_used: u32,
    /// Wall-clock seconds spent in the engine
    pub execution_time: f64,
}

/// Describes the experiment that produced a results file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsMetadata {
    pub run_name: String,
    pub created_at: jiff::Timestamp,
    pub parameter_grid: ParameterGrid,
    /// Repetitions per configuration
    pub simulations: usize,
    pub total_configurations: usize,
    pub total_runs: usize,
    pub parallel: bool,
    pub base_seed: u64,
    pub engine: String,
}

/// Everything a single `run` invocation writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultsMetadata>,
    pub results: Vec<RunResult>,
}

/// Structural checks of a results file against its declared grid
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub declared_configurations: usize,
    pub expected_runs: usize,
    pub actual_runs: usize,
    /// Indices of records whose parameters are not in the declared grid
    pub out_of_grid: Vec<usize>,
    /// Configuration indices whose record count differs from `simulations`
    pub uneven_configurations: Vec<usize>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.expected_runs == self.actual_runs
            && self.out_of_grid.is_empty()
            && self.uneven_configurations.is_empty()
    }
}

impl ResultsFile {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Name of the experiment, if metadata is present
    pub fn run_name(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.run_name.as_str())
    }

    /// Check record counts and grid membership.
    ///
    /// Returns `None` for legacy files without metadata, since there is no
    /// declared grid to compare against.
    pub fn validate(&self) -> Option<ValidationReport> {
        let metadata = self.metadata.as_ref()?;
        let grid = &metadata.parameter_grid;
        let declared = grid.total_configurations();
        let mut counts = vec![0usize; declared];
        let mut out_of_grid = Vec::new();

        for (i, record) in self.results.iter().enumerate() {
            match grid.index_of(&record.config) {
                Some(index) => counts[index] += 1,
                None => out_of_grid.push(i),
            }
        }

        let uneven_configurations = counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count != metadata.simulations)
            .map(|(index, _)| index)
            .collect();

        Some(ValidationReport {
            declared_configurations: declared,
            expected_runs: declared * metadata.simulations,
            actual_runs: self.results.len(),
            out_of_grid,
            uneven_configurations,
        })
    }
}
