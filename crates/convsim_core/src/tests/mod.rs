//! Integration tests for the experiment library
//!
//! Tests are organized by topic:
//! - `experiment` - Grid expansion, run counts and seeding through the runner
//! - `engine` - Reference engine invariants across many seeds
//! - `results` - Results files on disk, validation and grouped analysis

mod experiment;

use crate::engine::Simulator;
use crate::error::EngineError;
use crate::grid::ParameterGrid;
use crate::model::{Archetype, Roster, RunResult, ScoreBreakdown, SimulationConfig};
use crate::runner::ExperimentPlan;

/// Cheap simulator that echoes its inputs into the record
pub(crate) struct EchoSimulator;

impl Simulator for EchoSimulator {
    fn name(&self) -> &str {
        "echo"
    }

    fn simulate(&self, config: &SimulationConfig, seed: u64) -> Result<RunResult, EngineError> {
        let importance = (seed % 1000) as f64 / 1000.0;
        let breakdown = ScoreBreakdown {
            importance,
            coherence: config.altruism_prob,
            total: importance + config.altruism_prob,
            ..Default::default()
        };
        Ok(RunResult {
            config: SimulationConfig {
                seed,
                ..config.clone()
            },
            total_score: breakdown.total,
            score_breakdown: breakdown,
            player10_total_mean: Some(breakdown.total),
            player10_instances: config.players.count(Archetype::Player10),
            conversation_length: config.conversation_length,
            ..Default::default()
        })
    }
}

/// Simulator that fails on one configuration
pub(crate) struct FailingSimulator {
    pub altruism: f64,
}

impl Simulator for FailingSimulator {
    fn name(&self) -> &str {
        "failing"
    }

    fn simulate(&self, config: &SimulationConfig, seed: u64) -> Result<RunResult, EngineError> {
        if config.altruism_prob == self.altruism {
            return Err(EngineError::InvalidConfig("boom".into()));
        }
        EchoSimulator.simulate(config, seed)
    }
}

/// The self-play sweep: 4 x 3 x 3 x 3 x 2 x 2 x 2 = 864 configurations
pub(crate) fn selfplay_grid() -> ParameterGrid {
    ParameterGrid {
        altruism_prob: vec![0.0, 0.25, 0.5, 0.75],
        tau_margin: vec![0.02, 0.05, 0.1],
        epsilon_fresh: vec![0.02, 0.05, 0.1],
        epsilon_mono: vec![0.02, 0.05, 0.1],
        min_samples_pid: vec![2, 4],
        coherence_weight: vec![1.0, 1.5],
        monotony_weight: vec![1.0, 1.5],
        players: vec![Roster::self_play(10)],
        ..Default::default()
    }
}

pub(crate) fn selfplay_plan(simulations: usize) -> ExperimentPlan {
    ExperimentPlan {
        simulations,
        ..ExperimentPlan::new("exp_selfplay_grid", selfplay_grid())
    }
}
