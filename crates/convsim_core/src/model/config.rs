//! Per-run simulation configuration
//!
//! A `SimulationConfig` is one point of the experiment grid plus the seed of
//! the repetition that used it. It is embedded in every persisted run record.

use serde::{Deserialize, Serialize};

use super::roster::Roster;
use crate::error::EngineError;

/// Everything the engine needs to play one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Probability that Player10 optimises the shared score on a turn
    pub altruism_prob: f64,
    /// Margin over the baseline required before Player10 speaks
    pub tau_margin: f64,
    /// Freshness relaxation right after a pause
    pub epsilon_fresh: f64,
    /// Extra margin demanded from monotonous candidates
    pub epsilon_mono: f64,
    /// Observations needed before another player's estimate counts
    pub min_samples_pid: u32,
    /// Smoothing factor of the per-player quality estimates
    pub ewma_alpha: f64,
    pub importance_weight: f64,
    pub coherence_weight: f64,
    pub freshness_weight: f64,
    pub monotony_weight: f64,
    pub players: Roster,
    pub subjects: u32,
    pub memory_size: u32,
    pub conversation_length: u32,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            altruism_prob: 0.5,
            tau_margin: 0.05,
            epsilon_fresh: 0.05,
            epsilon_mono: 0.05,
            min_samples_pid: 3,
            ewma_alpha: 0.1,
            importance_weight: 1.0,
            coherence_weight: 1.0,
            freshness_weight: 1.0,
            monotony_weight: 1.0,
            players: Roster::self_play(10),
            subjects: 20,
            memory_size: 10,
            conversation_length: 50,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Cheap structural checks run by the engine before playing
    pub fn check(&self) -> Result<(), EngineError> {
        self.players.validate()?;
        if self.subjects == 0 {
            return Err(EngineError::InvalidConfig("subjects must be > 0".into()));
        }
        if self.conversation_length == 0 {
            return Err(EngineError::InvalidConfig(
                "conversation_length must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.altruism_prob) {
            return Err(EngineError::InvalidConfig(format!(
                "altruism_prob {} outside [0, 1]",
                self.altruism_prob
            )));
        }
        Ok(())
    }

    /// Player10 component weights in breakdown order
    pub fn weights(&self) -> [f64; 4] {
        [
            self.importance_weight,
            self.coherence_weight,
            self.freshness_weight,
            self.monotony_weight,
        ]
    }
}
