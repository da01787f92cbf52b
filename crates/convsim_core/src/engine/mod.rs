//! Simulation engines.
//!
//! The runner only talks to [`Simulator`]; [`ConversationEngine`] is the
//! bundled reference implementation of the conversation game.

mod conversation;
mod items;
mod player10;
mod players;
mod scoring;

pub use conversation::{ConversationEngine, MAX_CONSECUTIVE_PAUSES, Transcript, play, select_speaker};
pub use items::{Item, deal_items, individual_bonus, random_preferences};
pub use player10::{Player10, Player10Params, QualityEstimate};
pub use players::{CoherentPlayer, GreedyPlayer, PausePlayer, Player, RandomPlayer, TurnView, build_player};
pub use scoring::{ItemScore, prospective, score_conversation, score_item};

use crate::error::EngineError;
use crate::model::{RunResult, SimulationConfig};

/// Plays one match for a configuration.
///
/// Implementations must be deterministic for a given `(config, seed)` apart
/// from `execution_time`, and safe to call from several threads at once.
pub trait Simulator: Sync {
    /// Engine identifier recorded in the results metadata
    fn name(&self) -> &str;

    fn simulate(&self, config: &SimulationConfig, seed: u64) -> Result<RunResult, EngineError>;
}

impl<S: Simulator + ?Sized> Simulator for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn simulate(&self, config: &SimulationConfig, seed: u64) -> Result<RunResult, EngineError> {
        (**self).simulate(config, seed)
    }
}
