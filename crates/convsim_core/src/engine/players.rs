//! Player archetypes and the view they get of the match.

use rand::Rng;
use rand::rngs::SmallRng;

use super::items::Item;
use super::player10::Player10;
use super::scoring::{self, COHERENCE_WINDOW};
use crate::model::{Archetype, SimulationConfig};

/// Read-only state of the match at the start of a turn
#[derive(Debug, Clone, Copy)]
pub struct TurnView<'a> {
    pub turn: usize,
    /// Items said so far, `None` for pauses
    pub history: &'a [Option<Item>],
    /// Speaker of each turn, `None` for pauses
    pub speakers: &'a [Option<usize>],
    /// Items said per seat
    pub contributions: &'a [u32],
}

impl TurnView<'_> {
    pub fn trailing_pauses(&self) -> usize {
        self.history.iter().rev().take_while(|t| t.is_none()).count()
    }

    pub fn last_was_pause(&self) -> bool {
        matches!(self.history.last(), Some(None))
    }

    pub fn previous_speaker(&self) -> Option<usize> {
        self.speakers.last().copied().flatten()
    }
}

/// A seat at the table.
///
/// `propose` returns an index into `memory`, or `None` to stay silent.
pub trait Player {
    fn propose(&mut self, view: &TurnView<'_>, memory: &[Item], rng: &mut SmallRng) -> Option<usize>;

    /// Called after every spoken turn, including the player's own.
    fn observe(&mut self, _view: &TurnView<'_>, _speaker: usize, _item: &Item) {}
}

/// Proposes a random item half of the time
#[derive(Debug, Default)]
pub struct RandomPlayer;

impl Player for RandomPlayer {
    fn propose(&mut self, _view: &TurnView<'_>, memory: &[Item], rng: &mut SmallRng) -> Option<usize> {
        if memory.is_empty() || !rng.random_bool(0.5) {
            return None;
        }
        Some(rng.random_range(0..memory.len()))
    }
}

/// Never speaks
#[derive(Debug, Default)]
pub struct PausePlayer;

impl Player for PausePlayer {
    fn propose(&mut self, _view: &TurnView<'_>, _memory: &[Item], _rng: &mut SmallRng) -> Option<usize> {
        None
    }
}

/// Always proposes its most important item
#[derive(Debug, Default)]
pub struct GreedyPlayer;

impl Player for GreedyPlayer {
    fn propose(&mut self, _view: &TurnView<'_>, memory: &[Item], _rng: &mut SmallRng) -> Option<usize> {
        most_important(memory)
    }
}

/// Stays on topic.
///
/// Without context (start of the match or right after a pause) it behaves
/// greedily; otherwise it proposes its most coherent item unless every item
/// would break the topic.
#[derive(Debug, Default)]
pub struct CoherentPlayer;

impl Player for CoherentPlayer {
    fn propose(&mut self, view: &TurnView<'_>, memory: &[Item], _rng: &mut SmallRng) -> Option<usize> {
        let context = scoring::preceding_subjects(view.history, view.history.len(), COHERENCE_WINDOW);
        if context.is_empty() {
            return most_important(memory);
        }
        let (index, coherence) = memory
            .iter()
            .enumerate()
            .map(|(i, item)| (i, scoring::coherence(item, &context), item.importance))
            .max_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)))
            .map(|(i, coherence, _)| (i, coherence))?;
        (coherence >= 0.0).then_some(index)
    }
}

fn most_important(memory: &[Item]) -> Option<usize> {
    memory
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.importance.total_cmp(&b.1.importance))
        .map(|(i, _)| i)
}

/// Build the player for one seat
pub fn build_player(
    archetype: Archetype,
    seat: usize,
    config: &SimulationConfig,
    preferences: &[f64],
) -> Box<dyn Player> {
    match archetype {
        Archetype::Player10 => Box::new(Player10::new(seat, config, preferences.to_vec())),
        Archetype::Random => Box::new(RandomPlayer),
        Archetype::Pause => Box::new(PausePlayer),
        Archetype::Greedy => Box::new(GreedyPlayer),
        Archetype::Coherent => Box::new(CoherentPlayer),
    }
}
