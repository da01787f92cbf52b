//! Reference conversation engine.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Beta;

use super::Simulator;
use super::items::{Item, deal_items, individual_bonus, random_preferences};
use super::players::{Player, TurnView, build_player};
use super::scoring::score_conversation;
use crate::error::EngineError;
use crate::model::{Archetype, PlayerMetrics, RunResult, SimulationConfig};

/// Pauses in a row that end the conversation
pub const MAX_CONSECUTIVE_PAUSES: usize = 3;

/// Shape parameters of the item importance distribution
const IMPORTANCE_ALPHA: f64 = 2.0;
const IMPORTANCE_BETA: f64 = 2.0;

/// Turn-based conversation game.
///
/// Every seat is dealt `memory_size` items. On each turn every player may
/// propose one of its remaining items; if nobody does the turn is a pause.
/// The previous speaker keeps the floor when it proposes again, otherwise the
/// proposer who has spoken least wins (ties broken at random).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationEngine;

impl ConversationEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Raw outcome of one match, before scoring
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub history: Vec<Option<Item>>,
    pub speakers: Vec<Option<usize>>,
    pub pause_count: u32,
    pub early_termination: bool,
}

impl Simulator for ConversationEngine {
    fn name(&self) -> &str {
        "conversation"
    }

    fn simulate(&self, config: &SimulationConfig, seed: u64) -> Result<RunResult, EngineError> {
        let start = Instant::now();
        config.check()?;

        let seats = config.players.seats()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let importance = Beta::new(IMPORTANCE_ALPHA, IMPORTANCE_BETA)
            .map_err(|e| EngineError::InvalidConfig(format!("importance distribution: {e}")))?;

        let preferences: Vec<Vec<f64>> = seats
            .iter()
            .map(|_| random_preferences(config.subjects, &mut rng))
            .collect();
        let mut memories = deal_items(seats.len(), config.memory_size, config.subjects, &importance, &mut rng);
        let mut players: Vec<Box<dyn Player>> = seats
            .iter()
            .enumerate()
            .map(|(seat, &archetype)| build_player(archetype, seat, config, &preferences[seat]))
            .collect();

        let transcript = play(&mut players, &mut memories, config.conversation_length as usize, &mut rng);
        let mut result = score(config, seed, &seats, &preferences, &transcript);
        result.execution_time = start.elapsed().as_secs_f64();
        Ok(result)
    }
}

/// Run the turn loop until the length is reached or the table falls silent
pub fn play(
    players: &mut [Box<dyn Player>],
    memories: &mut [Vec<Item>],
    length: usize,
    rng: &mut SmallRng,
) -> Transcript {
    let mut transcript = Transcript {
        history: Vec::with_capacity(length),
        speakers: Vec::with_capacity(length),
        ..Default::default()
    };
    let mut contributions = vec![0u32; players.len()];
    let mut silent_turns = 0;

    for turn in 0..length {
        let view = TurnView {
            turn,
            history: &transcript.history,
            speakers: &transcript.speakers,
            contributions: &contributions,
        };
        let proposals: Vec<(usize, usize)> = players
            .iter_mut()
            .enumerate()
            .filter_map(|(seat, player)| {
                let memory = &memories[seat];
                player
                    .propose(&view, memory, rng)
                    .filter(|&index| index < memory.len())
                    .map(|index| (seat, index))
            })
            .collect();

        let Some((seat, index)) = select_speaker(&proposals, view.previous_speaker(), &contributions, rng)
        else {
            transcript.history.push(None);
            transcript.speakers.push(None);
            transcript.pause_count += 1;
            silent_turns += 1;
            if silent_turns >= MAX_CONSECUTIVE_PAUSES {
                transcript.early_termination = turn + 1 < length;
                break;
            }
            continue;
        };
        silent_turns = 0;

        let item = memories[seat].remove(index);
        for player in players.iter_mut() {
            player.observe(&view, seat, &item);
        }
        transcript.history.push(Some(item));
        transcript.speakers.push(Some(seat));
        contributions[seat] += 1;
    }

    transcript
}

/// Pick the speaker among the proposals
pub fn select_speaker(
    proposals: &[(usize, usize)],
    previous: Option<usize>,
    contributions: &[u32],
    rng: &mut SmallRng,
) -> Option<(usize, usize)> {
    if let Some(kept) = previous.and_then(|p| proposals.iter().find(|(seat, _)| *seat == p)) {
        return Some(*kept);
    }
    let fewest = proposals.iter().map(|(seat, _)| contributions[*seat]).min()?;
    let tied: Vec<&(usize, usize)> = proposals
        .iter()
        .filter(|(seat, _)| contributions[*seat] == fewest)
        .collect();
    Some(*tied[rng.random_range(0..tied.len())])
}

fn score(
    config: &SimulationConfig,
    seed: u64,
    seats: &[Archetype],
    preferences: &[Vec<f64>],
    transcript: &Transcript,
) -> RunResult {
    let breakdown = score_conversation(&transcript.history);

    let mut individual = vec![0.0; seats.len()];
    for item in transcript.history.iter().flatten() {
        for (seat, bonus) in individual.iter_mut().enumerate() {
            *bonus += individual_bonus(&preferences[seat], item);
        }
    }
    let totals: Vec<f64> = individual.iter().map(|i| breakdown.total + i).collect();
    let best_total_score = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut player_metrics = BTreeMap::new();
    let mut per_code: BTreeMap<&str, usize> = BTreeMap::new();
    let mut p10 = Vec::new();
    for (seat, archetype) in seats.iter().enumerate() {
        let ordinal = per_code.entry(archetype.code()).or_default();
        *ordinal += 1;
        let rank = 1 + totals.iter().filter(|&&t| t > totals[seat]).count() as u32;
        let metrics = PlayerMetrics {
            class_name: archetype.class_name().to_string(),
            alias: archetype.code().to_string(),
            total: totals[seat],
            shared: breakdown.total,
            individual: individual[seat],
            rank,
        };
        if *archetype == Archetype::Player10 {
            p10.push((metrics.total, metrics.individual, f64::from(rank)));
        }
        player_metrics.insert(format!("{}_{}", archetype.code(), ordinal), metrics);
    }

    let p10_mean = |pick: fn(&(f64, f64, f64)) -> f64| {
        (!p10.is_empty()).then(|| p10.iter().map(pick).sum::<f64>() / p10.len() as f64)
    };
    let player10_total_mean = p10_mean(|m| m.0);

    RunResult {
        config: SimulationConfig {
            seed,
            ..config.clone()
        },
        total_score: breakdown.total,
        score_breakdown: breakdown,
        player_metrics,
        player10_total_mean,
        player10_individual_mean: p10_mean(|m| m.1),
        player10_rank_mean: p10_mean(|m| m.2),
        player10_gap_to_best: player10_total_mean.map(|mean| best_total_score - mean),
        player10_instances: p10.len() as u32,
        best_total_score,
        conversation_length: transcript.history.len() as u32,
        early_termination: transcript.early_termination,
        pause_count: transcript.pause_count,
        unique_items_used: transcript.history.iter().flatten().count() as u32,
        execution_time: 0.0,
    }
}
