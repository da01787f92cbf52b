//! The strategic player under study.
//!
//! Each turn Player10 flips a coin with `altruism_prob` to decide whether it
//! plays for the shared score alone or adds its own preference bonus. It keeps
//! an exponentially weighted estimate of how good the other players'
//! contributions are and, when altruistic, only speaks if its best item beats
//! that baseline by `tau_margin`.

use rand::Rng;
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;

use super::items::{Item, individual_bonus};
use super::players::{Player, TurnView};
use super::scoring;
use crate::model::SimulationConfig;

/// Pauses in a row after which Player10 always speaks
const FORCED_SPEECH_AFTER: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player10Params {
    pub altruism_prob: f64,
    pub tau_margin: f64,
    pub epsilon_fresh: f64,
    pub epsilon_mono: f64,
    pub min_samples: u32,
    pub ewma_alpha: f64,
    pub weights: [f64; 4],
}

impl From<&SimulationConfig> for Player10Params {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            altruism_prob: config.altruism_prob.clamp(0.0, 1.0),
            tau_margin: config.tau_margin,
            epsilon_fresh: config.epsilon_fresh,
            epsilon_mono: config.epsilon_mono,
            min_samples: config.min_samples_pid,
            ewma_alpha: config.ewma_alpha,
            weights: config.weights(),
        }
    }
}

/// EWMA of one speaker's contribution quality
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityEstimate {
    pub value: f64,
    pub samples: u32,
}

impl QualityEstimate {
    pub fn update(&mut self, observed: f64, alpha: f64) {
        self.value = if self.samples == 0 {
            observed
        } else {
            alpha * observed + (1.0 - alpha) * self.value
        };
        self.samples += 1;
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    shared: f64,
    individual: f64,
    monotonous: bool,
}

#[derive(Debug)]
pub struct Player10 {
    seat: usize,
    params: Player10Params,
    preferences: Vec<f64>,
    estimates: FxHashMap<usize, QualityEstimate>,
}

impl Player10 {
    pub fn new(seat: usize, config: &SimulationConfig, preferences: Vec<f64>) -> Self {
        Self::with_params(seat, Player10Params::from(config), preferences)
    }

    pub fn with_params(seat: usize, params: Player10Params, preferences: Vec<f64>) -> Self {
        Self {
            seat,
            params,
            preferences,
            estimates: FxHashMap::default(),
        }
    }

    pub fn estimate(&self, speaker: usize) -> Option<QualityEstimate> {
        self.estimates.get(&speaker).copied()
    }

    /// Mean estimate over speakers observed at least `min_samples` times
    pub fn baseline(&self) -> f64 {
        let (sum, count) = self
            .estimates
            .values()
            .filter(|e| e.samples >= self.params.min_samples)
            .fold((0.0, 0usize), |(sum, count), e| (sum + e.value, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    fn evaluate(&self, history: &[Option<Item>], index: usize, item: &Item) -> Candidate {
        let score = scoring::prospective(history, item);
        let [w_imp, w_coh, w_fresh, w_mono] = self.params.weights;
        let shared = w_imp * score.importance
            + w_coh * score.coherence
            + w_fresh * score.freshness * (1.0 + self.params.epsilon_fresh)
            + w_mono * score.nonmonotony;
        Candidate {
            index,
            shared,
            individual: individual_bonus(&self.preferences, item),
            monotonous: score.nonmonotony < 0.0,
        }
    }
}

impl Player for Player10 {
    fn propose(&mut self, view: &TurnView<'_>, memory: &[Item], rng: &mut SmallRng) -> Option<usize> {
        if memory.is_empty() {
            return None;
        }
        let altruistic = rng.random_bool(self.params.altruism_prob);
        let objective = |c: &Candidate| {
            if altruistic {
                c.shared
            } else {
                c.shared + c.individual
            }
        };

        let best = memory
            .iter()
            .enumerate()
            .map(|(i, item)| self.evaluate(view.history, i, item))
            .max_by(|a, b| objective(a).total_cmp(&objective(b)))?;

        if view.trailing_pauses() >= FORCED_SPEECH_AFTER {
            return Some(best.index);
        }

        if altruistic {
            let mut bar = self.baseline() + self.params.tau_margin;
            if view.last_was_pause() {
                bar -= self.params.epsilon_fresh;
            }
            if best.monotonous {
                bar += self.params.epsilon_mono;
            }
            (best.shared >= bar).then_some(best.index)
        } else {
            (objective(&best) > self.params.tau_margin).then_some(best.index)
        }
    }

    fn observe(&mut self, view: &TurnView<'_>, speaker: usize, item: &Item) {
        if speaker == self.seat {
            return;
        }
        let quality = scoring::prospective(view.history, item).shared();
        self.estimates
            .entry(speaker)
            .or_default()
            .update(quality, self.params.ewma_alpha);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn params(altruism_prob: f64) -> Player10Params {
        Player10Params {
            altruism_prob,
            tau_margin: 0.05,
            epsilon_fresh: 0.05,
            epsilon_mono: 0.05,
            min_samples: 2,
            ewma_alpha: 0.5,
            weights: [1.0; 4],
        }
    }

    fn item(id: u32, importance: f64, subjects: &[u32]) -> Item {
        Item {
            id,
            owner: 0,
            importance,
            subjects: subjects.to_vec(),
        }
    }

    fn view<'a>(history: &'a [Option<Item>]) -> TurnView<'a> {
        TurnView {
            turn: history.len(),
            history,
            speakers: &[],
            contributions: &[],
        }
    }

    #[test]
    fn first_observation_seeds_the_average() {
        let mut estimate = QualityEstimate::default();
        estimate.update(2.0, 0.1);
        assert_eq!(estimate.value, 2.0);
        estimate.update(0.0, 0.5);
        assert_eq!(estimate.value, 1.0);
        assert_eq!(estimate.samples, 2);
    }

    #[test]
    fn baseline_ignores_thin_estimates() {
        let mut p = Player10::with_params(0, params(1.0), vec![1.0]);
        let said = item(0, 0.8, &[0]);
        p.observe(&view(&[]), 1, &said);
        assert_eq!(p.baseline(), 0.0);
        p.observe(&view(&[]), 1, &said);
        assert!((p.baseline() - 0.8).abs() < 1e-12);

        // own contributions are not tracked
        p.observe(&view(&[]), 0, &said);
        assert_eq!(p.estimate(0), None);
    }

    #[test]
    fn altruist_stays_silent_below_the_bar() {
        let mut p = Player10::with_params(0, params(1.0), vec![1.0, 0.5]);
        let strong = item(0, 0.9, &[0]);
        p.observe(&view(&[]), 1, &strong);
        p.observe(&view(&[]), 1, &strong);

        let mut rng = SmallRng::seed_from_u64(5);
        let weak = vec![item(1, 0.3, &[1])];
        assert_eq!(p.propose(&view(&[]), &weak, &mut rng), None);
        let good = vec![item(1, 0.3, &[1]), item(2, 0.99, &[0])];
        assert_eq!(p.propose(&view(&[]), &good, &mut rng), Some(1));
    }

    #[test]
    fn selfish_player_counts_its_bonus() {
        let mut p = Player10::with_params(0, params(0.0), vec![1.0, 0.0]);
        let memory = vec![item(0, 0.6, &[1]), item(1, 0.4, &[0])];
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(p.propose(&view(&[]), &memory, &mut rng), Some(1));
    }

    #[test]
    fn two_pauses_force_speech() {
        let mut p = Player10::with_params(0, params(1.0), vec![1.0]);
        let strong = item(0, 5.0, &[0]);
        p.observe(&view(&[]), 1, &strong);
        p.observe(&view(&[]), 1, &strong);

        let history = vec![None, None];
        let memory = vec![item(1, 0.01, &[0])];
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(p.propose(&view(&history), &memory, &mut rng), Some(0));
        assert_eq!(p.propose(&view(&history[..1]), &memory, &mut rng), None);
    }
}
