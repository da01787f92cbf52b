//! Shared-score components.
//!
//! A conversation is a sequence of turns, each either an item or a pause
//! (`None`). The same functions score an item already in the history (final
//! scoring, with lookahead) and a candidate about to be appended at
//! `history.len()` (prospective scoring, no lookahead).

use rustc_hash::FxHashSet;

use super::items::Item;
use crate::model::ScoreBreakdown;

/// Items on each side considered for coherence
pub const COHERENCE_WINDOW: usize = 3;
/// Items before a pause considered for freshness
pub const FRESHNESS_WINDOW: usize = 5;
/// Consecutive previous items checked for monotony
pub const MONOTONY_WINDOW: usize = 3;

/// Component scores of a single item
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemScore {
    pub importance: f64,
    pub coherence: f64,
    pub freshness: f64,
    pub nonmonotony: f64,
}

impl ItemScore {
    pub fn shared(&self) -> f64 {
        self.importance + self.coherence + self.freshness + self.nonmonotony
    }

    /// Weighted estimate in breakdown order
    pub fn weighted(&self, weights: [f64; 4]) -> f64 {
        weights[0] * self.importance
            + weights[1] * self.coherence
            + weights[2] * self.freshness
            + weights[3] * self.nonmonotony
    }
}

/// Subjects of up to `depth` items before `pos`, stopping at a pause
pub fn preceding_subjects(history: &[Option<Item>], pos: usize, depth: usize) -> FxHashSet<u32> {
    let mut subjects = FxHashSet::default();
    for turn in history[..pos.min(history.len())].iter().rev().take(depth) {
        match turn {
            Some(item) => subjects.extend(item.subjects.iter().copied()),
            None => break,
        }
    }
    subjects
}

/// Subjects of up to `depth` items after `pos`, stopping at a pause
pub fn following_subjects(history: &[Option<Item>], pos: usize, depth: usize) -> FxHashSet<u32> {
    let mut subjects = FxHashSet::default();
    let start = (pos + 1).min(history.len());
    for turn in history[start..].iter().take(depth) {
        match turn {
            Some(item) => subjects.extend(item.subjects.iter().copied()),
            None => break,
        }
    }
    subjects
}

/// +1 if every subject is in context, -1 if none is, 0 otherwise or when the
/// context is empty
pub fn coherence(item: &Item, context: &FxHashSet<u32>) -> f64 {
    if context.is_empty() || item.subjects.is_empty() {
        return 0.0;
    }
    let hits = item.subjects.iter().filter(|s| context.contains(s)).count();
    if hits == item.subjects.len() {
        1.0
    } else if hits == 0 {
        -1.0
    } else {
        0.0
    }
}

/// +1 per subject not mentioned shortly before a directly preceding pause
pub fn freshness(history: &[Option<Item>], pos: usize, item: &Item) -> f64 {
    if pos == 0 || pos > history.len() || history[pos - 1].is_some() {
        return 0.0;
    }
    let pause = pos - 1;
    let recent: FxHashSet<u32> = history[pause.saturating_sub(FRESHNESS_WINDOW)..pause]
        .iter()
        .flatten()
        .flat_map(|prev| prev.subjects.iter().copied())
        .collect();
    item.subjects.iter().filter(|s| !recent.contains(s)).count() as f64
}

/// -1 when the previous turns are all items that already cover every subject
pub fn nonmonotony(history: &[Option<Item>], pos: usize, item: &Item) -> f64 {
    if pos < MONOTONY_WINDOW || pos > history.len() {
        return 0.0;
    }
    let repeated = history[pos - MONOTONY_WINDOW..pos].iter().all(|turn| {
        matches!(turn, Some(prev) if item.subjects.iter().all(|&s| prev.mentions(s)))
    });
    if repeated { -1.0 } else { 0.0 }
}

/// Score `item` as if it were said at `pos`
pub fn score_item(history: &[Option<Item>], pos: usize, item: &Item, lookahead: bool) -> ItemScore {
    let mut context = preceding_subjects(history, pos, COHERENCE_WINDOW);
    if lookahead {
        context.extend(following_subjects(history, pos, COHERENCE_WINDOW));
    }
    ItemScore {
        importance: item.importance,
        coherence: coherence(item, &context),
        freshness: freshness(history, pos, item),
        nonmonotony: nonmonotony(history, pos, item),
    }
}

/// Score a candidate about to be appended to the history
pub fn prospective(history: &[Option<Item>], item: &Item) -> ItemScore {
    score_item(history, history.len(), item, false)
}

/// Final shared score of a finished conversation
pub fn score_conversation(history: &[Option<Item>]) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown::default();
    for (pos, turn) in history.iter().enumerate() {
        let Some(item) = turn else { continue };
        let score = score_item(history, pos, item, true);
        breakdown.importance += score.importance;
        breakdown.coherence += score.coherence;
        breakdown.freshness += score.freshness;
        breakdown.nonmonotonousness += score.nonmonotony;
    }
    breakdown.total = breakdown.component_sum();
    breakdown
}
