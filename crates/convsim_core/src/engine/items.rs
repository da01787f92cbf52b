//! Conversation items and per-seat preferences

use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::{Beta, Distribution};

/// Something a player can say
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    /// Seat that owns the item
    pub owner: usize,
    pub importance: f64,
    /// One or two distinct subject ids
    pub subjects: Vec<u32>,
}

impl Item {
    pub fn mentions(&self, subject: u32) -> bool {
        self.subjects.contains(&subject)
    }
}

/// Deal `memory_size` items to each of `seats` players.
///
/// Item ids are unique across the whole match.
pub fn deal_items(
    seats: usize,
    memory_size: u32,
    subjects: u32,
    importance: &Beta<f64>,
    rng: &mut SmallRng,
) -> Vec<Vec<Item>> {
    let mut next_id = 0u32;
    (0..seats)
        .map(|owner| {
            (0..memory_size)
                .map(|_| {
                    let id = next_id;
                    next_id += 1;
                    Item {
                        id,
                        owner,
                        importance: importance.sample(rng),
                        subjects: draw_subjects(subjects, rng),
                    }
                })
                .collect()
        })
        .collect()
}

fn draw_subjects(subjects: u32, rng: &mut SmallRng) -> Vec<u32> {
    let first = rng.random_range(0..subjects);
    if subjects < 2 || rng.random_bool(0.5) {
        return vec![first];
    }
    let mut second = rng.random_range(0..subjects - 1);
    if second >= first {
        second += 1;
    }
    vec![first, second]
}

/// Random preference ranking turned into a per-subject bonus in (0, 1]
pub fn random_preferences(subjects: u32, rng: &mut SmallRng) -> Vec<f64> {
    let mut order: Vec<u32> = (0..subjects).collect();
    order.shuffle(rng);
    let mut bonus = vec![0.0; subjects as usize];
    for (rank, subject) in order.into_iter().enumerate() {
        bonus[subject as usize] = 1.0 - rank as f64 / f64::from(subjects);
    }
    bonus
}

/// Mean preference bonus of an item's subjects
pub fn individual_bonus(preferences: &[f64], item: &Item) -> f64 {
    if item.subjects.is_empty() {
        return 0.0;
    }
    let sum: f64 = item
        .subjects
        .iter()
        .map(|&s| preferences.get(s as usize).copied().unwrap_or(0.0))
        .sum();
    sum / item.subjects.len() as f64
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn beta() -> Beta<f64> {
        Beta::new(2.0, 2.0).unwrap()
    }

    #[test]
    fn dealt_items_are_unique_and_in_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        let memories = deal_items(4, 6, 5, &beta(), &mut rng);
        assert_eq!(memories.len(), 4);
        let mut ids: Vec<u32> = memories.iter().flatten().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 24);
        for (owner, memory) in memories.iter().enumerate() {
            for item in memory {
                assert_eq!(item.owner, owner);
                assert!((0.0..=1.0).contains(&item.importance));
                assert!(!item.subjects.is_empty() && item.subjects.len() <= 2);
                assert!(item.subjects.iter().all(|&s| s < 5));
                if let [a, b] = item.subjects[..] {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn single_subject_pool_never_pairs() {
        let mut rng = SmallRng::seed_from_u64(1);
        let memories = deal_items(2, 20, 1, &beta(), &mut rng);
        assert!(memories.iter().flatten().all(|i| i.subjects == vec![0]));
    }

    #[test]
    fn preferences_form_a_ranking() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut prefs = random_preferences(4, &mut rng);
        prefs.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(prefs, vec![1.0, 0.75, 0.5, 0.25]);
    }

    #[test]
    fn bonus_averages_subjects() {
        let item = Item {
            id: 0,
            owner: 0,
            importance: 0.5,
            subjects: vec![0, 2],
        };
        assert!((individual_bonus(&[1.0, 0.0, 0.5], &item) - 0.75).abs() < 1e-12);
    }
}
