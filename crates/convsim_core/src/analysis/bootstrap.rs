//! Bootstrap confidence intervals of group means.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;

use super::stats::{mean, quantile_sorted};
use super::table::{Cell, ResultsTable};
use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceInterval {
    pub key: Vec<Cell>,
    /// Sample mean of the group
    pub mean: f64,
    pub low: f64,
    pub high: f64,
    /// Non-null observations
    pub n: usize,
}

/// Percentile bootstrap of the mean of `metric` within each group.
///
/// Groups without observations are skipped. The same seed reproduces the same
/// intervals.
pub fn bootstrap_ci(
    table: &ResultsTable,
    group_cols: &[&str],
    metric: &str,
    iterations: usize,
    confidence: f64,
    seed: u64,
) -> Result<Vec<ConfidenceInterval>, AnalysisError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(AnalysisError::InvalidConfidence(confidence));
    }
    if iterations == 0 {
        return Err(AnalysisError::ZeroIterations);
    }
    let alpha = (1.0 - confidence) / 2.0;
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut intervals = Vec::new();
    for group in table.group_by(group_cols)? {
        let values = table.values_at(metric, &group.rows)?;
        if values.is_empty() {
            continue;
        }
        let mut sample = vec![0.0; values.len()];
        let mut boot: Vec<f64> = (0..iterations)
            .map(|_| {
                for slot in &mut sample {
                    *slot = values.choose(&mut rng).copied().unwrap_or(f64::NAN);
                }
                mean(&sample)
            })
            .collect();
        boot.sort_by(f64::total_cmp);
        intervals.push(ConfidenceInterval {
            key: group.key,
            mean: mean(&values),
            low: quantile_sorted(&boot, alpha),
            high: quantile_sorted(&boot, 1.0 - alpha),
            n: values.len(),
        });
    }
    Ok(intervals)
}
