//! Effect sizes between levels of one parameter.

use super::stats::{mean, variance};
use super::table::{Cell, ResultsTable};
use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseDelta {
    pub a: Cell,
    pub b: Cell,
    /// `mean(b) - mean(a)`
    pub delta_mean: f64,
    /// `NaN` when the pooled standard deviation is zero or undefined
    pub cohens_d: f64,
    pub n_a: usize,
    pub n_b: usize,
}

/// Mean difference and Cohen's d for every pair of levels `a < b`
pub fn pairwise_deltas(
    table: &ResultsTable,
    group_col: &str,
    metric: &str,
) -> Result<Vec<PairwiseDelta>, AnalysisError> {
    let levels: Vec<(Cell, Vec<f64>)> = table
        .group_by(&[group_col])?
        .into_iter()
        .map(|group| {
            let values = table.values_at(metric, &group.rows)?;
            let level = group.key.into_iter().next().unwrap_or(Cell::Null);
            Ok((level, values))
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let mut deltas = Vec::new();
    for (i, (a, x)) in levels.iter().enumerate() {
        for (b, y) in &levels[i + 1..] {
            let delta_mean = mean(y) - mean(x);
            let (nx, ny) = (x.len() as f64, y.len() as f64);
            let pooled = (((nx - 1.0) * variance(x) + (ny - 1.0) * variance(y)) / (nx + ny - 2.0)).sqrt();
            let cohens_d = if pooled > 0.0 { delta_mean / pooled } else { f64::NAN };
            deltas.push(PairwiseDelta {
                a: a.clone(),
                b: b.clone(),
                delta_mean,
                cohens_d,
                n_a: x.len(),
                n_b: y.len(),
            });
        }
    }
    Ok(deltas)
}
