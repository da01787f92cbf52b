//! Aggregates behind the HTML dashboard.

use super::stats::{expanding_mean, mean, pearson};
use super::table::{Cell, ResultsTable, component_columns};
use crate::error::AnalysisError;
use crate::model::ScoreBreakdown;

/// Raw score samples for one altruism level
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBucket {
    pub altruism: Cell,
    pub total: Vec<f64>,
    pub player10: Vec<f64>,
}

pub fn score_buckets_by_altruism(table: &ResultsTable) -> Result<Vec<ScoreBucket>, AnalysisError> {
    table
        .group_by(&["altruism_prob"])?
        .into_iter()
        .map(|group| {
            Ok(ScoreBucket {
                total: table.values_at("total_score", &group.rows)?,
                player10: table.values_at("player10_score", &group.rows)?,
                altruism: group.key.into_iter().next().unwrap_or(Cell::Null),
            })
        })
        .collect()
}

/// Mean shared component per altruism level
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMeans {
    pub levels: Vec<Cell>,
    /// `(component, mean per level)` in breakdown order
    pub series: Vec<(&'static str, Vec<f64>)>,
}

pub fn component_means_by_altruism(table: &ResultsTable) -> Result<ComponentMeans, AnalysisError> {
    let groups = table.group_by(&["altruism_prob"])?;
    let columns = component_columns();
    let series = ScoreBreakdown::COMPONENTS
        .iter()
        .zip(&columns)
        .map(|(&component, column)| {
            let means = groups
                .iter()
                .map(|g| table.values_at(column, &g.rows).map(|v| if v.is_empty() { 0.0 } else { mean(&v) }))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((component, means))
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;
    Ok(ComponentMeans {
        levels: groups.into_iter().filter_map(|g| g.key.into_iter().next()).collect(),
        series,
    })
}

/// Finishing ranks of one player class at one altruism level
#[derive(Debug, Clone, PartialEq)]
pub struct RankDistribution {
    pub altruism: Cell,
    /// Ascending
    pub ranks: Vec<f64>,
}

/// Rank samples per altruism level for seats of `class_name`.
///
/// Expects the per-seat table from [`ResultsTable::player_metrics_long`].
pub fn rank_distribution_by_altruism(
    seats: &ResultsTable,
    class_name: &str,
) -> Result<Vec<RankDistribution>, AnalysisError> {
    let class = Cell::Text(class_name.to_string());
    let mut distributions = Vec::new();
    for group in seats.group_by(&["altruism_prob", "class_name"])? {
        let [altruism, seat_class]: [Cell; 2] = match group.key.try_into() {
            Ok(key) => key,
            Err(_) => continue,
        };
        if seat_class != class {
            continue;
        }
        let mut ranks = seats.values_at("rank", &group.rows)?;
        ranks.sort_by(f64::total_cmp);
        distributions.push(RankDistribution { altruism, ranks });
    }
    Ok(distributions)
}

/// Player10 individual score against shared total for one policy setting
#[derive(Debug, Clone, PartialEq)]
pub struct ParetoPoint {
    pub altruism: Cell,
    pub tau: Cell,
    pub fresh: Cell,
    pub mono: Cell,
    pub total: f64,
    pub player10: f64,
    /// Share of runs that ended early
    pub early: Option<f64>,
    pub runs: usize,
}

/// One point per (altruism, tau, epsilon_fresh, epsilon_mono) tuple
pub fn pareto_points(table: &ResultsTable) -> Result<Vec<ParetoPoint>, AnalysisError> {
    let mut points = Vec::new();
    for group in table.group_by(&["altruism_prob", "tau_margin", "epsilon_fresh", "epsilon_mono"])? {
        let total = table.values_at("total_score", &group.rows)?;
        let player10 = table.values_at("player10_individual", &group.rows)?;
        if total.is_empty() || player10.is_empty() {
            continue;
        }
        let early = table.values_at("early_termination", &group.rows)?;
        let [altruism, tau, fresh, mono]: [Cell; 4] = match group.key.try_into() {
            Ok(key) => key,
            Err(_) => continue,
        };
        points.push(ParetoPoint {
            altruism,
            tau,
            fresh,
            mono,
            total: mean(&total),
            player10: mean(&player10),
            early: (!early.is_empty()).then(|| mean(&early)),
            runs: total.len(),
        });
    }
    Ok(points)
}

/// Mean of a metric over two parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub rows: Vec<Cell>,
    pub cols: Vec<Cell>,
    /// `values[r][c]`, `None` where no run has that combination
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn heatmap_matrix(
    table: &ResultsTable,
    row_col: &str,
    col_col: &str,
    metric: &str,
) -> Result<Option<Heatmap>, AnalysisError> {
    let Some(mut heatmap) = empty_heatmap(table, row_col, col_col)? else {
        return Ok(None);
    };
    for group in table.group_by(&[row_col, col_col])? {
        heatmap.fill(&group.key, &table.values_at(metric, &group.rows)?);
    }
    Ok(Some(heatmap))
}

/// One heatmap per level of `facet_col`.
///
/// Every facet shares the row and column levels of the whole table so the
/// panels line up.
pub fn multi_heatmap(
    table: &ResultsTable,
    facet_col: &str,
    row_col: &str,
    col_col: &str,
    metric: &str,
) -> Result<Vec<(Cell, Heatmap)>, AnalysisError> {
    let Some(blank) = empty_heatmap(table, row_col, col_col)? else {
        return Ok(Vec::new());
    };
    let mut facets: Vec<(Cell, Heatmap)> = levels(table, facet_col)?
        .into_iter()
        .map(|level| (level, blank.clone()))
        .collect();
    for group in table.group_by(&[facet_col, row_col, col_col])? {
        let Some((_, heatmap)) = facets.iter_mut().find(|(level, _)| *level == group.key[0]) else {
            continue;
        };
        heatmap.fill(&group.key[1..], &table.values_at(metric, &group.rows)?);
    }
    Ok(facets)
}

fn levels(table: &ResultsTable, column: &str) -> Result<Vec<Cell>, AnalysisError> {
    Ok(table.group_by(&[column])?.into_iter().flat_map(|g| g.key).collect())
}

fn empty_heatmap(table: &ResultsTable, row_col: &str, col_col: &str) -> Result<Option<Heatmap>, AnalysisError> {
    let rows = levels(table, row_col)?;
    let cols = levels(table, col_col)?;
    if rows.is_empty() || cols.is_empty() {
        return Ok(None);
    }
    let values = vec![vec![None; cols.len()]; rows.len()];
    Ok(Some(Heatmap { rows, cols, values }))
}

impl Heatmap {
    /// Store the mean of `sample` at the `[row, col]` key
    fn fill(&mut self, key: &[Cell], sample: &[f64]) {
        let [row, col] = key else {
            return;
        };
        let (Some(r), Some(c)) = (
            self.rows.iter().position(|v| v == row),
            self.cols.iter().position(|v| v == col),
        ) else {
            return;
        };
        if !sample.is_empty() {
            self.values[r][c] = Some(mean(sample));
        }
    }
}

/// Cumulative mean of `metric` per level of `group_col`, ordered by `order_col`
pub fn seed_stability_curves(
    table: &ResultsTable,
    group_col: &str,
    metric: &str,
    order_col: &str,
) -> Result<Vec<(Cell, Vec<f64>)>, AnalysisError> {
    let order = table
        .column(order_col)
        .ok_or_else(|| AnalysisError::UnknownColumn(order_col.to_string()))?;
    let mut curves = Vec::new();
    for mut group in table.group_by(&[group_col])? {
        group.rows.sort_by(|&a, &b| order[a].total_cmp(&order[b]));
        let values = table.values_at(metric, &group.rows)?;
        if values.is_empty() {
            continue;
        }
        let level = group.key.into_iter().next().unwrap_or(Cell::Null);
        curves.push((level, expanding_mean(&values)));
    }
    Ok(curves)
}

/// Pearson correlations between numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Correlations between the requested columns that exist and are numeric
pub fn correlation_matrix(table: &ResultsTable, columns: &[&str]) -> CorrelationMatrix {
    let data: Vec<(String, Vec<Option<f64>>)> = columns
        .iter()
        .filter_map(|&c| table.numeric(c).ok().map(|v| (c.to_string(), v)))
        .collect();
    let values = data
        .iter()
        .map(|(_, x)| data.iter().map(|(_, y)| pearson(x, y)).collect())
        .collect();
    CorrelationMatrix {
        columns: data.into_iter().map(|(name, _)| name).collect(),
        values,
    }
}
