//! Overall and grouped summaries.

use super::stats::{mean, std_dev};
use super::table::{Cell, ResultsTable};
use crate::error::AnalysisError;

/// Mean and spread of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    /// Non-null values
    pub count: usize,
    pub mean: f64,
    pub std: f64,
}

/// Summaries of the metrics within one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: Vec<Cell>,
    /// Rows in the group
    pub count: usize,
    /// One entry per requested metric, in request order
    pub metrics: Vec<ColumnSummary>,
}

impl GroupSummary {
    pub fn metric(&self, name: &str) -> Option<&ColumnSummary> {
        self.metrics.iter().find(|m| m.column == name)
    }
}

fn summarize(column: &str, values: &[f64]) -> ColumnSummary {
    ColumnSummary {
        column: column.to_string(),
        count: values.len(),
        mean: mean(values),
        std: std_dev(values),
    }
}

/// Mean and sample std of each column, nulls skipped
pub fn overall(table: &ResultsTable, columns: &[&str]) -> Result<Vec<ColumnSummary>, AnalysisError> {
    columns
        .iter()
        .map(|&column| {
            let values: Vec<f64> = table.numeric(column)?.into_iter().flatten().collect();
            Ok(summarize(column, &values))
        })
        .collect()
}

/// Per-group summaries sorted by the first metric's mean, best first
pub fn grouped(
    table: &ResultsTable,
    group_cols: &[&str],
    metrics: &[&str],
) -> Result<Vec<GroupSummary>, AnalysisError> {
    let mut summaries = table
        .group_by(group_cols)?
        .into_iter()
        .map(|group| {
            let metrics = metrics
                .iter()
                .map(|&metric| Ok(summarize(metric, &table.values_at(metric, &group.rows)?)))
                .collect::<Result<Vec<_>, AnalysisError>>()?;
            Ok(GroupSummary {
                count: group.rows.len(),
                key: group.key,
                metrics,
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    // NaN means sink to the bottom
    summaries.sort_by(|a, b| {
        let key = |g: &GroupSummary| g.metrics.first().map_or(f64::NAN, |m| m.mean);
        match (key(a), key(b)) {
            (x, y) if x.is_nan() && y.is_nan() => std::cmp::Ordering::Equal,
            (x, _) if x.is_nan() => std::cmp::Ordering::Greater,
            (_, y) if y.is_nan() => std::cmp::Ordering::Less,
            (x, y) => y.total_cmp(&x),
        }
    });
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResultsTable {
        ResultsTable::from_columns(vec![
            (
                "a".into(),
                vec![Cell::Float(0.0), Cell::Float(0.0), Cell::Float(1.0), Cell::Float(1.0)],
            ),
            ("b".into(), vec![Cell::Int(1), Cell::Int(2), Cell::Int(1), Cell::Int(2)]),
            (
                "score".into(),
                vec![Cell::Float(1.0), Cell::Float(3.0), Cell::Float(10.0), Cell::Null],
            ),
            ("name".into(), vec![Cell::Text("x".into()); 4]),
        ])
    }

    #[test]
    fn overall_skips_nulls() {
        let s = overall(&table(), &["score", "b"]).unwrap();
        assert_eq!(s[0].count, 3);
        assert!((s[0].mean - 14.0 / 3.0).abs() < 1e-12);
        assert!((s[1].mean - 1.5).abs() < 1e-12);
        assert!(overall(&table(), &["name"]).is_err());
    }

    #[test]
    fn all_null_columns_summarise_as_nan() {
        let t = ResultsTable::from_columns(vec![("p10".into(), vec![Cell::Null; 3])]);
        let s = overall(&t, &["p10"]).unwrap();
        assert_eq!(s[0].count, 0);
        assert!(s[0].mean.is_nan());
        assert!(s[0].std.is_nan());
    }

    #[test]
    fn grouped_sorts_by_first_metric() {
        let g = grouped(&table(), &["a"], &["score", "b"]).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g[0].key, vec![Cell::Float(1.0)]);
        assert_eq!(g[0].count, 2);
        assert_eq!(g[0].metric("score").unwrap().count, 1);
        assert!(g[0].metric("score").unwrap().std.is_nan());
        assert_eq!(g[1].metric("score").unwrap().mean, 2.0);

        let pairs = grouped(&table(), &["a", "b"], &["score"]).unwrap();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0].metrics[0].mean, 10.0);
        assert!(pairs[3].metrics[0].mean.is_nan());
    }
}
