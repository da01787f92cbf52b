//! Flat tabular view of run records.

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::AnalysisError;
use crate::model::{RunResult, ScoreBreakdown};

/// A single table value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Numeric value of int and float cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    fn optional(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Float)
    }

    fn unsigned(value: u64) -> Self {
        i64::try_from(value).map_or(Cell::Float(value as f64), Cell::Int)
    }

    /// Total order used to sort group keys: nulls, bools, numbers, text
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        fn class(cell: &Cell) -> u8 {
            match cell {
                Cell::Null => 0,
                Cell::Bool(_) => 1,
                Cell::Int(_) | Cell::Float(_) => 2,
                Cell::Text(_) => 3,
            }
        }
        match (self, other) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => class(self).cmp(&class(other)),
            },
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(v) => write!(f, "{v}"),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

/// Column type, named after the usual dataframe dtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Object,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Object => "object",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }

    /// Infer the type of a column.
    ///
    /// Ints with nulls widen to float64, as does a column holding only
    /// nulls. Anything mixed or empty is object.
    pub fn infer(cells: &[Cell]) -> Self {
        let (mut ints, mut floats, mut bools, mut nulls, mut other) = (0, 0, 0, 0, 0);
        for cell in cells {
            match cell {
                Cell::Null => nulls += 1,
                Cell::Int(_) => ints += 1,
                Cell::Float(_) => floats += 1,
                Cell::Bool(_) => bools += 1,
                Cell::Text(_) => other += 1,
            }
        }
        if other > 0 || (bools > 0 && ints + floats > 0) {
            DType::Object
        } else if bools > 0 {
            if nulls == 0 { DType::Bool } else { DType::Object }
        } else if floats > 0 || (ints > 0 && nulls > 0) {
            DType::Float64
        } else if ints > 0 {
            DType::Int64
        } else if nulls > 0 {
            DType::Float64
        } else {
            DType::Object
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows that share a grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<Cell>,
    pub rows: Vec<usize>,
}

/// Column-major table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
    rows: usize,
}

impl ResultsTable {
    /// Build a table from named columns of equal length.
    ///
    /// Shorter columns are padded with nulls.
    pub fn from_columns(columns: Vec<(String, Vec<Cell>)>) -> Self {
        let rows = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let (names, columns) = columns
            .into_iter()
            .map(|(name, mut cells)| {
                cells.resize(rows, Cell::Null);
                (name, cells)
            })
            .unzip();
        Self {
            names,
            columns,
            rows,
        }
    }

    /// One row per run record
    pub fn from_results(results: &[RunResult]) -> Self {
        let mut builder = RowBuilder::default();
        for result in results {
            let cfg = &result.config;
            builder.push("altruism_prob", Cell::Float(cfg.altruism_prob));
            builder.push("tau_margin", Cell::Float(cfg.tau_margin));
            builder.push("epsilon_fresh", Cell::Float(cfg.epsilon_fresh));
            builder.push("epsilon_mono", Cell::Float(cfg.epsilon_mono));
            builder.push("subjects", Cell::Int(cfg.subjects.into()));
            builder.push("memory_size", Cell::Int(cfg.memory_size.into()));
            builder.push("conversation_length_cfg", Cell::Int(cfg.conversation_length.into()));
            builder.push("seed", Cell::unsigned(cfg.seed));
            builder.push("min_samples_pid", Cell::Int(cfg.min_samples_pid.into()));
            builder.push("ewma_alpha", Cell::Float(cfg.ewma_alpha));
            builder.push("importance_weight", Cell::Float(cfg.importance_weight));
            builder.push("coherence_weight", Cell::Float(cfg.coherence_weight));
            builder.push("freshness_weight", Cell::Float(cfg.freshness_weight));
            builder.push("monotony_weight", Cell::Float(cfg.monotony_weight));
            builder.push("players", Cell::Text(cfg.players.to_string()));
            builder.push("total_score", Cell::Float(result.total_score));
            builder.push("player10_score", Cell::optional(result.player10_total_mean));
            builder.push("player10_individual", Cell::optional(result.player10_individual_mean));
            builder.push("player10_rank", Cell::optional(result.player10_rank_mean));
            builder.push("player10_gap_to_best", Cell::optional(result.player10_gap_to_best));
            builder.push("player10_instances", Cell::Int(result.player10_instances.into()));
            builder.push("best_total_score", Cell::Float(result.best_total_score));
            builder.push("conversation_length", Cell::Int(result.conversation_length.into()));
            builder.push(
                "early_termination",
                Cell::Float(if result.early_termination { 1.0 } else { 0.0 }),
            );
            builder.push("pause_count", Cell::Int(result.pause_count.into()));
            builder.push("unique_items_used", Cell::Int(result.unique_items_used.into()));
            builder.push("execution_time", Cell::Float(result.execution_time));
            for (component, value) in result.score_breakdown.components() {
                builder.push(&format!("shared_{component}"), Cell::Float(value));
            }
            let utilization = (cfg.conversation_length > 0 && result.conversation_length > 0).then(|| {
                f64::from(result.conversation_length) / f64::from(cfg.conversation_length)
            });
            builder.push("length_utilization", Cell::optional(utilization));
            builder.end_row();
        }
        builder.finish()
    }

    /// One row per seat per record
    pub fn player_metrics_long(results: &[RunResult]) -> Self {
        let mut builder = RowBuilder::default();
        for result in results {
            let cfg = &result.config;
            for (label, metrics) in &result.player_metrics {
                builder.push("altruism_prob", Cell::Float(cfg.altruism_prob));
                builder.push("tau_margin", Cell::Float(cfg.tau_margin));
                builder.push("epsilon_fresh", Cell::Float(cfg.epsilon_fresh));
                builder.push("epsilon_mono", Cell::Float(cfg.epsilon_mono));
                builder.push("seed", Cell::unsigned(cfg.seed));
                builder.push("label", Cell::Text(label.clone()));
                builder.push("class_name", Cell::Text(metrics.class_name.clone()));
                builder.push("alias", Cell::Text(metrics.alias.clone()));
                builder.push("total", Cell::Float(metrics.total));
                builder.push("shared", Cell::Float(metrics.shared));
                builder.push("individual", Cell::Float(metrics.individual));
                builder.push("rank", Cell::Int(metrics.rank.into()));
                builder.end_row();
            }
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        let index = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[index])
    }

    fn require(&self, name: &str) -> Result<&[Cell], AnalysisError> {
        self.column(name)
            .ok_or_else(|| AnalysisError::UnknownColumn(name.to_string()))
    }

    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.column(name).map(DType::infer)
    }

    /// Column types, optionally restricted to dtypes containing any token
    pub fn dtypes(&self, filter: &[String]) -> Vec<(String, DType)> {
        let tokens: Vec<String> = filter.iter().map(|t| t.to_lowercase()).collect();
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, cells)| (name.clone(), DType::infer(cells)))
            .filter(|(_, dtype)| tokens.is_empty() || tokens.iter().any(|t| dtype.name().contains(t.as_str())))
            .collect()
    }

    /// Values of a numeric column, `None` for nulls
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
        let cells = self.require(name)?;
        if !DType::infer(cells).is_numeric() {
            return Err(AnalysisError::NotNumeric(name.to_string()));
        }
        Ok(cells.iter().map(Cell::as_f64).collect())
    }

    /// Non-null values of a numeric column at the given rows
    pub fn values_at(&self, name: &str, rows: &[usize]) -> Result<Vec<f64>, AnalysisError> {
        let values = self.numeric(name)?;
        Ok(rows.iter().filter_map(|&r| values.get(r).copied().flatten()).collect())
    }

    /// Partition rows by the values of `columns`.
    ///
    /// Rows with a null in any key column are dropped. Groups are sorted by key.
    pub fn group_by(&self, columns: &[&str]) -> Result<Vec<Group>, AnalysisError> {
        if columns.is_empty() {
            return Err(AnalysisError::NoGroupColumns);
        }
        let key_columns = columns
            .iter()
            .map(|c| self.require(c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut groups: Vec<Group> = Vec::new();
        for row in 0..self.rows {
            let key: Vec<Cell> = key_columns.iter().map(|c| c[row].clone()).collect();
            if key.iter().any(Cell::is_null) {
                continue;
            }
            let fingerprint = format!("{key:?}");
            let slot = *index.entry(fingerprint).or_insert_with(|| {
                groups.push(Group {
                    key,
                    rows: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].rows.push(row);
        }

        groups.sort_by(|a, b| {
            a.key
                .iter()
                .zip(&b.key)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(groups)
    }
}

/// Accumulates rows keyed by column name, in first-seen column order
#[derive(Default)]
struct RowBuilder {
    names: Vec<String>,
    positions: FxHashMap<String, usize>,
    columns: Vec<Vec<Cell>>,
    rows: usize,
}

impl RowBuilder {
    fn push(&mut self, name: &str, cell: Cell) {
        let index = match self.positions.get(name) {
            Some(&i) => i,
            None => {
                self.names.push(name.to_string());
                self.positions.insert(name.to_string(), self.columns.len());
                self.columns.push(vec![Cell::Null; self.rows]);
                self.columns.len() - 1
            }
        };
        let column = &mut self.columns[index];
        column.resize(self.rows, Cell::Null);
        column.push(cell);
    }

    fn end_row(&mut self) {
        self.rows += 1;
        for column in &mut self.columns {
            column.resize(self.rows, Cell::Null);
        }
    }

    fn finish(self) -> ResultsTable {
        ResultsTable {
            names: self.names,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Columns that carry shared score components
pub fn component_columns() -> Vec<String> {
    ScoreBreakdown::COMPONENTS
        .iter()
        .map(|c| format!("shared_{c}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimulationConfig;

    fn result(altruism: f64, total: f64, p10: Option<f64>) -> RunResult {
        RunResult {
            config: SimulationConfig {
                altruism_prob: altruism,
                ..Default::default()
            },
            total_score: total,
            player10_total_mean: p10,
            conversation_length: 5,
            ..Default::default()
        }
    }

    #[test]
    fn dtype_inference() {
        assert_eq!(DType::infer(&[Cell::Int(1), Cell::Int(2)]), DType::Int64);
        assert_eq!(DType::infer(&[Cell::Int(1), Cell::Null]), DType::Float64);
        assert_eq!(DType::infer(&[Cell::Int(1), Cell::Float(0.5)]), DType::Float64);
        assert_eq!(DType::infer(&[Cell::Bool(true)]), DType::Bool);
        assert_eq!(DType::infer(&[Cell::Text("x".into()), Cell::Int(1)]), DType::Object);
        assert_eq!(DType::infer(&[Cell::Null, Cell::Null]), DType::Float64);
        assert_eq!(DType::infer(&[]), DType::Object);
    }

    #[test]
    fn flattening_produces_expected_columns() {
        let table = ResultsTable::from_results(&[result(0.5, 3.0, Some(4.0)), result(1.0, 2.0, None)]);
        assert_eq!(table.len(), 2);
        for name in [
            "altruism_prob",
            "conversation_length_cfg",
            "player10_score",
            "shared_importance",
            "shared_nonmonotonousness",
            "length_utilization",
            "early_termination",
        ] {
            assert!(table.has_column(name), "missing {name}");
        }
        assert!(!table.has_column("shared_total"));
        assert_eq!(table.dtype("player10_score"), Some(DType::Float64));
        assert_eq!(table.dtype("pause_count"), Some(DType::Int64));
        assert_eq!(table.dtype("players"), Some(DType::Object));
        assert_eq!(table.numeric("player10_score").unwrap(), vec![Some(4.0), None]);
        assert_eq!(table.numeric("length_utilization").unwrap(), vec![Some(0.1), Some(0.1)]);
        assert!(matches!(table.numeric("players"), Err(AnalysisError::NotNumeric(_))));
        assert!(matches!(table.numeric("nope"), Err(AnalysisError::UnknownColumn(_))));
    }

    #[test]
    fn dtype_filter_matches_substrings() {
        let table = ResultsTable::from_results(&[result(0.5, 3.0, None)]);
        let ints = table.dtypes(&["INT".to_string()]);
        assert!(ints.iter().all(|(_, d)| *d == DType::Int64));
        assert!(ints.iter().any(|(n, _)| n == "subjects"));
        assert_eq!(table.dtypes(&[]).len(), table.column_names().len());
    }

    #[test]
    fn groups_are_sorted_and_skip_nulls() {
        let table = ResultsTable::from_columns(vec![
            (
                "g".into(),
                vec![Cell::Float(1.0), Cell::Float(0.5), Cell::Null, Cell::Float(1.0)],
            ),
            ("v".into(), vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]),
        ]);
        assert_eq!(table.len(), 4);
        let groups = table.group_by(&["g"]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, vec![Cell::Float(0.5)]);
        assert_eq!(groups[1].rows, vec![0, 3]);
        assert_eq!(table.values_at("v", &groups[1].rows).unwrap(), vec![1.0]);
        assert!(matches!(table.group_by(&[]), Err(AnalysisError::NoGroupColumns)));
    }

    #[test]
    fn player_metrics_are_exploded() {
        let mut r = result(0.5, 1.0, None);
        r.player_metrics.insert(
            "p10_1".into(),
            crate::model::PlayerMetrics {
                class_name: "Player10".into(),
                alias: "p10".into(),
                total: 2.0,
                shared: 1.0,
                individual: 1.0,
                rank: 1,
            },
        );
        let long = ResultsTable::player_metrics_long(&[r.clone(), r]);
        assert_eq!(long.len(), 2);
        assert_eq!(long.column("label").unwrap()[1], Cell::Text("p10_1".into()));
    }
}
