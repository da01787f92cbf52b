//! Statistics over run records.
//!
//! Records are first flattened into a [`ResultsTable`]; every other function
//! in this module works on that table.

mod aggregates;
mod bootstrap;
mod pairwise;
pub mod stats;
mod summary;
mod table;

pub use aggregates::{
    ComponentMeans, CorrelationMatrix, Heatmap, ParetoPoint, RankDistribution, ScoreBucket,
    component_means_by_altruism, correlation_matrix, heatmap_matrix, multi_heatmap, pareto_points,
    rank_distribution_by_altruism, score_buckets_by_altruism, seed_stability_curves,
};
pub use bootstrap::{ConfidenceInterval, bootstrap_ci};
pub use pairwise::{PairwiseDelta, pairwise_deltas};
pub use summary::{ColumnSummary, GroupSummary, grouped, overall};
pub use table::{Cell, DType, Group, ResultsTable, component_columns};

/// Columns summarised when none are requested
pub const DEFAULT_ANALYSIS_COLUMNS: [&str; 6] = [
    "total_score",
    "player10_score",
    "player10_individual",
    "player10_rank",
    "player10_gap_to_best",
    "early_termination",
];
