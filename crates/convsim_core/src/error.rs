use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating or expanding a parameter grid
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("parameter `{0}` has no values")]
    EmptyDimension(&'static str),
    #[error("parameter `{name}` has non-finite value {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("parameter `{name}` value {value} is outside {range}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },
    #[error("parameter `{0}` lists the same value more than once")]
    Duplicate(&'static str),
    #[error("parameter `{0}` must be greater than zero")]
    Zero(&'static str),
    #[error("roster is empty")]
    EmptyRoster,
    #[error("unknown player archetype `{0}`")]
    UnknownArchetype(String),
    #[error("roster entry `{0}` has a zero count")]
    ZeroCount(String),
    #[error("roster seats {seats} players, more than the limit of {limit}")]
    TooManyPlayers { seats: u64, limit: u32 },
    #[error("invalid roster `{input}`: {reason}")]
    InvalidRoster { input: String, reason: String },
    #[error("configuration index {index} is outside a grid of {total} configurations")]
    IndexOutOfBounds { index: usize, total: usize },
}

/// Errors raised by a simulator while running a single configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors raised while executing an experiment plan
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("experiment name must not be empty")]
    EmptyName,
    #[error("simulations per configuration must be greater than zero")]
    ZeroSimulations,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("simulation {run} of configuration {configuration} failed: {source}")]
    Engine {
        configuration: usize,
        run: usize,
        #[source]
        source: EngineError,
    },
    #[error("experiment cancelled")]
    Cancelled,
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Errors raised while reading or writing results files
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unrecognised results schema in {0}")]
    Schema(PathBuf),
}

/// Errors raised by statistical helpers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("column `{0}` not found")]
    UnknownColumn(String),
    #[error("column `{0}` is not numeric")]
    NotNumeric(String),
    #[error("confidence must be between 0 and 1, got {0}")]
    InvalidConfidence(f64),
    #[error("bootstrap iterations must be greater than zero")]
    ZeroIterations,
    #[error("at least one grouping column is required")]
    NoGroupColumns,
}
