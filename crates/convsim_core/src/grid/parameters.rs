//! Declared parameter lists and their Cartesian product.

use serde::{Deserialize, Serialize};

use super::indices::{GridIndices, flat_index, multi_index};
use crate::error::GridError;
use crate::model::{Roster, SimulationConfig};

/// Tolerance used when matching a recorded float against a declared value
pub const VALUE_TOLERANCE: f64 = 1e-9;

/// Dimension names in expansion order. The last one varies fastest.
pub const DIMENSIONS: [&str; 14] = [
    "altruism_prob",
    "tau_margin",
    "epsilon_fresh",
    "epsilon_mono",
    "min_samples_pid",
    "ewma_alpha",
    "importance_weight",
    "coherence_weight",
    "freshness_weight",
    "monotony_weight",
    "players",
    "subjects",
    "memory_size",
    "conversation_length",
];

/// One list of candidate values per swept parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterGrid {
    pub altruism_prob: Vec<f64>,
    pub tau_margin: Vec<f64>,
    pub epsilon_fresh: Vec<f64>,
    pub epsilon_mono: Vec<f64>,
    pub min_samples_pid: Vec<u32>,
    pub ewma_alpha: Vec<f64>,
    pub importance_weight: Vec<f64>,
    pub coherence_weight: Vec<f64>,
    pub freshness_weight: Vec<f64>,
    pub monotony_weight: Vec<f64>,
    pub players: Vec<Roster>,
    pub subjects: Vec<u32>,
    pub memory_size: Vec<u32>,
    pub conversation_length: Vec<u32>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        let base = SimulationConfig::default();
        Self {
            altruism_prob: vec![base.altruism_prob],
            tau_margin: vec![base.tau_margin],
            epsilon_fresh: vec![base.epsilon_fresh],
            epsilon_mono: vec![base.epsilon_mono],
            min_samples_pid: vec![base.min_samples_pid],
            ewma_alpha: vec![base.ewma_alpha],
            importance_weight: vec![base.importance_weight],
            coherence_weight: vec![base.coherence_weight],
            freshness_weight: vec![base.freshness_weight],
            monotony_weight: vec![base.monotony_weight],
            players: vec![base.players],
            subjects: vec![base.subjects],
            memory_size: vec![base.memory_size],
            conversation_length: vec![base.conversation_length],
        }
    }
}

impl ParameterGrid {
    /// Length of each dimension, in `DIMENSIONS` order
    pub fn shape(&self) -> Vec<usize> {
        vec![
            self.altruism_prob.len(),
            self.tau_margin.len(),
            self.epsilon_fresh.len(),
            self.epsilon_mono.len(),
            self.min_samples_pid.len(),
            self.ewma_alpha.len(),
            self.importance_weight.len(),
            self.coherence_weight.len(),
            self.freshness_weight.len(),
            self.monotony_weight.len(),
            self.players.len(),
            self.subjects.len(),
            self.memory_size.len(),
            self.conversation_length.len(),
        ]
    }

    pub fn total_configurations(&self) -> usize {
        self.shape().iter().product()
    }

    /// Names of dimensions that list more than one value
    pub fn varying_dimensions(&self) -> Vec<&'static str> {
        DIMENSIONS
            .iter()
            .zip(self.shape())
            .filter(|(_, len)| *len > 1)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Human-readable shape such as `4 x 3 x 3 = 36`
    pub fn describe(&self) -> String {
        let dims: Vec<String> = DIMENSIONS
            .iter()
            .zip(self.shape())
            .filter(|(_, len)| *len > 1)
            .map(|(name, len)| format!("{len} {name}"))
            .collect();
        if dims.is_empty() {
            "1 configuration".to_string()
        } else {
            format!("{} = {}", dims.join(" x "), self.total_configurations())
        }
    }

    /// Reject empty, non-finite, out-of-range or duplicated values
    pub fn validate(&self) -> Result<(), GridError> {
        check_floats("altruism_prob", &self.altruism_prob, |v| {
            range(v, (0.0..=1.0).contains(&v), "[0, 1]")
        })?;
        check_floats("tau_margin", &self.tau_margin, |v| {
            range(v, v >= 0.0, "[0, inf)")
        })?;
        check_floats("epsilon_fresh", &self.epsilon_fresh, |v| {
            range(v, v >= 0.0, "[0, inf)")
        })?;
        check_floats("epsilon_mono", &self.epsilon_mono, |v| {
            range(v, v >= 0.0, "[0, inf)")
        })?;
        check_list("min_samples_pid", &self.min_samples_pid)?;
        check_floats("ewma_alpha", &self.ewma_alpha, |v| {
            range(v, v > 0.0 && v <= 1.0, "(0, 1]")
        })?;
        for (name, values) in [
            ("importance_weight", &self.importance_weight),
            ("coherence_weight", &self.coherence_weight),
            ("freshness_weight", &self.freshness_weight),
            ("monotony_weight", &self.monotony_weight),
        ] {
            check_floats(name, values, |_| None)?;
        }
        check_list("players", &self.players)?;
        for roster in &self.players {
            roster.validate()?;
        }
        for (name, values) in [
            ("subjects", &self.subjects),
            ("memory_size", &self.memory_size),
            ("conversation_length", &self.conversation_length),
        ] {
            check_list(name, values)?;
            if values.contains(&0) {
                return Err(GridError::Zero(name));
            }
        }
        Ok(())
    }

    /// Every configuration in row-major order, paired with its flat index
    pub fn configurations(&self) -> impl Iterator<Item = (usize, SimulationConfig)> + '_ {
        GridIndices::new(self.shape())
            .enumerate()
            .map(|(flat, indices)| (flat, self.build(&indices)))
    }

    /// Configuration at a flat index (seed left at zero)
    pub fn configuration(&self, index: usize) -> Result<SimulationConfig, GridError> {
        let total = self.total_configurations();
        let indices = multi_index(&self.shape(), index)
            .ok_or(GridError::IndexOutOfBounds { index, total })?;
        Ok(self.build(&indices))
    }

    /// Flat index of the grid point matching `config`, ignoring its seed
    pub fn index_of(&self, config: &SimulationConfig) -> Option<usize> {
        let indices = [
            position_f64(&self.altruism_prob, config.altruism_prob)?,
            position_f64(&self.tau_margin, config.tau_margin)?,
            position_f64(&self.epsilon_fresh, config.epsilon_fresh)?,
            position_f64(&self.epsilon_mono, config.epsilon_mono)?,
            position(&self.min_samples_pid, &config.min_samples_pid)?,
            position_f64(&self.ewma_alpha, config.ewma_alpha)?,
            position_f64(&self.importance_weight, config.importance_weight)?,
            position_f64(&self.coherence_weight, config.coherence_weight)?,
            position_f64(&self.freshness_weight, config.freshness_weight)?,
            position_f64(&self.monotony_weight, config.monotony_weight)?,
            position(&self.players, &config.players)?,
            position(&self.subjects, &config.subjects)?,
            position(&self.memory_size, &config.memory_size)?,
            position(&self.conversation_length, &config.conversation_length)?,
        ];
        flat_index(&self.shape(), &indices)
    }

    pub fn contains(&self, config: &SimulationConfig) -> bool {
        self.index_of(config).is_some()
    }

    fn build(&self, i: &[usize]) -> SimulationConfig {
        SimulationConfig {
            altruism_prob: self.altruism_prob[i[0]],
            tau_margin: self.tau_margin[i[1]],
            epsilon_fresh: self.epsilon_fresh[i[2]],
            epsilon_mono: self.epsilon_mono[i[3]],
            min_samples_pid: self.min_samples_pid[i[4]],
            ewma_alpha: self.ewma_alpha[i[5]],
            importance_weight: self.importance_weight[i[6]],
            coherence_weight: self.coherence_weight[i[7]],
            freshness_weight: self.freshness_weight[i[8]],
            monotony_weight: self.monotony_weight[i[9]],
            players: self.players[i[10]].clone(),
            subjects: self.subjects[i[11]],
            memory_size: self.memory_size[i[12]],
            conversation_length: self.conversation_length[i[13]],
            seed: 0,
        }
    }
}

fn range(value: f64, ok: bool, range: &'static str) -> Option<(f64, &'static str)> {
    (!ok).then_some((value, range))
}

fn check_list<T: PartialEq>(name: &'static str, values: &[T]) -> Result<(), GridError> {
    if values.is_empty() {
        return Err(GridError::EmptyDimension(name));
    }
    for (i, value) in values.iter().enumerate() {
        if values[..i].contains(value) {
            return Err(GridError::Duplicate(name));
        }
    }
    Ok(())
}

fn check_floats(
    name: &'static str,
    values: &[f64],
    out_of_range: impl Fn(f64) -> Option<(f64, &'static str)>,
) -> Result<(), GridError> {
    if values.is_empty() {
        return Err(GridError::EmptyDimension(name));
    }
    for (i, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(GridError::NonFinite { name, value });
        }
        if let Some((value, range)) = out_of_range(value) {
            return Err(GridError::OutOfRange { name, value, range });
        }
        if values[..i]
            .iter()
            .any(|other| (other - value).abs() < VALUE_TOLERANCE)
        {
            return Err(GridError::Duplicate(name));
        }
    }
    Ok(())
}

fn position<T: PartialEq>(values: &[T], target: &T) -> Option<usize> {
    values.iter().position(|v| v == target)
}

fn position_f64(values: &[f64], target: f64) -> Option<usize> {
    values
        .iter()
        .position(|v| (v - target).abs() < VALUE_TOLERANCE)
}
