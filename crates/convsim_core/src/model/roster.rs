//! Player archetypes and match rosters

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Behaviour families that can appear in a roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Parameterised player driven by the swept behavioural knobs
    Player10,
    /// Proposes a random item half of the time
    Random,
    /// Never proposes
    Pause,
    /// Always proposes its most important item
    Greedy,
    /// Proposes whatever fits the recent subjects best
    Coherent,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Player10,
        Archetype::Random,
        Archetype::Pause,
        Archetype::Greedy,
        Archetype::Coherent,
    ];

    /// Parse a roster code such as `p10` or `pr`
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "p10" => Some(Self::Player10),
            "pr" => Some(Self::Random),
            "pp" => Some(Self::Pause),
            "pg" => Some(Self::Greedy),
            "pc" => Some(Self::Coherent),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Player10 => "p10",
            Self::Random => "pr",
            Self::Pause => "pp",
            Self::Greedy => "pg",
            Self::Coherent => "pc",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::Player10 => "Player10",
            Self::Random => "RandomPlayer",
            Self::Pause => "PausePlayer",
            Self::Greedy => "GreedyPlayer",
            Self::Coherent => "CoherentPlayer",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Largest number of seats a single match may hold
pub const MAX_PLAYERS: u32 = 10_000;

/// Population of one simulated match: archetype code -> number of players.
///
/// Codes are kept in sorted order so that player labels and seat order are
/// stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(BTreeMap<String, u32>);

impl Roster {
    pub fn new(entries: BTreeMap<String, u32>) -> Self {
        Self(entries)
    }

    /// Roster containing only `count` Player10 instances
    pub fn self_play(count: u32) -> Self {
        Self(BTreeMap::from([(Archetype::Player10.code().to_string(), count)]))
    }

    pub fn total_players(&self) -> u64 {
        self.0.values().map(|&count| u64::from(count)).sum()
    }

    pub fn count(&self, archetype: Archetype) -> u32 {
        self.0
            .iter()
            .filter(|(code, _)| Archetype::from_code(code) == Some(archetype))
            .map(|(_, count)| *count)
            .sum()
    }

    /// Resolve every entry to its archetype, in seat order
    pub fn seats(&self) -> Result<Vec<Archetype>, GridError> {
        self.validate()?;
        let mut seats = Vec::with_capacity(self.total_players() as usize);
        for (code, count) in &self.0 {
            let archetype =
                Archetype::from_code(code).ok_or_else(|| GridError::UnknownArchetype(code.clone()))?;
            seats.extend(std::iter::repeat_n(archetype, *count as usize));
        }
        Ok(seats)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.0.is_empty() {
            return Err(GridError::EmptyRoster);
        }
        for (code, count) in &self.0 {
            if Archetype::from_code(code).is_none() {
                return Err(GridError::UnknownArchetype(code.clone()));
            }
            if *count == 0 {
                return Err(GridError::ZeroCount(code.clone()));
            }
        }
        let seats = self.total_players();
        if seats > u64::from(MAX_PLAYERS) {
            return Err(GridError::TooManyPlayers {
                seats,
                limit: MAX_PLAYERS,
            });
        }
        Ok(())
    }
}

impl FromStr for Roster {
    type Err = GridError;

    /// Parse a JSON object such as `{"p10": 4, "pr": 2}`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entries: BTreeMap<String, u32> =
            serde_json::from_str(s).map_err(|e| GridError::InvalidRoster {
                input: s.to_string(),
                reason: e.to_string(),
            })?;
        let roster = Self(entries);
        roster.validate()?;
        Ok(roster)
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}:{v}")).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}
