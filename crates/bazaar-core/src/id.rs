//! Strongly-typed identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifies a mobile agent within an environment.
///
/// Agents are created once at construction and numbered `0..n_agents`.
/// `AgentId(n)` is the n-th agent in the world's agent list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    /// The agent's position in the world's agent list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Key for anything that receives observations and submits actions:
/// a mobile agent or the (single) planner.
///
/// Displays as the agent number (`"0"`, `"1"`, ...) or `"p"` for the
/// planner, and serializes the same way so it can key JSON maps.
/// Agents order before the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentKey {
    /// A mobile agent on the grid.
    Agent(AgentId),
    /// The social planner. Occupies no cell.
    Planner,
}

impl AgentKey {
    /// Shorthand for `AgentKey::Agent(AgentId(id))`.
    pub fn agent(id: u32) -> Self {
        Self::Agent(AgentId(id))
    }

    /// Whether this key names the planner.
    pub fn is_planner(self) -> bool {
        matches!(self, Self::Planner)
    }

    /// The mobile agent ID, or `None` for the planner.
    pub fn agent_id(self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Planner => None,
        }
    }
}

impl From<AgentId> for AgentKey {
    fn from(id: AgentId) -> Self {
        Self::Agent(id)
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "{id}"),
            Self::Planner => write!(f, "p"),
        }
    }
}

impl FromStr for AgentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "p" {
            return Ok(Self::Planner);
        }
        s.parse::<u32>()
            .map(Self::agent)
            .map_err(|_| format!("invalid agent key '{s}'"))
    }
}

impl Serialize for AgentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AgentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Episode-local step counter (0 after reset).
///
/// Incremented each time the environment advances one step.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestep(pub u64);

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestep {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
