//! Serializable copies of world state for the dense log.

use serde::{Deserialize, Serialize};

use bazaar_core::{AgentId, Position, Timestep};

use crate::agent::Agent;
use crate::grid::Tile;
use crate::inventory::Inventory;

/// One agent's state at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent ID.
    pub id: AgentId,
    /// Cell.
    pub position: Position,
    /// Free inventory.
    pub inventory: Inventory,
    /// Inventory committed to open asks.
    pub escrow: Inventory,
    /// Spendable coin.
    pub coin: f64,
    /// Coin committed to open bids.
    pub escrow_coin: f64,
    /// Accumulated labor.
    pub labor: f64,
    /// Build skill.
    pub skill: f64,
}

impl From<&Agent> for AgentSnapshot {
    fn from(a: &Agent) -> Self {
        Self {
            id: a.id(),
            position: a.position,
            inventory: a.inventory,
            escrow: *a.escrow(),
            coin: a.coin(),
            escrow_coin: a.escrow_coin(),
            labor: a.labor(),
            skill: a.skill,
        }
    }
}

/// Full world state: grid tiles plus every agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Timestep the snapshot was taken at.
    pub timestep: Timestep,
    /// Grid rows.
    pub height: usize,
    /// Grid columns.
    pub width: usize,
    /// Row-major tiles.
    pub tiles: Vec<Tile>,
    /// Agent states in ID order.
    pub agents: Vec<AgentSnapshot>,
    /// Whether trading was halted.
    pub market_halted: bool,
}
