//! The shared world state components read and mutate.

use bazaar_core::{AgentId, AgentKey, ConfigError, Position, Resource, Timestep};

use crate::agent::{Agent, Planner};
use crate::grid::{Grid, Tile};
use crate::market::MarketHistory;
use crate::snapshot::{AgentSnapshot, WorldSnapshot};

/// Grid, agents, optional planner and the clock.
///
/// Agents are created once here and never added or removed; `reset_state`
/// only clears their mutable fields.
#[derive(Clone, Debug)]
pub struct World {
    /// Tile grid.
    pub grid: Grid,
    /// Mobile agents, indexed by [`AgentId::index`].
    pub agents: Vec<Agent>,
    /// The planner, if the scenario has one.
    pub planner: Option<Planner>,
    /// Set by the planner to suspend trading.
    pub market_halted: bool,
    /// Per-step prices, volumes and depth recorded by the trading
    /// component.
    pub market: MarketHistory,
    /// Steps taken since the last reset.
    pub timestep: Timestep,
}

impl World {
    /// Create a world with `n_agents` agents on an empty grid.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidWorldSize`] for a zero dimension and
    /// [`ConfigError::InvalidAgentCount`] when the agents cannot each get
    /// their own cell.
    pub fn new(
        height: usize,
        width: usize,
        n_agents: usize,
        has_planner: bool,
    ) -> Result<Self, ConfigError> {
        let grid = Grid::new(height, width)?;
        if n_agents > grid.cell_count() {
            return Err(ConfigError::InvalidAgentCount {
                n_agents,
                reason: format!("only {} cells available", grid.cell_count()),
            });
        }
        let n = u32::try_from(n_agents).map_err(|_| ConfigError::InvalidAgentCount {
            n_agents,
            reason: "exceeds u32 range".into(),
        })?;
        Ok(Self {
            grid,
            agents: (0..n).map(|i| Agent::new(AgentId(i))).collect(),
            planner: has_planner.then(Planner::default),
            market_halted: false,
            market: MarketHistory::new(),
            timestep: Timestep(0),
        })
    }

    /// Grid rows.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Grid columns.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Number of mobile agents.
    pub fn n_agents(&self) -> usize {
        self.agents.len()
    }

    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Look up an agent mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    /// Every key that acts: agents in ID order, then the planner.
    pub fn agent_keys(&self) -> Vec<AgentKey> {
        let mut keys: Vec<AgentKey> = self.agents.iter().map(|a| AgentKey::Agent(a.id())).collect();
        if self.planner.is_some() {
            keys.push(AgentKey::Planner);
        }
        keys
    }

    /// The agent standing on `pos`, if any.
    pub fn agent_at(&self, pos: Position) -> Option<AgentId> {
        self.agents.iter().find(|a| a.position == pos).map(Agent::id)
    }

    /// Whether `agent` may step onto `pos`: in bounds, not water, not
    /// occupied by another agent, not a house owned by someone else.
    pub fn can_enter(&self, agent: AgentId, pos: Position) -> bool {
        if !self.grid.contains(pos) {
            return false;
        }
        match self.grid.tile(pos) {
            Tile::Water => return false,
            Tile::House { owner } if owner != agent => return false,
            _ => {}
        }
        self.agent_at(pos).is_none_or(|other| other == agent)
    }

    /// Empty tiles with no agent on them, in row-major order.
    pub fn free_cells(&self) -> Vec<Position> {
        self.grid
            .positions()
            .filter(|&p| self.grid.tile(p) == Tile::Empty && self.agent_at(p).is_none())
            .collect()
    }

    /// Clear the grid, every agent's mutable state, the halt flag and
    /// the clock.
    pub fn reset_state(&mut self) {
        self.grid.clear();
        for agent in &mut self.agents {
            agent.reset();
        }
        if let Some(planner) = &mut self.planner {
            planner.action_mask.clear();
        }
        self.market_halted = false;
        self.market.clear();
        self.timestep = Timestep(0);
    }

    /// Units of `resource` anywhere: on tiles, in inventories and in escrow.
    pub fn total_resource(&self, resource: Resource) -> u64 {
        self.grid.count_resource(resource) as u64
            + self
                .agents
                .iter()
                .map(|a| a.total_resource(resource))
                .sum::<u64>()
    }

    /// Coin held by all agents, escrow included.
    pub fn total_coin(&self) -> f64 {
        self.agents.iter().map(Agent::total_coin).sum()
    }

    /// Spendable-plus-escrow coin per agent, in ID order.
    pub fn coin_endowments(&self) -> Vec<f64> {
        self.agents.iter().map(Agent::total_coin).collect()
    }

    /// Copy the full state for logging.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            timestep: self.timestep,
            height: self.height(),
            width: self.width(),
            tiles: self.grid.tiles().to_vec(),
            agents: self.agent_snapshots(),
            market_halted: self.market_halted,
        }
    }

    /// Copy every agent's state.
    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(AgentSnapshot::from).collect()
    }
}
