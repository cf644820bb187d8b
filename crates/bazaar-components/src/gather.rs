//! Movement and resource collection.
//!
//! Subspace `"Gather"`, five actions: 1 up, 2 down, 3 left, 4 right,
//! 5 collect. Standing still is the global no-op.

use indexmap::IndexMap;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use bazaar_component::{
    parse_config, ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext,
};
use bazaar_core::{AgentId, AgentKey, ComponentError, ComponentEvent, ConfigError, Direction, Resource};
use bazaar_obs::{AgentObs, ObsValue};
use bazaar_world::World;

const N_ACTIONS: usize = 5;
const COLLECT: usize = 5;

/// Gather parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatherConfig {
    /// Units added to the inventory per collection.
    pub collect_yield: u64,
    /// Labor per successful move.
    pub move_labor: f64,
    /// Labor per successful collection.
    pub collect_labor: f64,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            collect_yield: 1,
            move_labor: 1.0,
            collect_labor: 1.0,
        }
    }
}

impl GatherConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.collect_yield == 0 {
            Some("collect_yield must be at least 1")
        } else if !(self.move_labor.is_finite() && self.move_labor >= 0.0) {
            Some("move_labor must be finite and non-negative")
        } else if !(self.collect_labor.is_finite() && self.collect_labor >= 0.0) {
            Some("collect_labor must be finite and non-negative")
        } else {
            None
        };
        match reason {
            Some(r) => Err(ConfigError::ComponentConfig {
                component: Gather::NAME.into(),
                reason: r.into(),
            }),
            None => Ok(()),
        }
    }
}

/// Lets mobile agents walk the grid and harvest resource tiles.
///
/// Agents act in a random order drawn from the environment RNG. Masks
/// are computed before anyone moves, so a move whose target was taken
/// earlier in the same step is dropped at runtime and costs nothing.
#[derive(Debug)]
pub struct Gather {
    config: GatherConfig,
    collected: [u64; Resource::COUNT],
}

impl Gather {
    /// Registry name.
    pub const NAME: &'static str = "Gather";

    /// Create with validated parameters.
    pub fn new(config: GatherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            collected: [0; Resource::COUNT],
        })
    }

    /// Parameters in use.
    pub fn config(&self) -> &GatherConfig {
        &self.config
    }

    fn agent_mask(world: &World, id: AgentId) -> Vec<f32> {
        let mut mask = vec![0.0; N_ACTIONS];
        let Some(agent) = world.agent(id) else {
            return mask;
        };
        for (slot, dir) in Direction::ALL.into_iter().enumerate() {
            let legal = agent
                .position
                .step(dir, world.height(), world.width())
                .is_some_and(|target| world.can_enter(id, target));
            mask[slot] = if legal { 1.0 } else { 0.0 };
        }
        if world.grid.tile(agent.position).resource().is_some() {
            mask[COLLECT - 1] = 1.0;
        }
        mask
    }

    fn try_move(
        &self,
        ctx: &mut ComponentContext<'_>,
        id: AgentId,
        dir: Direction,
    ) -> Result<(), ComponentError> {
        let world = &mut *ctx.world;
        let (h, w) = (world.height(), world.width());
        let Some(from) = world.agent(id).map(|a| a.position) else {
            return Ok(());
        };
        let Some(to) = from.step(dir, h, w).filter(|&t| world.can_enter(id, t)) else {
            return Ok(());
        };
        if let Some(agent) = world.agent_mut(id) {
            agent.position = to;
            agent.add_labor(self.config.move_labor)?;
        }
        ctx.emit(ComponentEvent::Moved { agent: id, from, to });
        Ok(())
    }

    fn try_collect(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        id: AgentId,
    ) -> Result<(), ComponentError> {
        let Some(at) = ctx.world.agent(id).map(|a| a.position) else {
            return Ok(());
        };
        let Some(resource) = ctx.world.grid.take_resource(at) else {
            return Ok(());
        };
        let amount = self.config.collect_yield;
        if let Some(agent) = ctx.world.agent_mut(id) {
            agent.inventory.add(resource, amount);
            agent.add_labor(self.config.collect_labor)?;
        }
        self.collected[resource.index()] += amount;
        ctx.emit(ComponentEvent::Collected {
            agent: id,
            resource,
            amount,
            at,
        });
        Ok(())
    }
}

/// Registry factory.
pub fn factory(config: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    Ok(Box::new(Gather::new(parse_config(Gather::NAME, config)?)?))
}

impl Component for Gather {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
        match class {
            AgentClass::Mobile => vec![ActionSubspace::new(Self::NAME, N_ACTIONS)],
            AgentClass::Planner => Vec::new(),
        }
    }

    fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        world
            .agents
            .iter()
            .map(|a| (AgentKey::Agent(a.id()), Self::agent_mask(world, a.id())))
            .collect()
    }

    fn component_step(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        let mut order: Vec<(AgentId, usize)> = actions
            .agents()
            .filter_map(|key| Some((key.agent_id()?, actions.get(key, 0)?)))
            .collect();
        order.shuffle(&mut *ctx.rng);

        for (id, action) in order {
            match action {
                1..=4 => self.try_move(ctx, id, Direction::ALL[action - 1])?,
                COLLECT => self.try_collect(ctx, id)?,
                other => {
                    return Err(ComponentError::InvariantViolation {
                        reason: format!("gather action {other} outside 1..={N_ACTIONS}"),
                    })
                }
            }
        }
        Ok(())
    }

    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs> {
        world
            .agents
            .iter()
            .map(|a| {
                let can_collect = world.grid.tile(a.position).resource().is_some();
                let mut obs = AgentObs::new();
                obs.insert(
                    "collect_yield".into(),
                    ObsValue::Scalar(self.config.collect_yield as f32),
                );
                obs.insert(
                    "can_collect".into(),
                    ObsValue::Scalar(if can_collect { 1.0 } else { 0.0 }),
                );
                (AgentKey::Agent(a.id()), obs)
            })
            .collect()
    }

    fn reset(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.collected = [0; Resource::COUNT];
        Ok(())
    }

    fn metrics(&self, _world: &World) -> IndexMap<String, f64> {
        Resource::ALL
            .into_iter()
            .map(|r| (format!("collected-{r}"), self.collected[r.index()] as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rng, slice, world_with};
    use bazaar_core::Position;
    use bazaar_world::Tile;

    fn gather() -> Gather {
        Gather::new(GatherConfig::default()).unwrap()
    }

    #[test]
    fn masks_block_edges_water_agents_and_foreign_houses() {
        let mut world = world_with(3, 3, &[(0, 0), (0, 1)], false);
        world.grid.set_tile(Position::new(1, 0), Tile::Water);
        let masks = gather().generate_masks(&world, 0);
        // Agent 0 at the corner: up/left off-grid, down water, right occupied.
        assert_eq!(masks[&AgentKey::agent(0)], vec![0.0, 0.0, 0.0, 0.0, 0.0]);

        world
            .grid
            .set_tile(Position::new(1, 1), Tile::House { owner: AgentId(0) });
        world.grid.seed_resource(Position::new(0, 1), Resource::Wood);
        let masks = gather().generate_masks(&world, 0);
        // Agent 1: up off-grid, down is agent 0's house, left occupied, right free, can collect.
        assert_eq!(masks[&AgentKey::agent(1)], vec![0.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn move_and_collect_update_state_and_labor() {
        let mut world = world_with(3, 3, &[(0, 0), (2, 2)], false);
        world.grid.seed_resource(Position::new(2, 2), Resource::Stone);
        let mut g = gather();
        let mut rng = rng();
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        let acts = slice(&[(AgentKey::agent(0), &[2]), (AgentKey::agent(1), &[5])]);
        g.component_step(&mut ctx, &acts).unwrap();

        assert_eq!(world.agents[0].position, Position::new(1, 0));
        assert_eq!(world.agents[0].labor(), 1.0);
        assert_eq!(world.agents[1].inventory.get(Resource::Stone), 1);
        assert_eq!(world.grid.tile(Position::new(2, 2)), Tile::Empty);
        assert_eq!(events.len(), 2);
        assert_eq!(g.metrics(&world)["collected-Stone"], 1.0);
    }

    #[test]
    fn contested_cell_goes_to_one_agent() {
        let mut world = world_with(1, 3, &[(0, 0), (0, 2)], false);
        let mut g = gather();
        let mut rng = rng();
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        // Agent 0 moves right, agent 1 moves left, both into (0, 1).
        let acts = slice(&[(AgentKey::agent(0), &[4]), (AgentKey::agent(1), &[3])]);
        g.component_step(&mut ctx, &acts).unwrap();

        let on_target = world
            .agents
            .iter()
            .filter(|a| a.position == Position::new(0, 1))
            .count();
        assert_eq!(on_target, 1);
        assert_eq!(events.len(), 1);
        let total_labor: f64 = world.agents.iter().map(|a| a.labor()).sum();
        assert_eq!(total_labor, 1.0);
    }

    #[test]
    fn masked_actions_change_nothing() {
        let mut world = world_with(2, 2, &[(0, 0), (1, 1)], false);
        let before = world.snapshot();
        let mut g = gather();
        let mut rng = rng();
        let mut events = Vec::new();
        let mut acts = ActionSlice::new();
        acts.insert(
            AgentKey::agent(0),
            [bazaar_component::SubAction {
                requested: 5,
                legal: false,
            }],
        );
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        g.component_step(&mut ctx, &acts).unwrap();
        assert_eq!(world.snapshot(), before);
        assert!(events.is_empty());
    }

    #[test]
    fn zero_yield_rejected() {
        let cfg = GatherConfig {
            collect_yield: 0,
            ..GatherConfig::default()
        };
        assert!(matches!(
            Gather::new(cfg),
            Err(ConfigError::ComponentConfig { .. })
        ));
    }
}
