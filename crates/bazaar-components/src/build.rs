//! House construction.
//!
//! Subspace `"Build"`, one action: spend `build_cost` to put a house on
//! the agent's tile and earn `payment * pay_rate(skill)` coin.

use indexmap::IndexMap;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bazaar_component::{
    parse_config, ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext,
};
use bazaar_core::{AgentId, AgentKey, ComponentError, ComponentEvent, ConfigError, Resource};
use bazaar_obs::{AgentObs, ObsValue};
use bazaar_world::{Agent, Inventory, Tile, World};

/// Distribution build skill is drawn from at reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillDist {
    /// Every agent has skill 1.
    #[default]
    None,
    /// Lomax (Pareto II) with shape 4.
    Pareto,
    /// Log-normal with mu -1 and sigma 0.5.
    Lognormal,
}

impl SkillDist {
    /// Draw one skill value.
    pub fn sample(self, rng: &mut ChaCha8Rng) -> f64 {
        match self {
            SkillDist::None => 1.0,
            SkillDist::Pareto => {
                // 1 - U lies in (0, 1], keeping the power finite.
                let u = 1.0 - rng.gen::<f64>();
                u.powf(-0.25) - 1.0
            }
            SkillDist::Lognormal => (-1.0 + 0.5 * box_muller(rng)).exp(),
        }
    }
}

fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-300);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Build parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Base coin per house.
    pub payment: f64,
    /// Upper bound on the skill multiplier; 1 disables skill effects.
    pub payment_max_skill_multiplier: f64,
    /// Skill distribution.
    pub skill_dist: SkillDist,
    /// Labor per house.
    pub build_labor: f64,
    /// Resources consumed per house.
    pub build_cost: Inventory,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            payment: 10.0,
            payment_max_skill_multiplier: 1.0,
            skill_dist: SkillDist::None,
            build_labor: 10.0,
            build_cost: Inventory::from_pairs([(Resource::Wood, 1), (Resource::Stone, 1)]),
        }
    }
}

impl BuildConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: &str| {
            Err(ConfigError::ComponentConfig {
                component: Build::NAME.into(),
                reason: reason.into(),
            })
        };
        if !(self.payment.is_finite() && self.payment >= 0.0) {
            return bad("payment must be finite and non-negative");
        }
        if !(self.payment_max_skill_multiplier.is_finite()
            && self.payment_max_skill_multiplier >= 1.0)
        {
            return bad("payment_max_skill_multiplier must be at least 1");
        }
        if !(self.build_labor.is_finite() && self.build_labor >= 0.0) {
            return bad("build_labor must be finite and non-negative");
        }
        Ok(())
    }

    /// Multiplier applied to `payment` for an agent of the given skill.
    ///
    /// `min(m, (m - 1) * skill + 1)` where `m` is the max multiplier.
    pub fn pay_rate(&self, skill: f64) -> f64 {
        let m = self.payment_max_skill_multiplier;
        m.min((m - 1.0) * skill + 1.0)
    }

    /// Coin an agent of the given skill earns per house.
    pub fn payment_for(&self, skill: f64) -> f64 {
        self.payment * self.pay_rate(skill)
    }
}

/// Lets mobile agents convert resources into houses and coin.
#[derive(Debug)]
pub struct Build {
    config: BuildConfig,
    houses: u64,
    paid: f64,
}

impl Build {
    /// Registry name.
    pub const NAME: &'static str = "Build";

    /// Create with validated parameters.
    pub fn new(config: BuildConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            houses: 0,
            paid: 0.0,
        })
    }

    /// Parameters in use.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    fn can_build(&self, world: &World, agent: &Agent) -> bool {
        world.grid.tile(agent.position) == Tile::Empty
            && agent.inventory.covers(&self.config.build_cost)
    }

    fn build(&mut self, ctx: &mut ComponentContext<'_>, id: AgentId) -> Result<(), ComponentError> {
        let Some(agent) = ctx.world.agent(id) else {
            return Ok(());
        };
        // Earlier components may have moved the agent or spent its goods.
        if !self.can_build(ctx.world, agent) {
            return Ok(());
        }
        let at = agent.position;
        let payment = self.config.payment_for(agent.skill);
        let Some(agent) = ctx.world.agent_mut(id) else {
            return Ok(());
        };
        agent.pay(&self.config.build_cost)?;
        agent.add_coin(payment)?;
        agent.add_labor(self.config.build_labor)?;
        ctx.world.grid.set_tile(at, Tile::House { owner: id });

        self.houses += 1;
        self.paid += payment;
        debug!(agent = %id, %at, payment, "house built");
        ctx.emit(ComponentEvent::Built {
            agent: id,
            at,
            payment,
        });
        Ok(())
    }
}

/// Registry factory.
pub fn factory(config: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    Ok(Box::new(Build::new(parse_config(Build::NAME, config)?)?))
}

impl Component for Build {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
        match class {
            AgentClass::Mobile => vec![ActionSubspace::new(Self::NAME, 1)],
            AgentClass::Planner => Vec::new(),
        }
    }

    fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        world
            .agents
            .iter()
            .map(|a| {
                let legal = if self.can_build(world, a) { 1.0 } else { 0.0 };
                (AgentKey::Agent(a.id()), vec![legal])
            })
            .collect()
    }

    fn component_step(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        let builders: Vec<AgentId> = actions
            .agents()
            .filter(|&key| actions.get(key, 0).is_some())
            .filter_map(AgentKey::agent_id)
            .collect();
        for id in builders {
            self.build(ctx, id)?;
        }
        Ok(())
    }

    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs> {
        world
            .agents
            .iter()
            .map(|a| {
                let mut obs = AgentObs::new();
                obs.insert(
                    "build_payment".into(),
                    ObsValue::Scalar(self.config.payment_for(a.skill) as f32),
                );
                obs.insert("build_skill".into(), ObsValue::Scalar(a.skill as f32));
                (AgentKey::Agent(a.id()), obs)
            })
            .collect()
    }

    fn reset(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.houses = 0;
        self.paid = 0.0;
        let dist = self.config.skill_dist;
        for agent in &mut ctx.world.agents {
            agent.skill = dist.sample(ctx.rng);
        }
        Ok(())
    }

    fn metrics(&self, _world: &World) -> IndexMap<String, f64> {
        let mut m = IndexMap::new();
        m.insert("houses_built".to_string(), self.houses as f64);
        m.insert("total_payment".to_string(), self.paid);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rng, slice, world_with};
    use bazaar_core::Position;

    fn stock(world: &mut World, idx: usize, wood: u64, stone: u64) {
        world.agents[idx].inventory.add(Resource::Wood, wood);
        world.agents[idx].inventory.add(Resource::Stone, stone);
    }

    #[test]
    fn build_spends_cost_and_pays() {
        let mut world = world_with(2, 2, &[(0, 0), (1, 1)], false);
        stock(&mut world, 0, 2, 1);
        let mut b = Build::new(BuildConfig::default()).unwrap();
        assert_eq!(b.generate_masks(&world, 0)[&AgentKey::agent(0)], vec![1.0]);
        assert_eq!(b.generate_masks(&world, 0)[&AgentKey::agent(1)], vec![0.0]);

        let mut rng = rng();
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        b.component_step(&mut ctx, &slice(&[(AgentKey::agent(0), &[1])]))
            .unwrap();

        let a = &world.agents[0];
        assert_eq!(a.inventory.get(Resource::Wood), 1);
        assert_eq!(a.inventory.get(Resource::Stone), 0);
        assert_eq!(a.coin(), 10.0);
        assert_eq!(a.labor(), 10.0);
        assert_eq!(
            world.grid.tile(Position::new(0, 0)),
            Tile::House { owner: AgentId(0) }
        );
        assert_eq!(events.len(), 1);
        // The tile is no longer empty.
        assert_eq!(b.generate_masks(&world, 0)[&AgentKey::agent(0)], vec![0.0]);
    }

    #[test]
    fn build_without_goods_is_a_noop() {
        let mut world = world_with(2, 2, &[(0, 0), (1, 1)], false);
        stock(&mut world, 1, 1, 0);
        let before = world.snapshot();
        let mut b = Build::new(BuildConfig::default()).unwrap();
        let mut rng = rng();
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        b.component_step(&mut ctx, &slice(&[(AgentKey::agent(1), &[1])]))
            .unwrap();
        assert_eq!(world.snapshot(), before);
        assert!(events.is_empty());
    }

    #[test]
    fn pay_rate_follows_skill() {
        let cfg = BuildConfig {
            payment_max_skill_multiplier: 3.0,
            ..BuildConfig::default()
        };
        assert_eq!(cfg.pay_rate(0.0), 1.0);
        assert_eq!(cfg.pay_rate(0.5), 2.0);
        assert_eq!(cfg.pay_rate(5.0), 3.0);
        assert_eq!(BuildConfig::default().pay_rate(5.0), 1.0);
        assert_eq!(cfg.payment_for(0.5), 20.0);
    }

    #[test]
    fn reset_draws_skills_from_rng() {
        let mut world = world_with(3, 3, &[(0, 0), (1, 1), (2, 2)], false);
        let cfg = BuildConfig {
            skill_dist: SkillDist::Pareto,
            ..BuildConfig::default()
        };
        let mut b = Build::new(cfg).unwrap();
        let mut rng = rng();
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        b.reset(&mut ctx).unwrap();
        assert!(world.agents.iter().all(|a| a.skill >= 0.0 && a.skill.is_finite()));
        assert!(world.agents.iter().any(|a| a.skill != 1.0));
    }

    #[test]
    fn lognormal_skill_is_positive() {
        let mut rng = rng();
        for _ in 0..100 {
            let s = SkillDist::Lognormal.sample(&mut rng);
            assert!(s > 0.0 && s.is_finite());
        }
    }

    #[test]
    fn parses_lowercase_skill_dist() {
        let cfg: BuildConfig =
            parse_config("Build", &serde_json::json!({ "skill_dist": "pareto" })).unwrap();
        assert_eq!(cfg.skill_dist, SkillDist::Pareto);
        assert_eq!(cfg.build_cost.get(Resource::Wood), 1);
    }
}
