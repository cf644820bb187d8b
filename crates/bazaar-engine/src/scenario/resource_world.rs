//! The builtin gather-build-trade scenarios.

use indexmap::IndexMap;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bazaar_core::{AgentKey, ConfigError, Position, Resource, StepError};
use bazaar_obs::{AgentObs, ObsValue};
use bazaar_world::{Tile, World};

use super::Scenario;
use crate::rewards::{
    agent_reward_total, coin_eq_times_productivity, isoelastic_coin_minus_labor,
    planner_reward_liq, planner_reward_stab, planner_reward_total,
};
use crate::social_metrics::{get_equality, get_gini, get_productivity};

/// How resources are laid out at reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Resources and water scattered independently per cell.
    Uniform,
    /// A water cross with a gap at the centre; wood above, stone below.
    Quadrant,
}

impl Layout {
    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            Layout::Uniform => "uniform",
            Layout::Quadrant => "quadrant",
        }
    }
}

/// What agents are rewarded on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentReward {
    /// Isoelastic utility of coin minus labor cost.
    #[default]
    Isoelastic,
    /// Half the agent's share of the largest coin balance.
    BalanceShare,
}

/// What the planner is rewarded on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerReward {
    /// Mean coin scaled by equality.
    #[default]
    Welfare,
    /// Trading liquidity minus price volatility, averaged over resources.
    LiquidityStability,
}

/// Parameters shared by both layouts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceWorldConfig {
    /// Chance a cell starts as a wood source.
    pub wood_density: f64,
    /// Chance a cell starts as a stone source.
    pub stone_density: f64,
    /// Chance a cell starts as water (uniform layout only).
    pub water_density: f64,
    /// Per-step chance an empty, unoccupied source regrows.
    pub regen_prob: f64,
    /// Coin each agent starts with.
    pub starting_coin: f64,
    /// Curvature of utility in coin, in `[0, 1]`.
    pub isoelastic_eta: f64,
    /// Utility lost per unit of labor.
    pub labor_coefficient: f64,
    /// Weight of equality in planner welfare, in `[0, 1]`.
    pub equality_weight: f64,
    /// Whether the environment has a planner.
    pub planner: bool,
    /// Agent reward function.
    pub agent_reward: AgentReward,
    /// Planner reward function.
    pub planner_reward: PlannerReward,
    /// Weight of liquidity against stability, in `[0, 1]`.
    pub liq_importance: f64,
    /// Floor for the volume liquidity is measured against.
    pub base_volume: f64,
    /// Floor for the price deviation volatility is measured against.
    pub base_std: f64,
}

impl Default for ResourceWorldConfig {
    fn default() -> Self {
        Self {
            wood_density: 0.1,
            stone_density: 0.1,
            water_density: 0.0,
            regen_prob: 0.01,
            starting_coin: 0.0,
            isoelastic_eta: 0.23,
            labor_coefficient: 0.21,
            equality_weight: 1.0,
            planner: true,
            agent_reward: AgentReward::Isoelastic,
            planner_reward: PlannerReward::Welfare,
            liq_importance: 0.5,
            base_volume: 1.0,
            base_std: 5.0,
        }
    }
}

impl ResourceWorldConfig {
    /// Check parameter ranges.
    pub fn validate(&self, scenario: &str) -> Result<(), ConfigError> {
        let err = |reason: String| ConfigError::ScenarioConfig {
            scenario: scenario.to_string(),
            reason,
        };
        let unit = [
            ("wood_density", self.wood_density),
            ("stone_density", self.stone_density),
            ("water_density", self.water_density),
            ("regen_prob", self.regen_prob),
            ("isoelastic_eta", self.isoelastic_eta),
            ("equality_weight", self.equality_weight),
            ("liq_importance", self.liq_importance),
        ];
        for (name, v) in unit {
            if !(0.0..=1.0).contains(&v) {
                return Err(err(format!("{name} must be in [0, 1], got {v}")));
            }
        }
        let density = self.wood_density + self.stone_density + self.water_density;
        if density > 1.0 {
            return Err(err(format!("densities sum to {density}, above 1")));
        }
        if !self.starting_coin.is_finite() || self.starting_coin < 0.0 {
            return Err(err(format!(
                "starting_coin must be finite and non-negative, got {}",
                self.starting_coin
            )));
        }
        let non_negative = [
            ("labor_coefficient", self.labor_coefficient),
            ("base_volume", self.base_volume),
            ("base_std", self.base_std),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(err(format!("{name} must be finite and non-negative, got {v}")));
            }
        }
        Ok(())
    }
}

/// Grid world with regenerating wood and stone, isoelastic agent
/// utility and equality-weighted planner welfare.
#[derive(Debug)]
pub struct ResourceWorld {
    layout: Layout,
    config: ResourceWorldConfig,
    prev_utility: Vec<f64>,
    prev_welfare: f64,
}

impl ResourceWorld {
    /// Create a scenario, validating `config`.
    pub fn new(layout: Layout, config: ResourceWorldConfig) -> Result<Self, ConfigError> {
        config.validate(layout.name())?;
        Ok(Self {
            layout,
            config,
            prev_utility: Vec::new(),
            prev_welfare: 0.0,
        })
    }

    /// The active parameters.
    pub fn config(&self) -> &ResourceWorldConfig {
        &self.config
    }

    fn utilities(&self, world: &World) -> Vec<f64> {
        let c = &self.config;
        match c.agent_reward {
            AgentReward::Isoelastic => world
                .agents
                .iter()
                .map(|a| {
                    isoelastic_coin_minus_labor(
                        a.total_coin(),
                        a.labor(),
                        c.isoelastic_eta,
                        c.labor_coefficient,
                    )
                })
                .collect(),
            AgentReward::BalanceShare => {
                let coins = world.coin_endowments();
                let max = coins.iter().copied().fold(0.0, f64::max);
                coins.iter().map(|&b| agent_reward_total(b, max)).collect()
            }
        }
    }

    fn welfare(&self, world: &World) -> f64 {
        let c = &self.config;
        match c.planner_reward {
            PlannerReward::Welfare => {
                coin_eq_times_productivity(&world.coin_endowments(), c.equality_weight)
            }
            PlannerReward::LiquidityStability => {
                let market = &world.market;
                let total: f64 = Resource::ALL
                    .into_iter()
                    .map(|r| {
                        planner_reward_total(
                            market.volumes(r),
                            market.prices(r),
                            c.base_volume,
                            c.base_std,
                            c.liq_importance,
                        )
                    })
                    .sum();
                total / Resource::COUNT as f64
            }
        }
    }

    fn layout_uniform(&self, world: &mut World, rng: &mut ChaCha8Rng) {
        let c = &self.config;
        let positions: Vec<Position> = world.grid.positions().collect();
        for pos in positions {
            let u = rng.gen::<f64>();
            if u < c.water_density {
                world.grid.set_tile(pos, Tile::Water);
            } else if u < c.water_density + c.wood_density {
                world.grid.seed_resource(pos, Resource::Wood);
            } else if u < c.water_density + c.wood_density + c.stone_density {
                world.grid.seed_resource(pos, Resource::Stone);
            }
        }
    }

    fn layout_quadrant(&self, world: &mut World, rng: &mut ChaCha8Rng) {
        let (mid_r, mid_c) = (world.height() / 2, world.width() / 2);
        let positions: Vec<Position> = world.grid.positions().collect();
        for pos in positions {
            let near_centre = pos.row.abs_diff(mid_r) <= 1 && pos.col.abs_diff(mid_c) <= 1;
            if (pos.row == mid_r || pos.col == mid_c) && !near_centre {
                world.grid.set_tile(pos, Tile::Water);
                continue;
            }
            let (resource, density) = if pos.row < mid_r {
                (Resource::Wood, self.config.wood_density)
            } else if pos.row > mid_r {
                (Resource::Stone, self.config.stone_density)
            } else {
                continue;
            };
            if rng.gen::<f64>() < density {
                world.grid.seed_resource(pos, resource);
            }
        }
    }

    fn map(world: &World) -> ObsValue {
        let (h, w) = (world.height(), world.width());
        let grid = &world.grid;
        let mut data = Vec::with_capacity(5 * h * w);
        data.extend(grid.channel(|t| t == Tile::Resource(Resource::Wood)));
        data.extend(grid.channel(|t| t == Tile::Resource(Resource::Stone)));
        data.extend(grid.channel(|t| t == Tile::Water));
        data.extend(grid.channel(|t| matches!(t, Tile::House { .. })));
        let mut agents = vec![0.0; h * w];
        for a in &world.agents {
            agents[a.position.flat_index(w)] = 1.0;
        }
        data.extend(agents);
        // Shape and data length agree by construction.
        ObsValue::tensor(&[5, h, w], data).unwrap_or(ObsValue::Vector(Vec::new()))
    }
}

pub(crate) fn uniform_factory(
    config: &serde_json::Value,
) -> Result<Box<dyn Scenario>, ConfigError> {
    factory(Layout::Uniform, config)
}

pub(crate) fn quadrant_factory(
    config: &serde_json::Value,
) -> Result<Box<dyn Scenario>, ConfigError> {
    factory(Layout::Quadrant, config)
}

fn factory(layout: Layout, value: &serde_json::Value) -> Result<Box<dyn Scenario>, ConfigError> {
    let config = if value.is_null() {
        ResourceWorldConfig::default()
    } else {
        ResourceWorldConfig::deserialize(value).map_err(|e| ConfigError::ScenarioConfig {
            scenario: layout.name().to_string(),
            reason: e.to_string(),
        })?
    };
    Ok(Box::new(ResourceWorld::new(layout, config)?))
}

impl Scenario for ResourceWorld {
    fn name(&self) -> &str {
        self.layout.name()
    }

    fn has_planner(&self) -> bool {
        self.config.planner
    }

    fn reset_layout(&mut self, world: &mut World, rng: &mut ChaCha8Rng) -> Result<(), StepError> {
        match self.layout {
            Layout::Uniform => self.layout_uniform(world, rng),
            Layout::Quadrant => self.layout_quadrant(world, rng),
        }
        debug!(
            layout = self.layout.name(),
            wood = world.grid.count_resource(Resource::Wood),
            stone = world.grid.count_resource(Resource::Stone),
            "layout generated"
        );
        Ok(())
    }

    fn reset_agents(&mut self, world: &mut World, rng: &mut ChaCha8Rng) -> Result<(), StepError> {
        let mut cells: Vec<Position> = world
            .grid
            .positions()
            .filter(|&p| world.grid.tile(p) == Tile::Empty)
            .collect();
        if cells.len() < world.n_agents() {
            return Err(StepError::ResetFailed {
                reason: format!(
                    "{} empty cells for {} agents",
                    cells.len(),
                    world.n_agents()
                ),
            });
        }
        cells.shuffle(rng);
        for (agent, pos) in world.agents.iter_mut().zip(cells) {
            agent.position = pos;
            agent
                .add_coin(self.config.starting_coin)
                .map_err(|e| StepError::ResetFailed {
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    fn scenario_step(&mut self, world: &mut World, rng: &mut ChaCha8Rng) {
        if self.config.regen_prob <= 0.0 {
            return;
        }
        let candidates: Vec<(Position, Resource)> = world
            .grid
            .positions()
            .filter_map(|p| Some((p, world.grid.source(p)?)))
            .filter(|&(p, _)| world.grid.tile(p) == Tile::Empty && world.agent_at(p).is_none())
            .collect();
        for (pos, resource) in candidates {
            if rng.gen::<f64>() < self.config.regen_prob {
                world.grid.set_tile(pos, Tile::Resource(resource));
            }
        }
    }

    fn additional_reset_steps(&mut self, world: &World) {
        self.prev_utility = self.utilities(world);
        self.prev_welfare = self.welfare(world);
    }

    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs> {
        let map = Self::map(world);
        let mut out = IndexMap::new();
        for a in &world.agents {
            let mut obs = AgentObs::new();
            obs.insert("loc-row".into(), ObsValue::Scalar(a.position.row as f32));
            obs.insert("loc-col".into(), ObsValue::Scalar(a.position.col as f32));
            for r in Resource::ALL {
                obs.insert(
                    format!("inventory-{r}"),
                    ObsValue::Scalar(a.inventory.get(r) as f32),
                );
            }
            obs.insert("coin".into(), ObsValue::Scalar(a.coin() as f32));
            obs.insert("labor".into(), ObsValue::Scalar(a.labor() as f32));
            obs.insert("map".into(), map.clone());
            out.insert(AgentKey::Agent(a.id()), obs);
        }
        if world.planner.is_some() {
            let mut obs = AgentObs::new();
            obs.insert("map".into(), map);
            let inventories = world
                .agents
                .iter()
                .flat_map(|a| Resource::ALL.map(|r| a.inventory.get(r) as f32))
                .collect();
            obs.insert("inventories".into(), ObsValue::Vector(inventories));
            let coins = world.agents.iter().map(|a| a.total_coin() as f32).collect();
            obs.insert("coins".into(), ObsValue::Vector(coins));
            out.insert(AgentKey::Planner, obs);
        }
        out
    }

    fn compute_rewards(&mut self, world: &World) -> IndexMap<AgentKey, f64> {
        let utilities = self.utilities(world);
        let mut rewards: IndexMap<AgentKey, f64> = world
            .agents
            .iter()
            .zip(&utilities)
            .enumerate()
            .map(|(i, (a, &u))| {
                let prev = self.prev_utility.get(i).copied().unwrap_or(u);
                (AgentKey::Agent(a.id()), u - prev)
            })
            .collect();
        self.prev_utility = utilities;
        if world.planner.is_some() {
            let welfare = self.welfare(world);
            rewards.insert(AgentKey::Planner, welfare - self.prev_welfare);
            self.prev_welfare = welfare;
        }
        rewards
    }

    fn metrics(&self, world: &World) -> IndexMap<String, f64> {
        let coins = world.coin_endowments();
        let utilities = self.utilities(world);
        let n = world.n_agents().max(1) as f64;
        let mut m = IndexMap::new();
        m.insert("social/productivity".to_string(), get_productivity(&coins));
        m.insert("social/equality".to_string(), get_equality(&coins));
        m.insert("social/gini".to_string(), get_gini(&coins));
        m.insert("social/welfare".to_string(), self.welfare(world));
        m.insert(
            "agents/mean_utility".to_string(),
            utilities.iter().sum::<f64>() / n,
        );
        m.insert(
            "agents/mean_labor".to_string(),
            world.agents.iter().map(|a| a.labor()).sum::<f64>() / n,
        );
        let market = &world.market;
        let per_resource = Resource::COUNT as f64;
        let liquidity: f64 = Resource::ALL
            .into_iter()
            .map(|r| planner_reward_liq(market.volumes(r), self.config.base_volume))
            .sum();
        let volatility: f64 = Resource::ALL
            .into_iter()
            .map(|r| planner_reward_stab(market.prices(r), 2, self.config.base_std))
            .sum();
        m.insert("market/liquidity".to_string(), liquidity / per_resource);
        m.insert("market/volatility".to_string(), volatility / per_resource);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    fn scenario(layout: Layout, config: ResourceWorldConfig) -> ResourceWorld {
        ResourceWorld::new(layout, config).unwrap()
    }

    #[test]
    fn uniform_densities_are_respected_at_extremes() {
        let cfg = ResourceWorldConfig {
            wood_density: 1.0,
            stone_density: 0.0,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(4, 4, 2, true).unwrap();
        let mut s = scenario(Layout::Uniform, cfg);
        s.reset_layout(&mut world, &mut rng()).unwrap();
        assert_eq!(world.grid.count_resource(Resource::Wood), 16);
        // No empty cell left for the agents.
        assert!(matches!(
            s.reset_agents(&mut world, &mut rng()),
            Err(StepError::ResetFailed { .. })
        ));
    }

    #[test]
    fn agents_land_on_distinct_empty_cells_with_coin() {
        let cfg = ResourceWorldConfig {
            starting_coin: 5.0,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(5, 5, 4, true).unwrap();
        let mut s = scenario(Layout::Uniform, cfg);
        let mut rng = rng();
        s.reset_layout(&mut world, &mut rng).unwrap();
        s.reset_agents(&mut world, &mut rng).unwrap();
        let mut cells: Vec<Position> = world.agents.iter().map(|a| a.position).collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 4);
        for a in &world.agents {
            assert_eq!(world.grid.tile(a.position), Tile::Empty);
            assert_eq!(a.coin(), 5.0);
        }
    }

    #[test]
    fn quadrant_has_water_cross_with_centre_gap() {
        let cfg = ResourceWorldConfig {
            wood_density: 1.0,
            stone_density: 1.0,
            ..ResourceWorldConfig::default()
        };
        // Densities above 1 in total are rejected.
        assert!(ResourceWorld::new(Layout::Quadrant, cfg.clone()).is_err());

        let cfg = ResourceWorldConfig {
            wood_density: 0.5,
            stone_density: 0.5,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(9, 9, 2, false).unwrap();
        let mut s = scenario(Layout::Quadrant, cfg);
        s.reset_layout(&mut world, &mut rng()).unwrap();
        assert_eq!(world.grid.tile(Position::new(4, 0)), Tile::Water);
        assert_eq!(world.grid.tile(Position::new(0, 4)), Tile::Water);
        assert_ne!(world.grid.tile(Position::new(4, 4)), Tile::Water);
        assert_ne!(world.grid.tile(Position::new(3, 4)), Tile::Water);
        for p in world.grid.positions() {
            match world.grid.tile(p) {
                Tile::Resource(Resource::Wood) => assert!(p.row < 4),
                Tile::Resource(Resource::Stone) => assert!(p.row > 4),
                _ => {}
            }
        }
    }

    #[test]
    fn sources_regrow_only_when_free() {
        let cfg = ResourceWorldConfig {
            regen_prob: 1.0,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(1, 3, 2, false).unwrap();
        world.grid.seed_resource(Position::new(0, 0), Resource::Wood);
        world.grid.seed_resource(Position::new(0, 1), Resource::Stone);
        world.grid.take_resource(Position::new(0, 0));
        world.grid.take_resource(Position::new(0, 1));
        world.agents[0].position = Position::new(0, 1);
        world.agents[1].position = Position::new(0, 2);

        let mut s = scenario(Layout::Uniform, cfg);
        s.scenario_step(&mut world, &mut rng());
        assert_eq!(
            world.grid.tile(Position::new(0, 0)),
            Tile::Resource(Resource::Wood)
        );
        assert_eq!(world.grid.tile(Position::new(0, 1)), Tile::Empty);
        assert_eq!(world.grid.tile(Position::new(0, 2)), Tile::Empty);
    }

    #[test]
    fn rewards_are_utility_deltas() {
        let cfg = ResourceWorldConfig {
            isoelastic_eta: 0.0,
            labor_coefficient: 1.0,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(2, 2, 2, true).unwrap();
        let mut s = scenario(Layout::Uniform, cfg);
        s.additional_reset_steps(&world);

        world.agents[0].add_coin(4.0).unwrap();
        world.agents[1].add_labor(2.0).unwrap();
        let r = s.compute_rewards(&world);
        assert_eq!(r[&AgentKey::agent(0)], 4.0);
        assert_eq!(r[&AgentKey::agent(1)], -2.0);
        // Welfare went from 0 to 4 coin split unequally.
        let welfare = coin_eq_times_productivity(&[4.0, 0.0], 1.0);
        assert!((r[&AgentKey::Planner] - welfare).abs() < 1e-12);

        let r = s.compute_rewards(&world);
        assert_eq!(r[&AgentKey::agent(0)], 0.0);
        assert_eq!(r[&AgentKey::Planner], 0.0);
    }

    #[test]
    fn liquidity_stability_rewards_the_planner_on_market_history() {
        let cfg = ResourceWorldConfig {
            planner_reward: PlannerReward::LiquidityStability,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(2, 2, 2, true).unwrap();
        let mut s = scenario(Layout::Uniform, cfg);
        s.additional_reset_steps(&world);

        for (price, volume) in [(None, 0), (Some(6.0), 2)] {
            world.market.record(Resource::Wood, price, volume);
            world.market.record(Resource::Stone, None, 0);
        }
        // Wood: liquidity 0.5, volatility 3 / 5; stone scores 0.
        let r = s.compute_rewards(&world);
        assert!((r[&AgentKey::Planner] + 0.025).abs() < 1e-12);
        let m = s.metrics(&world);
        assert!((m["market/liquidity"] - 0.25).abs() < 1e-12);
        assert!((m["market/volatility"] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn balance_share_rewards_agents_against_the_richest() {
        let cfg = ResourceWorldConfig {
            agent_reward: AgentReward::BalanceShare,
            ..ResourceWorldConfig::default()
        };
        let mut world = World::new(2, 2, 2, false).unwrap();
        let mut s = scenario(Layout::Uniform, cfg);
        s.additional_reset_steps(&world);
        world.agents[0].add_coin(8.0).unwrap();
        world.agents[1].add_coin(2.0).unwrap();
        let r = s.compute_rewards(&world);
        assert_eq!(r[&AgentKey::agent(0)], 0.5);
        assert_eq!(r[&AgentKey::agent(1)], 0.125);
    }

    #[test]
    fn market_reward_settings_parse() {
        let value = serde_json::json!({
            "planner_reward": "liquidity_stability",
            "agent_reward": "balance_share",
            "liq_importance": 0.7,
        });
        let cfg = ResourceWorldConfig::deserialize(&value).unwrap();
        assert_eq!(cfg.planner_reward, PlannerReward::LiquidityStability);
        assert_eq!(cfg.agent_reward, AgentReward::BalanceShare);
        let bad = factory(Layout::Uniform, &serde_json::json!({ "liq_importance": 1.5 })).err();
        assert!(matches!(bad, Some(ConfigError::ScenarioConfig { .. })));
    }

    #[test]
    fn planner_sees_coin_held_in_escrow() {
        let mut world = World::new(2, 2, 2, true).unwrap();
        world.agents[0].add_coin(5.0).unwrap();
        world.agents[0].escrow_coin_amount(3.0).unwrap();
        let s = scenario(Layout::Uniform, ResourceWorldConfig::default());
        let obs = s.generate_observations(&world);
        assert_eq!(obs[&AgentKey::Planner]["coins"], ObsValue::Vector(vec![5.0, 0.0]));
        assert_eq!(obs[&AgentKey::agent(0)]["coin"], ObsValue::Scalar(2.0));
    }

    #[test]
    fn observations_cover_agents_and_planner() {
        let mut world = World::new(3, 4, 2, true).unwrap();
        world.agents[1].position = Position::new(2, 3);
        world.grid.set_tile(Position::new(0, 0), Tile::Water);
        let s = scenario(Layout::Uniform, ResourceWorldConfig::default());
        let obs = s.generate_observations(&world);
        assert_eq!(obs.len(), 3);
        let a1 = &obs[&AgentKey::agent(1)];
        assert_eq!(a1["loc-row"], ObsValue::Scalar(2.0));
        assert!(a1.contains_key("inventory-Stone"));
        let ObsValue::Tensor { shape, data } = &a1["map"] else {
            panic!("map should be a tensor");
        };
        assert_eq!(shape.as_slice(), &[5, 3, 4]);
        // Water channel, first cell.
        assert_eq!(data[2 * 12], 1.0);
        // Agent channel, cell (2, 3).
        assert_eq!(data[4 * 12 + 11], 1.0);
        let p = &obs[&AgentKey::Planner];
        assert_eq!(p["coins"].len(), 2);
        assert_eq!(p["inventories"].len(), 2 * Resource::COUNT);
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let err = factory(Layout::Uniform, &serde_json::json!({ "regen_prob": 2.0 })).err();
        assert!(matches!(err, Some(ConfigError::ScenarioConfig { .. })));
        let err = factory(Layout::Uniform, &serde_json::json!({ "regen": 0.5 })).err();
        assert!(matches!(err, Some(ConfigError::ScenarioConfig { .. })));
    }

    #[test]
    fn metrics_report_social_values() {
        let mut world = World::new(2, 2, 2, false).unwrap();
        world.agents[0].add_coin(3.0).unwrap();
        world.agents[1].add_coin(3.0).unwrap();
        let s = scenario(Layout::Uniform, ResourceWorldConfig::default());
        let m = s.metrics(&world);
        assert_eq!(m["social/productivity"], 6.0);
        assert_eq!(m["social/gini"], 0.0);
        assert_eq!(m["social/equality"], 1.0);
    }
}
