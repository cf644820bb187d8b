//! Scenarios: world layout, per-step environment rules and rewards.
//!
//! A [`Scenario`] owns everything about an environment that is not a
//! component: where resources and agents start, what happens to the
//! world after components act each step, scenario-level observations,
//! and how rewards are computed. [`ScenarioRegistry`] maps names to
//! factories the way the component registry does.

mod resource_world;

use std::sync::OnceLock;

use indexmap::IndexMap;
use rand_chacha::ChaCha8Rng;

use bazaar_core::{AgentKey, ConfigError, StepError};
use bazaar_obs::AgentObs;
use bazaar_world::World;

pub use resource_world::{
    AgentReward, Layout, PlannerReward, ResourceWorld, ResourceWorldConfig,
};

/// Scenario-specific behaviour of an environment.
///
/// Called by the orchestrator in this order:
///
/// 1. reset: [`reset_layout`](Self::reset_layout),
///    [`reset_agents`](Self::reset_agents), then every component's reset,
///    then [`additional_reset_steps`](Self::additional_reset_steps)
/// 2. step: every component, then [`scenario_step`](Self::scenario_step),
///    then observations and [`compute_rewards`](Self::compute_rewards)
pub trait Scenario: Send + 'static {
    /// Registry name.
    fn name(&self) -> &str;

    /// Whether the environment gets a planner.
    fn has_planner(&self) -> bool;

    /// Populate the (cleared) grid for a new episode.
    fn reset_layout(&mut self, world: &mut World, rng: &mut ChaCha8Rng) -> Result<(), StepError>;

    /// Place agents and set their starting endowments.
    fn reset_agents(&mut self, world: &mut World, rng: &mut ChaCha8Rng) -> Result<(), StepError>;

    /// Environment rule applied after all components each step.
    fn scenario_step(&mut self, world: &mut World, rng: &mut ChaCha8Rng);

    /// Final reset hook, run after components have reset.
    fn additional_reset_steps(&mut self, world: &World);

    /// Scenario observations, keyed without the `"world-"` prefix.
    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs>;

    /// This step's reward for every agent and the planner.
    fn compute_rewards(&mut self, world: &World) -> IndexMap<AgentKey, f64>;

    /// Episode-level summary values. Default: none.
    fn metrics(&self, world: &World) -> IndexMap<String, f64> {
        let _ = world;
        IndexMap::new()
    }
}

/// Builds a scenario from its JSON parameters.
pub type ScenarioFactory = fn(&serde_json::Value) -> Result<Box<dyn Scenario>, ConfigError>;

/// Maps scenario names to factories.
#[derive(Clone, Default)]
pub struct ScenarioRegistry {
    factories: IndexMap<String, ScenarioFactory>,
}

impl ScenarioRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: ScenarioFactory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate `name` with `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownScenario`] if nothing is registered under
    /// `name`, or whatever the factory reports.
    pub fn create(
        &self,
        name: &str,
        config: &serde_json::Value,
    ) -> Result<Box<dyn Scenario>, ConfigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownScenario {
                name: name.to_string(),
            })?;
        factory(config)
    }
}

impl std::fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// The read-only table of builtin scenarios: `"uniform"` and
/// `"quadrant"`.
pub fn builtin_scenarios() -> &'static ScenarioRegistry {
    static BUILTINS: OnceLock<ScenarioRegistry> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let mut reg = ScenarioRegistry::new();
        reg.register(Layout::Uniform.name(), resource_world::uniform_factory)
            .register(Layout::Quadrant.name(), resource_world::quadrant_factory);
        reg
    })
}
