//! Reusable component test fixtures.
//!
//! - [`CountingComponent`] counts how many legal selections it receives.
//! - [`FailingComponent`] fails deterministically after N steps.
//! - [`BadMaskComponent`] reports masks of the wrong length.

use indexmap::IndexMap;
use serde::Deserialize;

use bazaar_component::{
    parse_config, ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext,
};
use bazaar_core::{AgentKey, ComponentError, ConfigError};
use bazaar_obs::{AgentObs, ObsValue};
use bazaar_world::World;

fn all_agents(world: &World, width: usize, value: f32) -> IndexMap<AgentKey, Vec<f32>> {
    world
        .agents
        .iter()
        .map(|a| (AgentKey::Agent(a.id()), vec![value; width]))
        .collect()
}

/// Parameters for [`CountingComponent`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountingConfig {
    /// When set, the single action is masked for every agent.
    pub masked: bool,
}

/// One-action subspace `"Count"` that tallies legal selections.
///
/// The tally is exposed through [`metrics`](Component::metrics) as
/// `"selections"` and through the `"selections"` observation, so tests
/// can read it back through the environment.
pub struct CountingComponent {
    pub masked: bool,
    selections: u64,
}

impl CountingComponent {
    pub const NAME: &'static str = "Counting";

    pub fn new(masked: bool) -> Self {
        Self {
            masked,
            selections: 0,
        }
    }

    pub fn selections(&self) -> u64 {
        self.selections
    }
}

impl Component for CountingComponent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
        match class {
            AgentClass::Mobile => vec![ActionSubspace::new("Count", 1)],
            AgentClass::Planner => Vec::new(),
        }
    }

    fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        all_agents(world, 1, if self.masked { 0.0 } else { 1.0 })
    }

    fn component_step(
        &mut self,
        _ctx: &mut ComponentContext<'_>,
        actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        for key in actions.agents() {
            if actions.get(key, 0) == Some(1) {
                self.selections += 1;
            }
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
                    "selections".to_string(),
                    ObsValue::Scalar(self.selections as f32),
                );
                (AgentKey::Agent(a.id()), obs)
            })
            .collect()
    }

    fn reset(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.selections = 0;
        Ok(())
    }

    fn metrics(&self, _world: &World) -> IndexMap<String, f64> {
        let mut m = IndexMap::new();
        m.insert("selections".to_string(), self.selections as f64);
        m
    }
}

/// Parameters for [`FailingComponent`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailingConfig {
    /// Successful steps before the first failure.
    pub succeed_count: u64,
}

/// Fails deterministically after a configurable number of successful
/// steps.
///
/// Useful for testing that a broken invariant faults the environment
/// until the next reset. The counter is cleared on reset.
pub struct FailingComponent {
    pub succeed_count: u64,
    calls: u64,
}

impl FailingComponent {
    pub const NAME: &'static str = "Failing";

    /// Create a component that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: u64) -> Self {
        Self {
            succeed_count,
            calls: 0,
        }
    }

    /// How many times `component_step()` has been called.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Component for FailingComponent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, _class: AgentClass) -> Vec<ActionSubspace> {
        Vec::new()
    }

    fn generate_masks(&self, _world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        IndexMap::new()
    }

    fn component_step(
        &mut self,
        _ctx: &mut ComponentContext<'_>,
        _actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        let n = self.calls;
        self.calls += 1;
        if n >= self.succeed_count {
            return Err(ComponentError::InvariantViolation {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }

    fn generate_observations(&self, _world: &World) -> IndexMap<AgentKey, AgentObs> {
        IndexMap::new()
    }

    fn reset(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.calls = 0;
        Ok(())
    }
}

/// Declares a two-action subspace but reports one-element masks.
pub struct BadMaskComponent;

impl BadMaskComponent {
    pub const NAME: &'static str = "BadMask";
}

impl Component for BadMaskComponent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
        match class {
            AgentClass::Mobile => vec![ActionSubspace::new("BadMask", 2)],
            AgentClass::Planner => Vec::new(),
        }
    }

    fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        all_agents(world, 1, 1.0)
    }

    fn component_step(
        &mut self,
        _ctx: &mut ComponentContext<'_>,
        _actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        Ok(())
    }

    fn generate_observations(&self, _world: &World) -> IndexMap<AgentKey, AgentObs> {
        IndexMap::new()
    }
}

pub(crate) fn counting_factory(v: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    let cfg: CountingConfig = parse_config(CountingComponent::NAME, v)?;
    Ok(Box::new(CountingComponent::new(cfg.masked)))
}

pub(crate) fn failing_factory(v: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    let cfg: FailingConfig = parse_config(FailingComponent::NAME, v)?;
    Ok(Box::new(FailingComponent::new(cfg.succeed_count)))
}

pub(crate) fn bad_mask_factory(_: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    Ok(Box::new(BadMaskComponent))
}
