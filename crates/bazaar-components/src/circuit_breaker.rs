//! Planner control over trading.
//!
//! Subspace `"CircuitBreaker"` (planner only), two actions: 1 halts
//! trading, 2 resumes it. Components later in the order see the new
//! state in the same step.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use bazaar_component::{
    parse_config, ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext,
};
use bazaar_core::{AgentKey, ComponentError, ComponentEvent, ConfigError};
use bazaar_obs::{AgentObs, ObsValue};
use bazaar_world::World;

const HALT: usize = 1;
const RESUME: usize = 2;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CircuitBreakerConfig {}

/// Lets the planner suspend and resume the market.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    halted_steps: u64,
    toggles: u64,
}

impl CircuitBreaker {
    /// Registry name.
    pub const NAME: &'static str = "CircuitBreaker";

    /// Create a breaker with the market open.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Registry factory.
pub fn factory(config: &serde_json::Value) -> Result<Box<dyn Component>, ConfigError> {
    let CircuitBreakerConfig {} = parse_config(CircuitBreaker::NAME, config)?;
    Ok(Box::new(CircuitBreaker::new()))
}

fn flag(b: bool) -> ObsValue {
    ObsValue::Scalar(if b { 1.0 } else { 0.0 })
}

impl Component for CircuitBreaker {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn action_subspaces(&self, class: AgentClass) -> Vec<ActionSubspace> {
        match class {
            AgentClass::Planner => vec![ActionSubspace::new(Self::NAME, 2)],
            AgentClass::Mobile => Vec::new(),
        }
    }

    fn generate_masks(&self, world: &World, _completions: u64) -> IndexMap<AgentKey, Vec<f32>> {
        let mut masks = IndexMap::new();
        if world.planner.is_some() {
            let halted = world.market_halted;
            let mask = vec![
                if halted { 0.0 } else { 1.0 },
                if halted { 1.0 } else { 0.0 },
            ];
            masks.insert(AgentKey::Planner, mask);
        }
        masks
    }

    fn component_step(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        actions: &ActionSlice,
    ) -> Result<(), ComponentError> {
        let target = match actions.get(AgentKey::Planner, 0) {
            Some(HALT) => Some(true),
            Some(RESUME) => Some(false),
            Some(other) => {
                return Err(ComponentError::InvariantViolation {
                    reason: format!("circuit breaker action {other} outside 1..=2"),
                })
            }
            None => None,
        };
        if let Some(halted) = target.filter(|&h| h != ctx.world.market_halted) {
            ctx.world.market_halted = halted;
            self.toggles += 1;
            info!(halted, timestep = %ctx.timestep(), "market halt toggled");
            ctx.emit(ComponentEvent::MarketHalted { halted });
        }
        if ctx.world.market_halted {
            self.halted_steps += 1;
        }
        Ok(())
    }

    fn generate_observations(&self, world: &World) -> IndexMap<AgentKey, AgentObs> {
        let mut out: IndexMap<AgentKey, AgentObs> = world
            .agents
            .iter()
            .map(|a| {
                let mut obs = AgentObs::new();
                obs.insert("halted".into(), flag(world.market_halted));
                (AgentKey::Agent(a.id()), obs)
            })
            .collect();
        if world.planner.is_some() {
            let mut obs = AgentObs::new();
            obs.insert("halted".into(), flag(world.market_halted));
            out.insert(AgentKey::Planner, obs);
        }
        out
    }

    fn reset(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), ComponentError> {
        self.halted_steps = 0;
        self.toggles = 0;
        ctx.world.market_halted = false;
        Ok(())
    }

    fn metrics(&self, _world: &World) -> IndexMap<String, f64> {
        let mut m = IndexMap::new();
        m.insert("halted_steps".to_string(), self.halted_steps as f64);
        m.insert("toggles".to_string(), self.toggles as f64);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rng, slice, world_with};

    #[test]
    fn halt_then_resume() {
        let mut world = world_with(2, 2, &[(0, 0), (1, 1)], true);
        let mut cb = CircuitBreaker::new();
        assert_eq!(cb.generate_masks(&world, 0)[&AgentKey::Planner], vec![1.0, 0.0]);

        let mut rng = rng();
        let mut events = Vec::new();
        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        cb.component_step(&mut ctx, &slice(&[(AgentKey::Planner, &[HALT])]))
            .unwrap();
        assert!(world.market_halted);
        assert_eq!(cb.generate_masks(&world, 0)[&AgentKey::Planner], vec![0.0, 1.0]);

        let mut ctx = ComponentContext::new(&mut world, &mut rng, &mut events);
        cb.component_step(&mut ctx, &slice(&[(AgentKey::Planner, &[RESUME])]))
            .unwrap();
        assert!(!world.market_halted);
        assert_eq!(events.len(), 2);
        assert_eq!(cb.metrics(&world)["halted_steps"], 1.0);
    }

    #[test]
    fn no_planner_no_masks() {
        let world = world_with(2, 2, &[(0, 0), (1, 1)], false);
        let cb = CircuitBreaker::new();
        assert!(cb.generate_masks(&world, 0).is_empty());
        assert_eq!(cb.n_actions(AgentClass::Mobile), 0);
        assert_eq!(cb.n_actions(AgentClass::Planner), 2);
    }

    #[test]
    fn rejects_unknown_parameters() {
        assert!(factory(&serde_json::json!({ "bogus": 1 })).is_err());
        assert!(factory(&serde_json::Value::Null).is_ok());
    }
}
