//! Test utilities and mock components for Bazaar development.
//!
//! Provides mock [`Component`] implementations in [`fixtures`], a
//! [`test_registry`] that knows the builtins plus the mocks, and
//! component lists for the standard test economies.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::OnceLock;

use serde_json::{json, Value};

use bazaar_component::{Component, ComponentRegistry};
use bazaar_components::builtin_registry;
use bazaar_core::{AgentId, Position, Resource};
use bazaar_world::World;

pub use fixtures::{BadMaskComponent, CountingComponent, FailingComponent};

/// The builtin components plus `"Counting"`, `"Failing"` and `"BadMask"`.
pub fn test_registry() -> &'static ComponentRegistry {
    static REGISTRY: OnceLock<ComponentRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut reg = builtin_registry().clone();
        reg.register(CountingComponent::NAME, fixtures::counting_factory)
            .register(FailingComponent::NAME, fixtures::failing_factory)
            .register(BadMaskComponent::NAME, fixtures::bad_mask_factory);
        reg
    })
}

/// `(name, params)` pair with default parameters.
pub fn component(name: &str) -> (String, Value) {
    (name.to_string(), Value::Null)
}

/// Gather only.
pub fn gather_only() -> Vec<(String, Value)> {
    vec![component("Gather")]
}

/// Gather, Build and the auction with short-lived orders.
pub fn trading_economy() -> Vec<(String, Value)> {
    vec![
        component("Gather"),
        component("Build"),
        (
            "ContinuousDoubleAuction".to_string(),
            json!({ "max_bid_ask": 10, "max_num_orders": 5, "order_duration": 20 }),
        ),
    ]
}

/// [`trading_economy`] plus the planner's circuit breaker.
pub fn full_economy() -> Vec<(String, Value)> {
    let mut components = trading_economy();
    components.push(component("CircuitBreaker"));
    components
}

/// A world with agents placed along the first row and an optional
/// starting endowment of every resource.
pub fn lined_up_world(height: usize, width: usize, n_agents: usize, stock: u64) -> World {
    let mut world = match World::new(height, width, n_agents, true) {
        Ok(w) => w,
        Err(e) => panic!("lined_up_world({height}, {width}, {n_agents}): {e}"),
    };
    for (i, agent) in world.agents.iter_mut().enumerate() {
        agent.position = Position::new(i / width, i % width);
        for r in Resource::ALL {
            agent.inventory.add(r, stock);
        }
    }
    world
}

/// Instantiate one component from [`test_registry`].
pub fn make_component(name: &str, params: &Value) -> Box<dyn Component> {
    match test_registry().create(name, params) {
        Ok(c) => c,
        Err(e) => panic!("make_component({name}): {e}"),
    }
}

/// Id of the `i`-th agent.
pub fn agent(i: u32) -> AgentId {
    AgentId(i)
}
