//! Bazaar: a deterministic multi-agent economic simulation for
//! reinforcement learning.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Bazaar sub-crates. For most users, adding `bazaar` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use bazaar::prelude::*;
//!
//! let config = EnvConfig::from_json(
//!     r#"{
//!         "scenario_name": "quadrant",
//!         "components": [["Gather", null], ["Build", null], ["ContinuousDoubleAuction", null]],
//!         "n_agents": 4,
//!         "world_size": [10, 10],
//!         "episode_length": 20
//!     }"#,
//! )
//! .unwrap();
//! let mut env = ScenarioEnv::new(config).unwrap();
//! let obs = env.reset(true).unwrap();
//! assert!(obs.contains_key(&AgentKey::Planner));
//!
//! let mut actions = ActionMap::new();
//! actions.insert(AgentKey::agent(0), Action::Single(5)); // collect
//! while !env.is_done() {
//!     env.step(&actions).unwrap();
//! }
//! let log = env.previous_episode_dense_log().unwrap();
//! assert_eq!(log.steps(), 20);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `bazaar-core` | IDs, resources, actions, events, errors |
//! | [`world`] | `bazaar-world` | Grid, agents, inventories, snapshots |
//! | [`obs`] | `bazaar-obs` | Observation values, flattening, masks |
//! | [`component`] | `bazaar-component` | Component trait, context, registry |
//! | [`components`] | `bazaar-components` | Gather, Build, the auction, the circuit breaker |
//! | [`engine`] | `bazaar-engine` | Scenarios, rewards, the environment |
//! | [`replay`] | `bazaar-replay` | Dense logs, hashing, divergence search |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs and errors (`bazaar-core`).
pub use bazaar_core as types;

/// World state (`bazaar-world`).
///
/// [`world::World`] owns the [`world::Grid`] and every [`world::Agent`].
pub use bazaar_world as world;

/// Observation values and mask assembly (`bazaar-obs`).
pub use bazaar_obs as obs;

/// The component extension point (`bazaar-component`).
///
/// Implement [`component::Component`] and register a factory in a
/// [`component::ComponentRegistry`] to add new mechanics.
pub use bazaar_component as component;

/// Builtin components (`bazaar-components`).
pub use bazaar_components as components;

/// Scenarios and the environment (`bazaar-engine`).
pub use bazaar_engine as engine;

/// Dense episode logs (`bazaar-replay`).
pub use bazaar_replay as replay;

/// Common imports for typical Bazaar usage.
///
/// ```rust
/// use bazaar::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use bazaar_core::{Action, ActionMode, AgentId, AgentKey, Position, Resource, Timestep};

    // Errors
    pub use bazaar_core::{ComponentError, ConfigError, StepError};

    // Observation
    pub use bazaar_obs::{AgentObs, ObsValue, Observation};

    // Components
    pub use bazaar_component::{
        ActionSlice, ActionSubspace, AgentClass, Component, ComponentContext, ComponentRegistry,
    };
    pub use bazaar_components::builtin_registry;

    // Engine
    pub use bazaar_engine::{
        builtin_scenarios, ActionMap, EnvConfig, Scenario, ScenarioEnv, StepResult,
    };

    // Replay
    pub use bazaar_replay::{first_divergence, DenseLog};
}
