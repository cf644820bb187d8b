//! Scenario orchestration for Bazaar environments.
//!
//! Provides [`ScenarioEnv`], the lockstep environment that composes a
//! [`Scenario`] with an ordered list of components, together with the
//! configuration layer, the action layout and the reward and social
//! metric functions scenarios build on.
//!
//! # Architecture
//!
//! - [`config`] parses and validates [`EnvConfig`]
//! - [`layout`] fixes how agent actions map onto component subspaces
//! - [`scenario`] holds the [`Scenario`] trait and the builtin scenarios
//! - [`env`] runs reset and step
//! - [`rewards`] and [`social_metrics`] are pure functions over coin,
//!   labor and endowments

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod env;
pub mod layout;
pub mod rewards;
pub mod scenario;
pub mod social_metrics;

pub use config::EnvConfig;
pub use env::{ActionMap, Done, EpisodeMetrics, ScenarioEnv, StepResult, ALL_DONE_KEY};
pub use layout::{ActionLayout, ClassLayout, SubspaceSlot};
pub use scenario::{
    builtin_scenarios, AgentReward, Layout, PlannerReward, ResourceWorld, ResourceWorldConfig,
    Scenario, ScenarioFactory, ScenarioRegistry,
};
