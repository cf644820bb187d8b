//! Benchmark profiles and utilities for the Bazaar economic simulation.
//!
//! Provides pre-built [`EnvConfig`] profiles for benchmarking and examples:
//!
//! - [`reference_profile`]: 25x25 grid, 4 agents, the full economy
//! - [`stress_profile`]: 60x60 grid, 20 agents, the full economy
//! - [`RandomPolicy`]: seeded uniform actions for every agent
//! - [`rollout`]: drive an environment for a fixed number of steps

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use bazaar_core::{Action, ActionMode, StepError};
use bazaar_engine::{ActionMap, EnvConfig, ScenarioEnv};

fn full_economy() -> Vec<(String, serde_json::Value)> {
    vec![
        ("Gather".to_string(), serde_json::Value::Null),
        ("Build".to_string(), json!({ "skill_dist": "pareto", "payment_max_skill_multiplier": 3.0 })),
        (
            "ContinuousDoubleAuction".to_string(),
            json!({ "max_bid_ask": 10, "max_num_orders": 5, "order_duration": 50 }),
        ),
        ("CircuitBreaker".to_string(), serde_json::Value::Null),
    ]
}

/// Build a reference benchmark profile: 25x25 grid, 4 agents.
///
/// Quadrant layout with Gather, Build, the auction and the circuit
/// breaker; 1000-step episodes.
pub fn reference_profile(seed: u64) -> EnvConfig {
    EnvConfig {
        scenario_name: "quadrant".to_string(),
        components: full_economy(),
        n_agents: 4,
        world_size: [25, 25],
        episode_length: 1000,
        seed,
        ..EnvConfig::default()
    }
}

/// Build a stress benchmark profile: 60x60 grid, 20 agents.
///
/// Same components as [`reference_profile`] on a uniform layout.
pub fn stress_profile(seed: u64) -> EnvConfig {
    EnvConfig {
        scenario_name: "uniform".to_string(),
        components: full_economy(),
        n_agents: 20,
        world_size: [60, 60],
        episode_length: 1000,
        seed,
        scenario: json!({ "starting_coin": 50.0, "regen_prob": 0.02 }),
        ..EnvConfig::default()
    }
}

/// Uniformly random actions, one per agent and the planner.
///
/// Ignores masks on purpose so the environment's gating is exercised.
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    /// A policy seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw one action for every agent in `env`.
    pub fn actions(&mut self, env: &ScenarioEnv) -> ActionMap {
        let mut actions = ActionMap::new();
        for key in env.world().agent_keys() {
            let Some(layout) = env.action_layout().for_key(key) else {
                continue;
            };
            let action = match layout.mode() {
                ActionMode::Single => Action::Single(self.rng.gen_range(0..layout.single_size())),
                ActionMode::Multi => Action::Multi(
                    layout
                        .multi_sizes()
                        .into_iter()
                        .map(|n| self.rng.gen_range(0..n))
                        .collect(),
                ),
            };
            actions.insert(key, action);
        }
        actions
    }
}

/// Totals from a [`rollout`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RolloutStats {
    /// Steps taken.
    pub steps: u64,
    /// Episodes that reached their length.
    pub episodes: u64,
    /// Sum of every agent's and the planner's reward.
    pub total_reward: f64,
}

/// Step `env` `steps` times under `policy`, resetting whenever an
/// episode completes. The environment must already be reset.
pub fn rollout(
    env: &mut ScenarioEnv,
    policy: &mut RandomPolicy,
    steps: u64,
) -> Result<RolloutStats, StepError> {
    let mut stats = RolloutStats::default();
    for _ in 0..steps {
        let actions = policy.actions(env);
        let result = env.step(&actions)?;
        stats.steps += 1;
        stats.total_reward += result.reward.values().sum::<f64>();
        if result.done.all {
            stats.episodes += 1;
            env.reset(false)?;
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_validate() {
        assert!(reference_profile(1).validate().is_ok());
        assert!(stress_profile(1).validate().is_ok());
    }

    #[test]
    fn rollout_crosses_episode_boundaries() {
        let mut cfg = reference_profile(3);
        cfg.episode_length = 10;
        let mut env = ScenarioEnv::new(cfg).unwrap();
        env.reset(false).unwrap();
        let mut policy = RandomPolicy::new(4);
        let stats = rollout(&mut env, &mut policy, 25).unwrap();
        assert_eq!(stats.steps, 25);
        assert_eq!(stats.episodes, 2);
        assert_eq!(env.timestep().0, 5);
        assert!(stats.total_reward.is_finite());
    }
}
